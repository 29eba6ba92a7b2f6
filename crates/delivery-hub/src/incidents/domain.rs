use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shipments::ShipmentId;
use crate::store::record_id;
use crate::tours::TourId;
use crate::users::UserId;

record_id!(IncidentId, "incident");
record_id!(IncidentCommentId, "incident comment");
record_id!(IncidentDocumentId, "incident document");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Delay,
    Loss,
    Damage,
    Technical,
    Other,
}

impl IncidentType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Delay => "Delivery delay",
            Self::Loss => "Lost parcel",
            Self::Damage => "Damaged parcel",
            Self::Technical => "Technical problem",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl IncidentPriority {
    /// High and critical incidents notify the operations desk.
    pub const fn raises_alert(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub shipment_id: Option<ShipmentId>,
    pub tour_id: Option<TourId>,
    pub reported_by: UserId,
    pub assigned_to: Option<UserId>,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub status: IncidentStatus,
    pub priority: IncidentPriority,
    pub description: String,
    pub resolution: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub alert_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentComment {
    pub id: IncidentCommentId,
    pub incident_id: IncidentId,
    pub author: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata of a file attached to an incident; the bytes live in external
/// storage under `storage_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentDocument {
    pub id: IncidentDocumentId,
    pub incident_id: IncidentId,
    pub file_name: String,
    pub storage_key: String,
    pub description: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentDraft {
    #[serde(default)]
    pub shipment_id: Option<ShipmentId>,
    #[serde(default)]
    pub tour_id: Option<TourId>,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    #[serde(default)]
    pub priority: IncidentPriority,
    pub description: String,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentStatusChange {
    pub status: IncidentStatus,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDraft {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub file_name: String,
    pub storage_key: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentFilter {
    #[serde(default)]
    pub status: Option<IncidentStatus>,
    #[serde(default, rename = "type")]
    pub incident_type: Option<IncidentType>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IncidentStats {
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentListing {
    pub incidents: Vec<Incident>,
    /// Counted over every incident, not just the filtered ones.
    pub stats: IncidentStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentDetail {
    #[serde(flatten)]
    pub incident: Incident,
    pub comments: Vec<IncidentComment>,
    pub documents: Vec<IncidentDocument>,
}
