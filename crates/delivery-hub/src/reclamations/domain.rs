use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::InvoiceId;
use crate::catalog::ClientId;
use crate::shipments::ShipmentId;
use crate::store::record_id;
use crate::users::UserId;

record_id!(
    /// Identifier of a customer complaint.
    ReclamationId,
    "reclamation"
);
record_id!(ReclamationCommentId, "reclamation comment");
record_id!(ReclamationDocumentId, "reclamation document");
record_id!(ReclamationTaskId, "reclamation task");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclamationKind {
    DeliveryDelay,
    DamagedParcel,
    LostParcel,
    BillingError,
    CustomerService,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclamationStatus {
    #[default]
    InProgress,
    Resolved,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclamationPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reclamation {
    pub id: ReclamationId,
    pub reference: String,
    pub client_id: ClientId,
    pub kind: ReclamationKind,
    pub description: String,
    pub shipment_ids: Vec<ShipmentId>,
    pub invoice_id: Option<InvoiceId>,
    pub status: ReclamationStatus,
    pub priority: ReclamationPriority,
    pub created_by: UserId,
    pub assigned_to: Option<UserId>,
    pub resolution: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Reclamation {
    /// Whole days between filing and resolution.
    pub fn resolution_time_days(&self) -> Option<i64> {
        self.resolved_at
            .map(|resolved| (resolved - self.created_at).num_days())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclamationComment {
    pub id: ReclamationCommentId,
    pub reclamation_id: ReclamationId,
    pub author: UserId,
    pub content: String,
    /// Hidden from the client when set.
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclamationDocument {
    pub id: ReclamationDocumentId,
    pub reclamation_id: ReclamationId,
    pub name: String,
    pub storage_key: String,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclamationTask {
    pub id: ReclamationTaskId,
    pub reclamation_id: ReclamationId,
    pub title: String,
    pub description: String,
    pub assigned_to: Option<UserId>,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclamationDraft {
    pub client_id: ClientId,
    pub kind: ReclamationKind,
    pub description: String,
    #[serde(default)]
    pub shipment_ids: Vec<ShipmentId>,
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    #[serde(default)]
    pub priority: ReclamationPriority,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclamationStatusChange {
    pub status: ReclamationStatus,
    #[serde(default)]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclamationCommentDraft {
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclamationDocumentDraft {
    pub name: String,
    pub storage_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusChange {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReclamationFilter {
    #[serde(default)]
    pub status: Option<ReclamationStatus>,
    #[serde(default)]
    pub kind: Option<ReclamationKind>,
    #[serde(default)]
    pub priority: Option<ReclamationPriority>,
    /// Matches the reference, the description or the client name.
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReclamationListing {
    pub reclamations: Vec<Reclamation>,
    pub stats: StatusCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReclamationDetail {
    #[serde(flatten)]
    pub reclamation: Reclamation,
    pub client_name: String,
    pub resolution_time_days: Option<i64>,
    pub comments: Vec<ReclamationComment>,
    pub documents: Vec<ReclamationDocument>,
    pub tasks: Vec<ReclamationTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindCount {
    pub kind: ReclamationKind,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    pub priority: ReclamationPriority,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// `YYYY-MM`.
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReclamationStats {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub by_kind: Vec<KindCount>,
    pub by_priority: Vec<PriorityCount>,
    pub by_month: Vec<MonthCount>,
    pub average_resolution_days: Option<f64>,
    pub top_kinds: Vec<KindCount>,
    pub recent: Vec<Reclamation>,
}
