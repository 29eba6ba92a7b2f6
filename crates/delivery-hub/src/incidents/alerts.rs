use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{Incident, IncidentId, IncidentPriority, IncidentType};

/// Outbound channel for urgent incident notifications.
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: IncidentAlert) -> Result<(), AlertError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentAlert {
    pub incident_id: IncidentId,
    pub priority: IncidentPriority,
    pub incident_type: IncidentType,
    pub summary: String,
    pub details: BTreeMap<String, String>,
}

impl IncidentAlert {
    pub fn for_incident(incident: &Incident, tracking_number: Option<&str>) -> Self {
        let mut details = BTreeMap::new();
        details.insert("description".to_string(), incident.description.clone());
        if let Some(tracking) = tracking_number {
            details.insert("tracking_number".to_string(), tracking.to_string());
        }
        if let Some(tour_id) = incident.tour_id {
            details.insert("tour_id".to_string(), tour_id.to_string());
        }
        Self {
            incident_id: incident.id,
            priority: incident.priority,
            incident_type: incident.incident_type,
            summary: format!(
                "{:?} incident #{}: {}",
                incident.priority,
                incident.id,
                incident.incident_type.label()
            ),
            details,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

/// Publisher that only writes the alert to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertPublisher;

impl AlertPublisher for LogAlertPublisher {
    fn publish(&self, alert: IncidentAlert) -> Result<(), AlertError> {
        info!(
            incident_id = alert.incident_id.0,
            priority = ?alert.priority,
            summary = %alert.summary,
            "incident alert"
        );
        Ok(())
    }
}
