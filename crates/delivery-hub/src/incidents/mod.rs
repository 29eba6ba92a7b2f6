//! Operational incidents on shipments and tours.

pub mod alerts;
pub mod domain;
pub mod router;
pub mod service;

pub use alerts::{AlertError, AlertPublisher, IncidentAlert, LogAlertPublisher};
pub use domain::{
    CommentDraft, DocumentDraft, Incident, IncidentComment, IncidentCommentId, IncidentDetail,
    IncidentDocument, IncidentDocumentId, IncidentDraft, IncidentFilter, IncidentId,
    IncidentListing, IncidentPriority, IncidentStats, IncidentStatus, IncidentStatusChange,
    IncidentType,
};
pub use router::incident_routes;
pub use service::IncidentService;
