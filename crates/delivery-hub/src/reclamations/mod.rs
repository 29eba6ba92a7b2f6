//! Customer complaints with their follow-up comments, documents and tasks.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    KindCount, MonthCount, PriorityCount, Reclamation, ReclamationComment,
    ReclamationCommentDraft, ReclamationCommentId, ReclamationDetail, ReclamationDocument,
    ReclamationDocumentDraft, ReclamationDocumentId, ReclamationDraft, ReclamationFilter,
    ReclamationId, ReclamationKind, ReclamationListing, ReclamationPriority, ReclamationStats,
    ReclamationStatus, ReclamationStatusChange, ReclamationTask, ReclamationTaskId,
    StatusCounts, TaskDraft, TaskStatus, TaskStatusChange,
};
pub use router::reclamation_routes;
pub use service::ReclamationService;
