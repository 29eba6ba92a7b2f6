//! Parcels, their status workflow and history.

pub mod domain;
pub mod router;
pub mod service;
pub(crate) mod workflow;

pub use domain::{
    Shipment, ShipmentDraft, ShipmentFilter, ShipmentId, ShipmentPatch, ShipmentStatus,
    StatusChange, StatusHistoryEntry, StatusHistoryId, TrackingView,
};
pub use router::shipment_routes;
pub use service::ShipmentService;
