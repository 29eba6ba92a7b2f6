//! Delivery rounds and their effect on the shipments they carry.

pub mod domain;
pub mod journal;
pub mod router;
pub mod service;

pub use domain::{
    AddShipment, CompletionReport, StopView, Tour, TourDetail, TourDraft, TourFilter, TourId,
    TourListing, TourPatch, TourStats, TourStatus, TourStop, TourStopId,
};
pub use journal::{JournalPeriod, TourJournal};
pub use router::tour_routes;
pub use service::TourService;
