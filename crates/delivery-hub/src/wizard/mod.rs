//! Guided, multi-step shipment creation.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    AssignmentStep, ClientChoice, ClientStep, ParcelDetails, ParcelStep, ServiceChoice,
    ServiceStep, WizardError, WizardSession, WizardStep, WizardView,
};
pub use router::wizard_routes;
pub use service::{WizardService, WizardStore};
