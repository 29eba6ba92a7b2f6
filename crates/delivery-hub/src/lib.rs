//! Delivery management core: reference data, shipments and their tracking,
//! delivery tours, the guided creation wizard, billing, incidents and
//! customer complaints.

pub mod billing;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod hub;
pub mod incidents;
pub mod money;
pub mod pricing;
pub mod reclamations;
pub mod shipments;
pub mod store;
pub mod telemetry;
pub mod tours;
pub mod users;
pub mod wizard;

pub use hub::{delivery_router, DeliveryHub, DeliveryHubBuilder};
