//! Reference data: clients, drivers, vehicles, zones, destinations and
//! service types.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    Client, ClientDraft, ClientId, Destination, DestinationDraft, DestinationId, Driver,
    DriverDraft, DriverId, ServiceType, ServiceTypeDraft, ServiceTypeId, Vehicle, VehicleDraft,
    VehicleId, VehicleStatus, Zone, ZoneDraft, ZoneId,
};
pub use router::catalog_routes;
pub use service::{CatalogQuery, CatalogService};
