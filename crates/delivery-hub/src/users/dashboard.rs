use serde::Serialize;

use super::User;
use crate::shipments::{Shipment, ShipmentStatus};
use crate::store::Database;

/// Shipment counters shown on the landing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total: usize,
    pub delivered: usize,
    /// Anything moving that is neither registered, delivered nor failed.
    pub in_progress: usize,
    pub registered: usize,
    pub failed: usize,
}

impl DashboardCounts {
    fn tally<'a>(shipments: impl Iterator<Item = &'a Shipment>) -> Self {
        shipments.fold(Self::default(), |mut counts, shipment| {
            counts.total += 1;
            match shipment.status {
                ShipmentStatus::Delivered => counts.delivered += 1,
                ShipmentStatus::Registered => counts.registered += 1,
                ShipmentStatus::Failed => counts.failed += 1,
                ShipmentStatus::Transit
                | ShipmentStatus::Sorting
                | ShipmentStatus::OutForDelivery => counts.in_progress += 1,
            }
            counts
        })
    }
}

/// Admins see every shipment, agents only those they registered.
pub fn dashboard(db: &Database, actor: &User) -> DashboardCounts {
    db.read(|schema| {
        DashboardCounts::tally(
            schema
                .shipments
                .values()
                .filter(|shipment| actor.is_admin() || shipment.created_by == actor.id),
        )
    })
}
