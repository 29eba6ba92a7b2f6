//! In-process relational storage.
//!
//! Every entity lives in a [`Table`] keyed by an auto-incremented id. All
//! tables hang off one [`Schema`] guarded by a single lock inside
//! [`Database`], so a service call that touches shipments, tours and history
//! at once sees and leaves a consistent snapshot. Services validate every
//! precondition before their first mutation, so an `Err` never leaves a
//! half-applied write behind.

use std::collections::btree_map::{Values, ValuesMut};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::billing::{Invoice, Payment};
use crate::catalog::{Client, Destination, Driver, ServiceType, Vehicle, Zone};
use crate::error::DeliveryError;
use crate::incidents::{Incident, IncidentComment, IncidentDocument};
use crate::reclamations::{
    Reclamation, ReclamationComment, ReclamationDocument, ReclamationTask,
};
use crate::shipments::{Shipment, StatusHistoryEntry};
use crate::tours::{Tour, TourStop};
use crate::users::User;

/// Declares a `u64` identifier newtype tied to an entity label used in
/// not-found errors.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const ENTITY: &'static str = $entity;
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use record_id;

#[derive(Debug, Clone)]
pub struct Table<T> {
    entity: &'static str,
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Table<T> {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Allocates the next id and stores the row built for it.
    pub fn insert_with<F>(&mut self, build: F) -> &mut T
    where
        F: FnOnce(u64) -> T,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.entry(id).or_insert(build(id))
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn require(&self, id: u64) -> Result<&T, DeliveryError> {
        self.rows.get(&id).ok_or(DeliveryError::NotFound {
            entity: self.entity,
            id,
        })
    }

    pub fn require_mut(&mut self, id: u64) -> Result<&mut T, DeliveryError> {
        let entity = self.entity;
        self.rows
            .get_mut(&id)
            .ok_or(DeliveryError::NotFound { entity, id })
    }

    pub fn contains(&self, id: u64) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn values(&self) -> Values<'_, u64, T> {
        self.rows.values()
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, u64, T> {
        self.rows.values_mut()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.rows.retain(|_, row| keep(row));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every table of the delivery schema.
#[derive(Debug, Clone)]
pub struct Schema {
    pub clients: Table<Client>,
    pub drivers: Table<Driver>,
    pub vehicles: Table<Vehicle>,
    pub zones: Table<Zone>,
    pub destinations: Table<Destination>,
    pub service_types: Table<ServiceType>,
    pub shipments: Table<Shipment>,
    pub status_history: Table<StatusHistoryEntry>,
    pub tours: Table<Tour>,
    pub tour_stops: Table<TourStop>,
    pub invoices: Table<Invoice>,
    pub payments: Table<Payment>,
    pub incidents: Table<Incident>,
    pub incident_comments: Table<IncidentComment>,
    pub incident_documents: Table<IncidentDocument>,
    pub reclamations: Table<Reclamation>,
    pub reclamation_comments: Table<ReclamationComment>,
    pub reclamation_documents: Table<ReclamationDocument>,
    pub reclamation_tasks: Table<ReclamationTask>,
    pub users: Table<User>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            clients: Table::new("client"),
            drivers: Table::new("driver"),
            vehicles: Table::new("vehicle"),
            zones: Table::new("zone"),
            destinations: Table::new("destination"),
            service_types: Table::new("service type"),
            shipments: Table::new("shipment"),
            status_history: Table::new("status history entry"),
            tours: Table::new("tour"),
            tour_stops: Table::new("tour stop"),
            invoices: Table::new("invoice"),
            payments: Table::new("payment"),
            incidents: Table::new("incident"),
            incident_comments: Table::new("incident comment"),
            incident_documents: Table::new("incident document"),
            reclamations: Table::new("reclamation"),
            reclamation_comments: Table::new("reclamation comment"),
            reclamation_documents: Table::new("reclamation document"),
            reclamation_tasks: Table::new("reclamation task"),
            users: Table::new("user"),
        }
    }
}

/// Lock-guarded schema shared by every service.
#[derive(Debug, Default)]
pub struct Database {
    schema: Mutex<Schema>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R, F>(&self, query: F) -> R
    where
        F: FnOnce(&Schema) -> R,
    {
        let guard = self.schema.lock().unwrap_or_else(PoisonError::into_inner);
        query(&guard)
    }

    pub fn write<R, F>(&self, mutation: F) -> R
    where
        F: FnOnce(&mut Schema) -> R,
    {
        let mut guard = self.schema.lock().unwrap_or_else(PoisonError::into_inner);
        mutation(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let mut table: Table<&'static str> = Table::new("word");
        let first = *table.insert_with(|_| "alpha");
        assert_eq!(first, "alpha");
        table.insert_with(|_| "beta");
        table.remove(2);
        let mut assigned = 0;
        table.insert_with(|id| {
            assigned = id;
            "gamma"
        });
        assert_eq!(assigned, 3);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn require_reports_entity_and_id() {
        let table: Table<u8> = Table::new("zone");
        match table.require(9) {
            Err(DeliveryError::NotFound { entity, id }) => {
                assert_eq!(entity, "zone");
                assert_eq!(id, 9);
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }
}
