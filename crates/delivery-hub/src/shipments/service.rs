use tracing::info;
use uuid::Uuid;

use super::domain::{
    Shipment, ShipmentDraft, ShipmentFilter, ShipmentId, ShipmentPatch, ShipmentStatus,
    StatusHistoryEntry, TrackingView,
};
use super::workflow;
use crate::catalog::domain::require_text;
use crate::catalog::ClientId;
use crate::clock::Clock;
use crate::error::DeliveryError;
use crate::export::CsvExport;
use crate::pricing;
use crate::store::{Database, Schema};
use crate::tours::{self, TourStatus};
use crate::users::UserId;

pub struct ShipmentService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
}

impl<'a> ShipmentService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    pub fn create(
        &self,
        draft: ShipmentDraft,
        created_by: UserId,
    ) -> Result<Shipment, DeliveryError> {
        let now = self.clock.now();
        self.db
            .write(|schema| register(schema, draft, created_by, now))
    }

    /// Edits the shipment and reprices it from the current rates.
    pub fn update(&self, id: ShipmentId, patch: ShipmentPatch) -> Result<Shipment, DeliveryError> {
        self.db.write(|schema| {
            let current = schema.shipments.require(id.0)?.clone();
            if current.status == ShipmentStatus::Delivered {
                return Err(DeliveryError::conflict(format!(
                    "shipment {} is delivered and can no longer be edited",
                    current.tracking_number
                )));
            }

            let client_id = patch.client_id.unwrap_or(current.client_id);
            let service_type_id = patch.service_type_id.unwrap_or(current.service_type_id);
            let destination_id = patch.destination_id.unwrap_or(current.destination_id);
            let weight_kg = patch.weight_kg.unwrap_or(current.weight_kg);
            let volume_m3 = patch.volume_m3.unwrap_or(current.volume_m3);
            let description = patch.description.unwrap_or(current.description);
            require_text("description", &description)?;
            schema.clients.require(client_id.0)?;
            if client_id != current.client_id {
                if is_invoiced(schema, id) {
                    return Err(DeliveryError::conflict(format!(
                        "shipment {} is invoiced and cannot change client",
                        current.tracking_number
                    )));
                }
                if let Some(reclamation) = schema
                    .reclamations
                    .values()
                    .find(|reclamation| reclamation.shipment_ids.contains(&id))
                {
                    return Err(DeliveryError::conflict(format!(
                        "shipment {} is named in reclamation {} and cannot change client",
                        current.tracking_number, reclamation.reference
                    )));
                }
            }
            let quote =
                pricing::quote_for(schema, service_type_id, destination_id, weight_kg, volume_m3)?;

            let shipment = schema.shipments.require_mut(id.0)?;
            shipment.client_id = client_id;
            shipment.service_type_id = service_type_id;
            shipment.destination_id = destination_id;
            shipment.weight_kg = weight_kg;
            shipment.volume_m3 = volume_m3;
            shipment.description = description.trim().to_string();
            if patch.estimated_delivery_date.is_some() {
                shipment.estimated_delivery_date = patch.estimated_delivery_date;
            }
            shipment.total_price = quote.total;
            Ok(shipment.clone())
        })
    }

    pub fn set_status(
        &self,
        id: ShipmentId,
        status: ShipmentStatus,
        note: Option<String>,
    ) -> Result<Shipment, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            workflow::apply(schema, id, status, note, now)?;
            schema.shipments.require(id.0).cloned()
        })
    }

    pub fn delete(&self, id: ShipmentId) -> Result<(), DeliveryError> {
        self.db.write(|schema| {
            let shipment = schema.shipments.require(id.0)?;
            if is_invoiced(schema, id) {
                return Err(DeliveryError::conflict(format!(
                    "shipment {} is invoiced",
                    shipment.tracking_number
                )));
            }
            if let Some(tour_id) = shipment.tour_id {
                let tour = schema.tours.require(tour_id.0)?;
                if tour.status == TourStatus::InProgress {
                    return Err(DeliveryError::conflict(format!(
                        "shipment {} is on tour {tour_id} which is in progress",
                        shipment.tracking_number
                    )));
                }
            }
            if schema
                .incidents
                .values()
                .any(|incident| incident.shipment_id == Some(id))
            {
                return Err(DeliveryError::conflict(format!(
                    "shipment {} has incidents",
                    shipment.tracking_number
                )));
            }

            schema.tour_stops.retain(|stop| stop.shipment_id != id);
            schema.status_history.retain(|entry| entry.shipment_id != id);
            for reclamation in schema.reclamations.values_mut() {
                reclamation.shipment_ids.retain(|linked| *linked != id);
            }
            schema.shipments.remove(id.0);
            info!(shipment_id = id.0, "shipment deleted");
            Ok(())
        })
    }

    pub fn get(&self, id: ShipmentId) -> Result<Shipment, DeliveryError> {
        self.db.read(|schema| schema.shipments.require(id.0).cloned())
    }

    pub fn history(&self, id: ShipmentId) -> Result<Vec<StatusHistoryEntry>, DeliveryError> {
        self.db.read(|schema| {
            schema.shipments.require(id.0)?;
            Ok(workflow::history_of(schema, id))
        })
    }

    pub fn track(&self, tracking_number: &str) -> Result<TrackingView, DeliveryError> {
        let wanted = tracking_number.trim();
        self.db.read(|schema| {
            let shipment = schema
                .shipments
                .values()
                .find(|shipment| shipment.tracking_number.eq_ignore_ascii_case(wanted))
                .cloned()
                .ok_or_else(|| DeliveryError::UnknownTracking(wanted.to_string()))?;
            let history = workflow::history_of(schema, shipment.id);
            Ok(TrackingView { shipment, history })
        })
    }

    pub fn list(&self, filter: &ShipmentFilter) -> Vec<Shipment> {
        self.db.read(|schema| {
            schema
                .shipments
                .values()
                .filter(|shipment| filter.matches(shipment))
                .cloned()
                .collect()
        })
    }

    pub fn client_shipments(&self, client_id: ClientId) -> Result<Vec<Shipment>, DeliveryError> {
        self.db.read(|schema| {
            schema.clients.require(client_id.0)?;
            Ok(schema
                .shipments
                .values()
                .filter(|shipment| shipment.client_id == client_id)
                .cloned()
                .collect())
        })
    }

    pub fn export(&self) -> Result<CsvExport, DeliveryError> {
        self.db
            .read(|schema| CsvExport::build("shipments", schema.shipments.values()))
    }
}

/// Inserts a priced shipment with its first history entry, attaching it to
/// the requested tour. Shared with the creation wizard.
pub(crate) fn register(
    schema: &mut Schema,
    draft: ShipmentDraft,
    created_by: UserId,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Shipment, DeliveryError> {
    require_text("description", &draft.description)?;
    schema.clients.require(draft.client_id.0)?;
    schema.users.require(created_by.0)?;
    let quote = pricing::quote_for(
        schema,
        draft.service_type_id,
        draft.destination_id,
        draft.weight_kg,
        draft.volume_m3,
    )?;
    if let Some(tour_id) = draft.tour_id {
        tours::service::require_pending(schema, tour_id)?;
    }

    let tracking_number = next_tracking_number(schema);
    let id = schema
        .shipments
        .insert_with(|id| Shipment {
            id: ShipmentId(id),
            tracking_number,
            client_id: draft.client_id,
            service_type_id: draft.service_type_id,
            destination_id: draft.destination_id,
            tour_id: None,
            weight_kg: draft.weight_kg,
            volume_m3: draft.volume_m3,
            description: draft.description.trim().to_string(),
            created_at: now,
            estimated_delivery_date: draft.estimated_delivery_date,
            real_delivery_date: None,
            status: ShipmentStatus::Registered,
            total_price: quote.total,
            created_by,
        })
        .id;
    workflow::record(
        schema,
        id,
        ShipmentStatus::Registered,
        ShipmentStatus::Registered.standard_note().to_string(),
        now,
    );
    if let Some(tour_id) = draft.tour_id {
        tours::service::attach(schema, tour_id, id);
    }

    let shipment = schema.shipments.require(id.0)?.clone();
    info!(
        shipment_id = id.0,
        tracking_number = %shipment.tracking_number,
        total = %shipment.total_price,
        "shipment registered"
    );
    Ok(shipment)
}

pub(crate) fn is_invoiced(schema: &Schema, id: ShipmentId) -> bool {
    schema
        .invoices
        .values()
        .any(|invoice| invoice.shipment_ids.contains(&id))
}

fn next_tracking_number(schema: &Schema) -> String {
    loop {
        let candidate = tracking_candidate();
        if !schema
            .shipments
            .values()
            .any(|shipment| shipment.tracking_number == candidate)
        {
            return candidate;
        }
    }
}

fn tracking_candidate() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("EXP-{}", hex[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_numbers_are_prefixed_upper_hex() {
        let number = tracking_candidate();
        assert_eq!(number.len(), 12);
        assert!(number.starts_with("EXP-"));
        assert!(number[4..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }
}
