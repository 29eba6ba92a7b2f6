//! Status transitions shared by the shipment service and tour propagation.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{ShipmentId, ShipmentStatus, StatusHistoryEntry, StatusHistoryId};
use crate::error::DeliveryError;
use crate::store::Schema;

/// Outcome of checking a requested status against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Unchanged,
    Move(ShipmentStatus, ShipmentStatus),
}

pub(crate) fn check(
    schema: &Schema,
    id: ShipmentId,
    next: ShipmentStatus,
) -> Result<Transition, DeliveryError> {
    let current = schema.shipments.require(id.0)?.status;
    if current == next {
        return Ok(Transition::Unchanged);
    }
    if !current.can_transition_to(next) {
        warn!(shipment_id = id.0, from = %current, to = %next, "rejected status transition");
        return Err(DeliveryError::InvalidTransition {
            from: current,
            to: next,
        });
    }
    Ok(Transition::Move(current, next))
}

/// Validates and applies a transition. Returns whether anything changed.
pub(crate) fn apply(
    schema: &mut Schema,
    id: ShipmentId,
    next: ShipmentStatus,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<bool, DeliveryError> {
    let Transition::Move(from, to) = check(schema, id, next)? else {
        return Ok(false);
    };

    let shipment = schema.shipments.require_mut(id.0)?;
    shipment.status = to;
    if to == ShipmentStatus::Delivered && shipment.real_delivery_date.is_none() {
        shipment.real_delivery_date = Some(now.date_naive());
    }
    let note = note
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| to.standard_note().to_string());
    record(schema, id, to, note, now);
    info!(shipment_id = id.0, from = %from, to = %to, "shipment status changed");
    Ok(true)
}

pub(crate) fn record(
    schema: &mut Schema,
    shipment_id: ShipmentId,
    status: ShipmentStatus,
    note: String,
    recorded_at: DateTime<Utc>,
) {
    schema
        .status_history
        .insert_with(|id| StatusHistoryEntry {
            id: StatusHistoryId(id),
            shipment_id,
            status,
            note,
            recorded_at,
        });
}

pub(crate) fn history_of(schema: &Schema, shipment_id: ShipmentId) -> Vec<StatusHistoryEntry> {
    schema
        .status_history
        .values()
        .filter(|entry| entry.shipment_id == shipment_id)
        .cloned()
        .collect()
}
