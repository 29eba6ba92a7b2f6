use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{ClientId, DestinationId, ServiceTypeId};
use crate::export::{optional, CsvRecord};
use crate::money::Money;
use crate::store::record_id;
use crate::tours::TourId;
use crate::users::UserId;

record_id!(ShipmentId, "shipment");
record_id!(StatusHistoryId, "status history entry");

/// Delivery progress of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Registered,
    Transit,
    Sorting,
    OutForDelivery,
    Delivered,
    Failed,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 6] = [
        Self::Registered,
        Self::Transit,
        Self::Sorting,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Failed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Registered => "Registered",
            Self::Transit => "In transit",
            Self::Sorting => "At sorting center",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Failed => "Delivery failed",
        }
    }

    /// Note recorded in the history when the caller gives none.
    pub const fn standard_note(self) -> &'static str {
        match self {
            Self::Registered => "Shipment registered",
            Self::Transit => "Shipment in transit",
            Self::Sorting => "Shipment arrived at the sorting center",
            Self::OutForDelivery => "Shipment out for delivery",
            Self::Delivered => "Shipment delivered",
            Self::Failed => "Delivery attempt failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }

    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Registered, Transit | Failed)
                | (Transit, Sorting | OutForDelivery | Delivered | Failed)
                | (Sorting, Transit | OutForDelivery | Failed)
                | (OutForDelivery, Delivered | Failed | Sorting)
                | (Failed, Sorting | OutForDelivery)
        )
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub tracking_number: String,
    pub client_id: ClientId,
    pub service_type_id: ServiceTypeId,
    pub destination_id: DestinationId,
    pub tour_id: Option<TourId>,
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub real_delivery_date: Option<NaiveDate>,
    pub status: ShipmentStatus,
    /// Derived from the zone and service rates on every save.
    pub total_price: Money,
    pub created_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: StatusHistoryId,
    pub shipment_id: ShipmentId,
    pub status: ShipmentStatus,
    pub note: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDraft {
    pub client_id: ClientId,
    pub service_type_id: ServiceTypeId,
    pub destination_id: DestinationId,
    #[serde(default)]
    pub tour_id: Option<TourId>,
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub description: String,
    #[serde(default)]
    pub estimated_delivery_date: Option<NaiveDate>,
}

/// Partial edit; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentPatch {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub service_type_id: Option<ServiceTypeId>,
    #[serde(default)]
    pub destination_id: Option<DestinationId>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_delivery_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentFilter {
    #[serde(default)]
    pub status: Option<ShipmentStatus>,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub tour_id: Option<TourId>,
    #[serde(default)]
    pub q: Option<String>,
}

impl ShipmentFilter {
    pub(crate) fn matches(&self, shipment: &Shipment) -> bool {
        if self.status.is_some_and(|status| status != shipment.status) {
            return false;
        }
        if self.client_id.is_some_and(|client| client != shipment.client_id) {
            return false;
        }
        if self.tour_id.is_some() && self.tour_id != shipment.tour_id {
            return false;
        }
        match self.q.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                shipment.tracking_number.to_lowercase().contains(&needle)
                    || shipment.description.to_lowercase().contains(&needle)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: ShipmentStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// Public tracking answer: the shipment plus its full history.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub shipment: Shipment,
    pub history: Vec<StatusHistoryEntry>,
}

impl CsvRecord for Shipment {
    const HEADER: &'static [&'static str] = &[
        "id",
        "tracking_number",
        "client_id",
        "service_type_id",
        "destination_id",
        "tour_id",
        "weight_kg",
        "volume_m3",
        "status",
        "total_price",
        "created_at",
        "estimated_delivery_date",
        "real_delivery_date",
        "description",
    ];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.tracking_number.clone(),
            self.client_id.to_string(),
            self.service_type_id.to_string(),
            self.destination_id.to_string(),
            optional(self.tour_id),
            self.weight_kg.to_string(),
            self.volume_m3.to_string(),
            self.status.label().to_string(),
            self.total_price.to_string(),
            self.created_at.format("%Y-%m-%d %H:%M").to_string(),
            optional(self.estimated_delivery_date),
            optional(self.real_delivery_date),
            self.description.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_is_terminal() {
        for next in ShipmentStatus::ALL {
            assert!(!ShipmentStatus::Delivered.can_transition_to(next));
        }
    }

    #[test]
    fn registered_only_leaves_for_transit_or_failure() {
        let reachable: Vec<_> = ShipmentStatus::ALL
            .into_iter()
            .filter(|next| ShipmentStatus::Registered.can_transition_to(*next))
            .collect();
        assert_eq!(
            reachable,
            vec![ShipmentStatus::Transit, ShipmentStatus::Failed]
        );
    }

    #[test]
    fn failed_shipments_can_be_retried() {
        assert!(ShipmentStatus::Failed.can_transition_to(ShipmentStatus::OutForDelivery));
        assert!(ShipmentStatus::Failed.can_transition_to(ShipmentStatus::Sorting));
        assert!(!ShipmentStatus::Failed.can_transition_to(ShipmentStatus::Delivered));
    }

    #[test]
    fn status_uses_snake_case_on_the_wire() {
        let encoded = serde_json::to_string(&ShipmentStatus::OutForDelivery).expect("encode");
        assert_eq!(encoded, "\"out_for_delivery\"");
    }
}
