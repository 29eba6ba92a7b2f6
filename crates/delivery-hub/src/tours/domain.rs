use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{DriverId, VehicleId};
use crate::export::{optional, yes_no, CsvRecord};
use crate::shipments::{ShipmentId, ShipmentStatus};
use crate::store::record_id;

record_id!(
    /// Identifier of a delivery round.
    TourId,
    "tour"
);
record_id!(TourStopId, "tour stop");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TourStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Completed and cancelled tours accept no further edits.
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for TourStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub id: TourId,
    pub driver_id: Option<DriverId>,
    pub vehicle_id: Option<VehicleId>,
    pub tour_date: NaiveDate,
    pub starting_hour: Option<DateTime<Utc>>,
    pub finishing_hour: Option<DateTime<Utc>>,
    pub kilometers: f64,
    pub fuel_consumption: f64,
    pub status: TourStatus,
    pub comments: String,
    pub has_delay: bool,
    pub delay_minutes: u32,
    pub has_technical_issue: bool,
    pub technical_issue_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A shipment scheduled on a tour, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourStop {
    pub id: TourStopId,
    pub tour_id: TourId,
    pub shipment_id: ShipmentId,
    pub order: u32,
    pub delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourDraft {
    #[serde(default)]
    pub driver_id: Option<DriverId>,
    #[serde(default)]
    pub vehicle_id: Option<VehicleId>,
    pub tour_date: NaiveDate,
    #[serde(default)]
    pub comments: String,
}

/// Editable planning fields; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourPatch {
    #[serde(default)]
    pub driver_id: Option<DriverId>,
    #[serde(default)]
    pub vehicle_id: Option<VehicleId>,
    #[serde(default)]
    pub tour_date: Option<NaiveDate>,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Driver's end-of-round report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub kilometers: f64,
    #[serde(default)]
    pub fuel_consumption: f64,
    #[serde(default)]
    pub has_delay: bool,
    #[serde(default)]
    pub delay_minutes: u32,
    #[serde(default)]
    pub has_technical_issue: bool,
    #[serde(default)]
    pub technical_issue_description: String,
    #[serde(default)]
    pub comments: Option<String>,
    /// Shipments handed over; every stop when absent.
    #[serde(default)]
    pub delivered: Option<Vec<ShipmentId>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddShipment {
    pub shipment_id: ShipmentId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TourFilter {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub status: Option<TourStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopView {
    #[serde(flatten)]
    pub stop: TourStop,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub weight_kg: f64,
    pub volume_m3: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TourDetail {
    pub tour: Tour,
    pub driver_name: Option<String>,
    pub vehicle_plate: Option<String>,
    pub stops: Vec<StopView>,
    pub shipment_count: usize,
    pub delivered_count: usize,
    pub total_weight: f64,
    pub total_volume: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TourStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub total_km: f64,
    pub total_fuel: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TourListing {
    pub tours: Vec<Tour>,
    pub stats: TourStats,
}

/// Flattened export row with the driver and vehicle resolved.
#[derive(Debug, Clone)]
pub struct TourExportRow {
    pub tour: Tour,
    pub driver_name: Option<String>,
    pub vehicle_plate: Option<String>,
    pub shipment_count: usize,
}

impl CsvRecord for TourExportRow {
    const HEADER: &'static [&'static str] = &[
        "id",
        "date",
        "driver",
        "vehicle",
        "status",
        "kilometers",
        "fuel",
        "shipments",
        "delay",
        "technical_issue",
    ];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.tour.id.to_string(),
            self.tour.tour_date.to_string(),
            optional(self.driver_name.as_deref()),
            optional(self.vehicle_plate.as_deref()),
            self.tour.status.label().to_string(),
            self.tour.kilometers.to_string(),
            self.tour.fuel_consumption.to_string(),
            self.shipment_count.to_string(),
            yes_no(self.tour.has_delay),
            yes_no(self.tour.has_technical_issue),
        ]
    }
}
