use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;
use crate::export::CsvRecord;
use crate::money::Money;
use crate::store::record_id;

record_id!(
    /// Identifier of a billed customer.
    ClientId,
    "client"
);
record_id!(DriverId, "driver");
record_id!(VehicleId, "vehicle");
record_id!(
    /// Identifier of a pricing region.
    ZoneId,
    "zone"
);
record_id!(DestinationId, "destination");
record_id!(ServiceTypeId, "service type");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub code: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub client_type: String,
    /// Amount the client currently owes across its invoices.
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDraft {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub client_type: String,
}

impl ClientDraft {
    pub(crate) fn validate(&self) -> Result<(), DeliveryError> {
        require_text("code", &self.code)?;
        require_text("name", &self.name)?;
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !well_formed {
            return Err(DeliveryError::validation(format!(
                "email '{email}' is not a valid address"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub phone: String,
    pub available: bool,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverDraft {
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl DriverDraft {
    pub(crate) fn validate(&self) -> Result<(), DeliveryError> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        require_text("license_number", &self.license_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    #[default]
    Available,
    InUse,
    Maintenance,
    Retired,
}

impl VehicleStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::InUse => "In use",
            Self::Maintenance => "Maintenance",
            Self::Retired => "Retired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub plate_number: String,
    pub vehicle_type: String,
    pub capacity_kg: f64,
    pub status: VehicleStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDraft {
    pub plate_number: String,
    #[serde(default)]
    pub vehicle_type: String,
    pub capacity_kg: f64,
    #[serde(default)]
    pub status: VehicleStatus,
}

impl VehicleDraft {
    pub(crate) fn validate(&self) -> Result<(), DeliveryError> {
        require_text("plate_number", &self.plate_number)?;
        if !(self.capacity_kg.is_finite() && self.capacity_kg > 0.0) {
            return Err(DeliveryError::validation("capacity_kg must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub base_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDraft {
    pub name: String,
    pub base_price: Money,
}

impl ZoneDraft {
    pub(crate) fn validate(&self) -> Result<(), DeliveryError> {
        require_text("name", &self.name)?;
        require_non_negative("base_price", self.base_price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: DestinationId,
    pub city: String,
    pub country: String,
    pub zone_id: ZoneId,
    pub postal_code: String,
}

impl Destination {
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationDraft {
    pub city: String,
    pub country: String,
    pub zone_id: ZoneId,
    #[serde(default)]
    pub postal_code: String,
}

impl DestinationDraft {
    pub(crate) fn validate(&self) -> Result<(), DeliveryError> {
        require_text("city", &self.city)?;
        require_text("country", &self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: ServiceTypeId,
    pub name: String,
    /// Charge per kilogram.
    pub weight_rate: Money,
    /// Charge per cubic meter.
    pub volume_rate: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTypeDraft {
    pub name: String,
    pub weight_rate: Money,
    pub volume_rate: Money,
}

impl ServiceTypeDraft {
    pub(crate) fn validate(&self) -> Result<(), DeliveryError> {
        require_text("name", &self.name)?;
        require_non_negative("weight_rate", self.weight_rate)?;
        require_non_negative("volume_rate", self.volume_rate)
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), DeliveryError> {
    if value.trim().is_empty() {
        Err(DeliveryError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn require_non_negative(field: &str, value: Money) -> Result<(), DeliveryError> {
    if value.is_negative() {
        Err(DeliveryError::validation(format!(
            "{field} cannot be negative"
        )))
    } else {
        Ok(())
    }
}

impl CsvRecord for Client {
    const HEADER: &'static [&'static str] = &[
        "id", "code", "name", "phone", "email", "address", "type", "balance", "created_at",
    ];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.code.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.address.clone(),
            self.client_type.clone(),
            self.balance.to_string(),
            self.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]
    }
}

impl CsvRecord for Driver {
    const HEADER: &'static [&'static str] =
        &["id", "first_name", "last_name", "license_number", "phone", "available"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.license_number.clone(),
            self.phone.clone(),
            crate::export::yes_no(self.available),
        ]
    }
}

impl CsvRecord for Vehicle {
    const HEADER: &'static [&'static str] =
        &["id", "plate_number", "type", "capacity_kg", "status"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.plate_number.clone(),
            self.vehicle_type.clone(),
            self.capacity_kg.to_string(),
            self.status.label().to_string(),
        ]
    }
}

impl CsvRecord for Zone {
    const HEADER: &'static [&'static str] = &["id", "name", "base_price"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.base_price.to_string(),
        ]
    }
}

impl CsvRecord for Destination {
    const HEADER: &'static [&'static str] = &["id", "city", "country", "postal_code", "zone_id"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.city.clone(),
            self.country.clone(),
            self.postal_code.clone(),
            self.zone_id.to_string(),
        ]
    }
}

impl CsvRecord for ServiceType {
    const HEADER: &'static [&'static str] = &["id", "name", "weight_rate", "volume_rate"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.weight_rate.to_string(),
            self.volume_rate.to_string(),
        ]
    }
}
