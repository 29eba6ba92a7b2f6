//! Shipment price computation.
//!
//! A price is the destination zone's base price plus a per-kilogram and a
//! per-cubic-meter charge taken from the service type. Each term is rounded
//! to the cent on its own and the total is their sum, so the breakdown always
//! adds up.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::catalog::{DestinationId, ServiceTypeId};
use crate::error::DeliveryError;
use crate::hub::DeliveryHub;
use crate::money::Money;
use crate::store::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub base: Money,
    pub weight_charge: Money,
    pub volume_charge: Money,
    pub total: Money,
}

pub fn quote(
    base_price: Money,
    weight_rate: Money,
    volume_rate: Money,
    weight_kg: f64,
    volume_m3: f64,
) -> Result<PriceQuote, DeliveryError> {
    ensure_positive("weight_kg", weight_kg)?;
    ensure_positive("volume_m3", volume_m3)?;

    let weight_charge = weight_rate
        .checked_times(weight_kg)
        .ok_or_else(DeliveryError::amount_out_of_range)?;
    let volume_charge = volume_rate
        .checked_times(volume_m3)
        .ok_or_else(DeliveryError::amount_out_of_range)?;
    let total = base_price
        .checked_add(weight_charge)
        .and_then(|subtotal| subtotal.checked_add(volume_charge))
        .ok_or_else(DeliveryError::amount_out_of_range)?;
    Ok(PriceQuote {
        base: base_price,
        weight_charge,
        volume_charge,
        total,
    })
}

/// Resolves the zone through the destination and prices the parcel.
pub fn quote_for(
    schema: &Schema,
    service_type_id: ServiceTypeId,
    destination_id: DestinationId,
    weight_kg: f64,
    volume_m3: f64,
) -> Result<PriceQuote, DeliveryError> {
    let service = schema.service_types.require(service_type_id.0)?;
    let destination = schema.destinations.require(destination_id.0)?;
    let zone = schema.zones.require(destination.zone_id.0)?;
    quote(
        zone.base_price,
        service.weight_rate,
        service.volume_rate,
        weight_kg,
        volume_m3,
    )
}

fn ensure_positive(field: &str, value: f64) -> Result<(), DeliveryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DeliveryError::validation(format!(
            "{field} must be a positive number"
        )))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteQuery {
    pub service_type_id: ServiceTypeId,
    pub destination_id: DestinationId,
    pub weight: f64,
    pub volume: f64,
}

pub fn pricing_routes() -> Router<DeliveryHub> {
    Router::new().route("/api/v1/pricing/quote", get(quote_handler))
}

async fn quote_handler(
    State(hub): State<DeliveryHub>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<PriceQuote>, DeliveryError> {
    hub.database()
        .read(|schema| {
            quote_for(
                schema,
                query.service_type_id,
                query.destination_id,
                query.weight,
                query.volume,
            )
        })
        .map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_each_term_then_sums() {
        let quote = quote(
            Money::from_cents(500),
            Money::from_cents(125),
            Money::from_cents(2000),
            2.5,
            0.15,
        )
        .expect("valid parcel");

        assert_eq!(quote.base, Money::from_cents(500));
        assert_eq!(quote.weight_charge, Money::from_cents(313));
        assert_eq!(quote.volume_charge, Money::from_cents(300));
        assert_eq!(quote.total, Money::from_cents(1113));
    }

    #[test]
    fn rejects_non_positive_or_non_finite_measurements() {
        let rate = Money::from_cents(100);
        for (weight, volume) in [(0.0, 1.0), (1.0, -0.5), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
            let result = quote(rate, rate, rate, weight, volume);
            assert!(matches!(result, Err(DeliveryError::Validation(_))));
        }
    }

    #[test]
    fn oversized_parcel_is_refused_instead_of_overflowing() {
        let result = quote(
            Money::from_cents(500),
            Money::from_cents(100),
            Money::from_cents(100),
            1e300,
            1.0,
        );
        match result {
            Err(DeliveryError::Validation(message)) => assert_eq!(message, "amount out of range"),
            other => panic!("expected a range error, got {other:?}"),
        }

        let near_limit = quote(
            Money::from_cents(i64::MAX - 10),
            Money::from_cents(100),
            Money::from_cents(100),
            1.0,
            1.0,
        );
        assert!(matches!(near_limit, Err(DeliveryError::Validation(_))));
    }

    #[test]
    fn quote_for_reports_missing_destination() {
        let schema = Schema::default();
        let result = quote_for(&schema, ServiceTypeId(1), DestinationId(1), 1.0, 1.0);
        assert!(matches!(result, Err(DeliveryError::NotFound { .. })));
    }
}
