#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, TimeZone, Utc};
use delivery_hub::catalog::{
    ClientDraft, ClientId, DestinationDraft, DestinationId, DriverDraft, DriverId,
    ServiceTypeDraft, ServiceTypeId, VehicleDraft, VehicleId, VehicleStatus, ZoneDraft,
};
use delivery_hub::clock::FixedClock;
use delivery_hub::incidents::AlertPublisher;
use delivery_hub::money::Money;
use delivery_hub::shipments::{Shipment, ShipmentDraft};
use delivery_hub::users::{Role, User, UserDraft, USER_HEADER};
use delivery_hub::{delivery_router, DeliveryHub};
use serde_json::Value;
use tower::ServiceExt;

pub struct World {
    pub hub: DeliveryHub,
    pub clock: Arc<FixedClock>,
    pub admin: User,
    pub agent: User,
    pub client: ClientId,
    pub other_client: ClientId,
    pub express: ServiceTypeId,
    pub oran: DestinationId,
    pub driver: DriverId,
    pub vehicle: VehicleId,
}

pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date")
}

pub fn world() -> World {
    world_with(None)
}

/// Catalog of one zone priced at 500.00, an express service at 125.00/kg
/// and 2000.00/m3, two clients, a driver and a van.
pub fn world_with(alerts: Option<Arc<dyn AlertPublisher>>) -> World {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap(),
    ));
    let mut builder = DeliveryHub::builder().clock(clock.clone());
    if let Some(alerts) = alerts {
        builder = builder.alerts(alerts);
    }
    let hub = builder.build();

    let users = hub.users();
    let admin = users
        .register(UserDraft {
            username: "amel".to_string(),
            email: "amel@delivery.example".to_string(),
            role: Role::Admin,
        })
        .expect("admin");
    let agent = users
        .register(UserDraft {
            username: "yacine".to_string(),
            email: "yacine@delivery.example".to_string(),
            role: Role::Agent,
        })
        .expect("agent");

    let catalog = hub.catalog();
    let zone = catalog
        .create_zone(ZoneDraft {
            name: "Coastal".to_string(),
            base_price: Money::from_cents(50_000),
        })
        .expect("zone");
    let oran = catalog
        .create_destination(DestinationDraft {
            city: "Oran".to_string(),
            country: "Algeria".to_string(),
            zone_id: zone.id,
            postal_code: "31000".to_string(),
        })
        .expect("destination")
        .id;
    let express = catalog
        .create_service_type(ServiceTypeDraft {
            name: "Express".to_string(),
            weight_rate: Money::from_cents(12_500),
            volume_rate: Money::from_cents(200_000),
        })
        .expect("service type")
        .id;
    let client = catalog
        .create_client(client_draft("CL-001", "Atlas Trading", "ops@atlas.example"))
        .expect("client")
        .id;
    let other_client = catalog
        .create_client(client_draft("CL-002", "Numidia Foods", "desk@numidia.example"))
        .expect("client")
        .id;
    let driver = catalog
        .create_driver(DriverDraft {
            first_name: "Karim".to_string(),
            last_name: "Benali".to_string(),
            license_number: "DZ-44-1029".to_string(),
            phone: String::new(),
            available: true,
        })
        .expect("driver")
        .id;
    let vehicle = catalog
        .create_vehicle(VehicleDraft {
            plate_number: "123-456-16".to_string(),
            vehicle_type: "van".to_string(),
            capacity_kg: 1200.0,
            status: VehicleStatus::Available,
        })
        .expect("vehicle")
        .id;

    World {
        hub,
        clock,
        admin,
        agent,
        client,
        other_client,
        express,
        oran,
        driver,
        vehicle,
    }
}

fn client_draft(code: &str, name: &str, email: &str) -> ClientDraft {
    ClientDraft {
        code: code.to_string(),
        name: name.to_string(),
        phone: String::new(),
        email: email.to_string(),
        address: String::new(),
        client_type: "business".to_string(),
    }
}

impl World {
    pub fn parcel(&self, client: ClientId, weight_kg: f64, volume_m3: f64) -> ShipmentDraft {
        ShipmentDraft {
            client_id: client,
            service_type_id: self.express,
            destination_id: self.oran,
            tour_id: None,
            weight_kg,
            volume_m3,
            description: "Spare parts".to_string(),
            estimated_delivery_date: Some(monday()),
        }
    }

    /// 2.5 kg and 0.15 m3, priced 1112.50.
    pub fn ship(&self, client: ClientId) -> Shipment {
        self.hub
            .shipments()
            .create(self.parcel(client, 2.5, 0.15), self.agent.id)
            .expect("shipment")
    }

    pub fn router(&self) -> Router {
        delivery_router(self.hub.clone())
    }
}

pub async fn send(
    router: Router,
    method: &str,
    uri: &str,
    user: Option<&User>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(USER_HEADER, user.id.to_string());
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}
