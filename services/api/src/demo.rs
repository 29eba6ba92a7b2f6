use crate::infra::InMemoryAlertPublisher;
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use delivery_hub::billing::{InvoiceDraft, InvoiceView, PaymentDraft, PaymentMethod};
use delivery_hub::catalog::{
    ClientDraft, DestinationDraft, DriverDraft, ServiceTypeDraft, VehicleDraft, VehicleStatus,
    ZoneDraft,
};
use delivery_hub::error::{AppError, DeliveryError};
use delivery_hub::incidents::{IncidentDraft, IncidentPriority, IncidentType};
use delivery_hub::money::Money;
use delivery_hub::reclamations::{ReclamationDetail, ReclamationDraft, ReclamationKind, ReclamationPriority};
use delivery_hub::shipments::{Shipment, ShipmentDraft};
use delivery_hub::tours::{CompletionReport, TourDetail, TourDraft};
use delivery_hub::users::{Role, User, UserDraft};
use delivery_hub::wizard::{AssignmentStep, ClientStep, ParcelStep, ServiceStep};
use delivery_hub::DeliveryHub;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Tour date used by the scenario (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

/// Everything the scripted day produced.
pub(crate) struct DemoOutcome {
    pub(crate) agent: User,
    pub(crate) wizard_shipment: Shipment,
    pub(crate) counter_shipment: Shipment,
    pub(crate) tour: TourDetail,
    pub(crate) invoice: InvoiceView,
    pub(crate) reclamation: ReclamationDetail,
}

pub(crate) fn demo_hub(alerts: InMemoryAlertPublisher) -> DeliveryHub {
    DeliveryHub::builder().alerts(Arc::new(alerts)).build()
}

/// Seeds reference data and walks two parcels through a delivery day.
pub(crate) fn seed(hub: &DeliveryHub, date: NaiveDate) -> Result<DemoOutcome, DeliveryError> {
    let users = hub.users();
    users.register(UserDraft {
        username: "admin".to_string(),
        email: "admin@delivery.example".to_string(),
        role: Role::Admin,
    })?;
    let agent = users.register(UserDraft {
        username: "counter-agent".to_string(),
        email: "counter@delivery.example".to_string(),
        role: Role::Agent,
    })?;

    let catalog = hub.catalog();
    let zone = catalog.create_zone(ZoneDraft {
        name: "Coastal".to_string(),
        base_price: Money::from_cents(50_000),
    })?;
    let destination = catalog.create_destination(DestinationDraft {
        city: "Oran".to_string(),
        country: "Algeria".to_string(),
        zone_id: zone.id,
        postal_code: "31000".to_string(),
    })?;
    let express = catalog.create_service_type(ServiceTypeDraft {
        name: "Express".to_string(),
        weight_rate: Money::from_cents(12_500),
        volume_rate: Money::from_cents(200_000),
    })?;
    let client = catalog.create_client(ClientDraft {
        code: "CL-0001".to_string(),
        name: "Atlas Trading".to_string(),
        phone: "+213 555 0101".to_string(),
        email: "ops@atlas.example".to_string(),
        address: "12 Rue Didouche, Alger".to_string(),
        client_type: "business".to_string(),
    })?;
    let driver = catalog.create_driver(DriverDraft {
        first_name: "Karim".to_string(),
        last_name: "Benali".to_string(),
        license_number: "DZ-44-1029".to_string(),
        phone: "+213 555 0199".to_string(),
        available: true,
    })?;
    let vehicle = catalog.create_vehicle(VehicleDraft {
        plate_number: "123-456-16".to_string(),
        vehicle_type: "van".to_string(),
        capacity_kg: 1200.0,
        status: VehicleStatus::Available,
    })?;

    let wizard = hub.wizard();
    let session = wizard.start().session_id;
    wizard.submit_client(session, ClientStep { client_id: client.id })?;
    wizard.submit_service(
        session,
        ServiceStep {
            service_type_id: express.id,
            destination_id: destination.id,
        },
    )?;
    wizard.submit_parcel(
        session,
        ParcelStep {
            weight_kg: 2.5,
            volume_m3: 0.15,
            description: "Spare parts".to_string(),
            estimated_delivery_date: date + Duration::days(2),
        },
    )?;
    let wizard_shipment =
        wizard.submit_assignment(session, AssignmentStep::default(), agent.id)?;

    let shipments = hub.shipments();
    let counter_shipment = shipments.create(
        ShipmentDraft {
            client_id: client.id,
            service_type_id: express.id,
            destination_id: destination.id,
            tour_id: None,
            weight_kg: 8.0,
            volume_m3: 0.4,
            description: "Office chairs".to_string(),
            estimated_delivery_date: Some(date + Duration::days(1)),
        },
        agent.id,
    )?;

    let tours = hub.tours();
    let tour = tours.create(TourDraft {
        driver_id: Some(driver.id),
        vehicle_id: Some(vehicle.id),
        tour_date: date,
        comments: "Morning round".to_string(),
    })?;
    tours.add_shipment(tour.id, wizard_shipment.id)?;
    tours.add_shipment(tour.id, counter_shipment.id)?;
    tours.start(tour.id)?;
    let tour = tours.complete(
        tour.id,
        CompletionReport {
            kilometers: 86.4,
            fuel_consumption: 9.2,
            has_delay: true,
            delay_minutes: 35,
            delivered: Some(vec![wizard_shipment.id]),
            ..CompletionReport::default()
        },
    )?;

    let billing = hub.billing();
    let invoice = billing.create_invoice(InvoiceDraft {
        client_id: client.id,
        shipment_ids: vec![wizard_shipment.id, counter_shipment.id],
    })?;
    let invoice = billing.register_payment(
        invoice.invoice.id,
        PaymentDraft {
            amount: Money::from_cents(100_000),
            method: PaymentMethod::BankTransfer,
        },
    )?;

    hub.incidents().create(
        IncidentDraft {
            shipment_id: Some(counter_shipment.id),
            tour_id: Some(tour.tour.id),
            incident_type: IncidentType::Damage,
            priority: IncidentPriority::Critical,
            description: "Crate crushed during unloading".to_string(),
            assigned_to: None,
        },
        agent.id,
    )?;

    let reclamation = hub.reclamations().create(
        ReclamationDraft {
            client_id: client.id,
            kind: ReclamationKind::DamagedParcel,
            description: "Chairs arrived broken and a day late".to_string(),
            shipment_ids: vec![counter_shipment.id],
            invoice_id: Some(invoice.invoice.id),
            priority: ReclamationPriority::High,
            assigned_to: None,
        },
        agent.id,
    )?;

    Ok(DemoOutcome {
        wizard_shipment: shipments.get(wizard_shipment.id)?,
        counter_shipment: shipments.get(counter_shipment.id)?,
        agent,
        tour,
        invoice,
        reclamation,
    })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let alerts = InMemoryAlertPublisher::default();
    let hub = demo_hub(alerts.clone());
    let outcome = seed(&hub, date)?;

    println!("Delivery hub demo for {date}");
    println!("\nShipments");
    for shipment in [&outcome.wizard_shipment, &outcome.counter_shipment] {
        println!(
            "  {} {:<14} {:>10}  {}",
            shipment.tracking_number,
            shipment.status.label(),
            shipment.total_price,
            shipment.description
        );
    }

    let tour = &outcome.tour;
    println!(
        "\nTour #{} ({}) driver {} vehicle {}",
        tour.tour.id,
        tour.tour.status,
        tour.driver_name.as_deref().unwrap_or("-"),
        tour.vehicle_plate.as_deref().unwrap_or("-"),
    );
    println!(
        "  {}/{} delivered, {:.1} kg, {:.2} m3",
        tour.delivered_count, tour.shipment_count, tour.total_weight, tour.total_volume
    );

    let invoice = &outcome.invoice;
    println!(
        "\nInvoice #{}: HT {} + VAT {} = TTC {}; paid {}, remaining {} ({:?})",
        invoice.invoice.id,
        invoice.invoice.amount_ht,
        invoice.invoice.amount_tva,
        invoice.invoice.amount_ttc,
        invoice.total_paid,
        invoice.remaining_amount,
        invoice.payment_state
    );

    println!("\nAlerts dispatched");
    for alert in alerts.events() {
        println!("  {}", alert.summary);
    }

    println!(
        "\nReclamation {} filed for {}",
        outcome.reclamation.reclamation.reference, outcome.reclamation.client_name
    );

    let counts = hub.dashboard(&outcome.agent);
    println!(
        "\nDashboard for {}: {} total, {} delivered, {} in progress, {} registered, {} failed",
        outcome.agent.username,
        counts.total,
        counts.delivered,
        counts.in_progress,
        counts.registered,
        counts.failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_hub::billing::PaymentState;
    use delivery_hub::shipments::ShipmentStatus;
    use delivery_hub::tours::TourStatus;

    #[test]
    fn scripted_day_settles_every_workflow() {
        let alerts = InMemoryAlertPublisher::default();
        let hub = demo_hub(alerts.clone());
        let date = NaiveDate::from_ymd_opt(2025, 5, 12).expect("valid date");
        let outcome = seed(&hub, date).expect("demo seeds");

        assert_eq!(outcome.wizard_shipment.status, ShipmentStatus::Delivered);
        assert_eq!(outcome.counter_shipment.status, ShipmentStatus::Sorting);
        assert_eq!(outcome.tour.tour.status, TourStatus::Completed);
        assert_eq!(outcome.invoice.payment_state, PaymentState::PartiallyPaid);
        assert_eq!(alerts.events().len(), 1);
        assert!(outcome
            .reclamation
            .reclamation
            .reference
            .starts_with("REC-"));

        let counts = hub.dashboard(&outcome.agent);
        assert_eq!(counts.total, 2);
        assert_eq!(counts.delivered, 1);
    }
}
