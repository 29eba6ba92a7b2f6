mod common;

use chrono::Duration;
use common::{monday, world};
use delivery_hub::error::DeliveryError;
use delivery_hub::money::Money;
use delivery_hub::shipments::ShipmentStatus;
use delivery_hub::tours::TourDraft;
use delivery_hub::wizard::{
    AssignmentStep, ClientStep, ParcelStep, ServiceStep, WizardError, WizardStep,
};

fn parcel(weight_kg: f64) -> ParcelStep {
    ParcelStep {
        weight_kg,
        volume_m3: 0.15,
        description: "Ceramic tiles".to_string(),
        estimated_delivery_date: monday() + Duration::days(3),
    }
}

#[test]
fn four_steps_create_a_registered_shipment_on_the_chosen_tour() {
    let world = world();
    let wizard = world.hub.wizard();
    let tour = world
        .hub
        .tours()
        .create(TourDraft {
            driver_id: Some(world.driver),
            vehicle_id: Some(world.vehicle),
            tour_date: monday(),
            comments: String::new(),
        })
        .expect("tour");

    let started = wizard.start();
    assert_eq!(started.current_step, 1);
    assert_eq!(started.total_steps, 4);
    let session = started.session_id;

    wizard
        .submit_client(session, ClientStep { client_id: world.client })
        .expect("client");
    let view = wizard
        .submit_service(
            session,
            ServiceStep {
                service_type_id: world.express,
                destination_id: world.oran,
            },
        )
        .expect("service");
    assert_eq!(view.current_step, 3);
    assert!(view.quote.is_none());

    let view = wizard.submit_parcel(session, parcel(2.5)).expect("parcel");
    let quote = view.quote.expect("quoted");
    assert_eq!(quote.total, Money::from_cents(111_250));

    let shipment = wizard
        .submit_assignment(
            session,
            AssignmentStep {
                tour_id: Some(tour.id),
            },
            world.agent.id,
        )
        .expect("assignment");
    assert_eq!(shipment.status, ShipmentStatus::Registered);
    assert_eq!(shipment.tour_id, Some(tour.id));
    assert_eq!(shipment.total_price, quote.total);
    assert_eq!(
        world.hub.tours().get(tour.id).expect("tour").shipment_count,
        1
    );

    assert!(matches!(
        wizard.get(session),
        Err(DeliveryError::Wizard(WizardError::UnknownSession(_)))
    ));
}

#[test]
fn steps_cannot_be_skipped() {
    let world = world();
    let wizard = world.hub.wizard();
    let session = wizard.start().session_id;
    wizard
        .submit_client(session, ClientStep { client_id: world.client })
        .expect("client");

    let skipped = wizard.submit_parcel(session, parcel(2.5));
    assert!(matches!(
        skipped,
        Err(DeliveryError::Wizard(WizardError::StepOutOfOrder {
            expected: WizardStep::Service
        }))
    ));
}

#[test]
fn going_back_to_service_requotes_the_parcel() {
    let world = world();
    let wizard = world.hub.wizard();
    let session = wizard.start().session_id;
    let service = ServiceStep {
        service_type_id: world.express,
        destination_id: world.oran,
    };
    wizard
        .submit_client(session, ClientStep { client_id: world.client })
        .expect("client");
    wizard.submit_service(session, service.clone()).expect("service");
    wizard.submit_parcel(session, parcel(4.0)).expect("parcel");

    let view = wizard.submit_service(session, service).expect("service again");
    assert_eq!(
        view.quote.expect("still quoted").total,
        Money::from_cents(130_000)
    );
}

#[test]
fn parcels_below_minimum_weight_are_refused() {
    let world = world();
    let wizard = world.hub.wizard();
    let session = wizard.start().session_id;
    wizard
        .submit_client(session, ClientStep { client_id: world.client })
        .expect("client");
    wizard
        .submit_service(
            session,
            ServiceStep {
                service_type_id: world.express,
                destination_id: world.oran,
            },
        )
        .expect("service");
    assert!(matches!(
        wizard.submit_parcel(session, parcel(0.05)),
        Err(DeliveryError::Validation(_))
    ));
}

#[test]
fn idle_sessions_expire() {
    let world = world();
    let wizard = world.hub.wizard();
    let session = wizard.start().session_id;
    world.clock.advance(Duration::minutes(61));
    assert!(matches!(
        wizard.submit_client(session, ClientStep { client_id: world.client }),
        Err(DeliveryError::Wizard(WizardError::UnknownSession(id))) if id == session
    ));
}

#[test]
fn reset_discards_the_session() {
    let world = world();
    let wizard = world.hub.wizard();
    let session = wizard.start().session_id;
    wizard.reset(session).expect("reset");
    assert!(wizard.get(session).is_err());
}
