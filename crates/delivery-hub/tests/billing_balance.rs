mod common;

use common::world;
use delivery_hub::billing::{
    InvoiceDraft, InvoiceFilter, PaymentDraft, PaymentFilter, PaymentMethod, PaymentState,
};
use delivery_hub::catalog::{DestinationDraft, ServiceTypeDraft, ZoneDraft};
use delivery_hub::error::DeliveryError;
use delivery_hub::money::Money;

fn balance(world: &common::World) -> Money {
    world.hub.catalog().client(world.client).expect("client").balance
}

#[test]
fn invoice_totals_and_balance_follow_payments() {
    let world = world();
    let first = world.ship(world.client);
    let second = world.ship(world.client);
    let billing = world.hub.billing();

    let invoice = billing
        .create_invoice(InvoiceDraft {
            client_id: world.client,
            shipment_ids: vec![first.id, second.id, first.id],
        })
        .expect("invoice");
    assert_eq!(invoice.invoice.shipment_ids.len(), 2);
    assert_eq!(invoice.invoice.amount_ht, Money::from_cents(222_500));
    // 19% of 2225.00 is 422.75
    assert_eq!(invoice.invoice.amount_tva, Money::from_cents(42_275));
    assert_eq!(invoice.invoice.amount_ttc, Money::from_cents(264_775));
    assert_eq!(invoice.payment_state, PaymentState::Unpaid);
    assert_eq!(balance(&world), Money::from_cents(264_775));

    let partial = billing
        .register_payment(
            invoice.invoice.id,
            PaymentDraft {
                amount: Money::from_cents(100_000),
                method: PaymentMethod::Cash,
            },
        )
        .expect("payment");
    assert_eq!(partial.payment_state, PaymentState::PartiallyPaid);
    assert_eq!(partial.remaining_amount, Money::from_cents(164_775));
    assert_eq!(balance(&world), Money::from_cents(164_775));

    let overpaid = billing.register_payment(
        invoice.invoice.id,
        PaymentDraft {
            amount: Money::from_cents(164_776),
            method: PaymentMethod::Card,
        },
    );
    assert!(matches!(overpaid, Err(DeliveryError::Validation(_))));

    let settled = billing
        .register_payment(
            invoice.invoice.id,
            PaymentDraft {
                amount: Money::from_cents(164_775),
                method: PaymentMethod::BankTransfer,
            },
        )
        .expect("payment");
    assert_eq!(settled.payment_state, PaymentState::Paid);
    assert_eq!(balance(&world), Money::ZERO);
    let amounts: Vec<Money> = billing
        .list_payments(&PaymentFilter::default())
        .iter()
        .map(|payment| payment.amount)
        .collect();
    assert_eq!(
        amounts,
        vec![Money::from_cents(100_000), Money::from_cents(164_775)]
    );
}

#[test]
fn shipments_are_billed_once_and_only_to_their_client() {
    let world = world();
    let mine = world.ship(world.client);
    let theirs = world.ship(world.other_client);
    let billing = world.hub.billing();

    let foreign = billing.create_invoice(InvoiceDraft {
        client_id: world.client,
        shipment_ids: vec![mine.id, theirs.id],
    });
    assert!(matches!(foreign, Err(DeliveryError::Validation(_))));
    assert_eq!(balance(&world), Money::ZERO);

    billing
        .create_invoice(InvoiceDraft {
            client_id: world.client,
            shipment_ids: vec![mine.id],
        })
        .expect("invoice");
    let twice = billing.create_invoice(InvoiceDraft {
        client_id: world.client,
        shipment_ids: vec![mine.id],
    });
    assert!(matches!(twice, Err(DeliveryError::Conflict(_))));

    let empty = billing.create_invoice(InvoiceDraft {
        client_id: world.client,
        shipment_ids: Vec::new(),
    });
    assert!(matches!(empty, Err(DeliveryError::Validation(_))));
}

#[test]
fn deleting_an_invoice_forgives_the_unpaid_remainder() {
    let world = world();
    let shipment = world.ship(world.client);
    let billing = world.hub.billing();
    let invoice = billing
        .create_invoice(InvoiceDraft {
            client_id: world.client,
            shipment_ids: vec![shipment.id],
        })
        .expect("invoice");
    billing
        .register_payment(
            invoice.invoice.id,
            PaymentDraft {
                amount: Money::from_cents(50_000),
                method: PaymentMethod::Cheque,
            },
        )
        .expect("payment");

    billing.delete_invoice(invoice.invoice.id).expect("delete");
    assert_eq!(balance(&world), Money::ZERO);
    assert!(billing.list_payments(&PaymentFilter::default()).is_empty());
    assert!(billing
        .list_invoices(&InvoiceFilter::default())
        .is_empty());
    world.hub.shipments().delete(shipment.id).expect("no longer invoiced");
}

#[test]
fn invoice_refuses_totals_past_the_cent_range() {
    let world = world();
    let catalog = world.hub.catalog();
    let zone = catalog
        .create_zone(ZoneDraft {
            name: "Offshore".to_string(),
            base_price: Money::from_cents(6_000_000_000_000_000_000),
        })
        .expect("zone");
    let rig = catalog
        .create_destination(DestinationDraft {
            city: "Rig".to_string(),
            country: "Algeria".to_string(),
            zone_id: zone.id,
            postal_code: String::new(),
        })
        .expect("destination");
    let flat = catalog
        .create_service_type(ServiceTypeDraft {
            name: "Flat".to_string(),
            weight_rate: Money::ZERO,
            volume_rate: Money::ZERO,
        })
        .expect("service type");

    let ship = || {
        let mut draft = world.parcel(world.client, 1.0, 1.0);
        draft.destination_id = rig.id;
        draft.service_type_id = flat.id;
        world
            .hub
            .shipments()
            .create(draft, world.agent.id)
            .expect("shipment within range")
    };
    let first = ship();
    let second = ship();

    let result = world.hub.billing().create_invoice(InvoiceDraft {
        client_id: world.client,
        shipment_ids: vec![first.id, second.id],
    });
    assert!(matches!(result, Err(DeliveryError::Validation(_))));
    assert_eq!(balance(&world), Money::ZERO);
    assert!(world
        .hub
        .billing()
        .list_invoices(&InvoiceFilter::default())
        .is_empty());
}

#[test]
fn invoices_list_in_creation_order() {
    let world = world();
    let billing = world.hub.billing();
    let mut created = Vec::new();
    for client in [world.client, world.other_client, world.client] {
        let shipment = world.ship(client);
        let invoice = billing
            .create_invoice(InvoiceDraft {
                client_id: client,
                shipment_ids: vec![shipment.id],
            })
            .expect("invoice");
        created.push(invoice.invoice.id);
    }

    let listed: Vec<_> = billing
        .list_invoices(&InvoiceFilter::default())
        .iter()
        .map(|view| view.invoice.id)
        .collect();
    assert_eq!(listed, created);

    let filtered: Vec<_> = billing
        .list_invoices(&InvoiceFilter {
            client_id: Some(world.client),
            ..InvoiceFilter::default()
        })
        .iter()
        .map(|view| view.invoice.id)
        .collect();
    assert_eq!(filtered, vec![created[0], created[2]]);
}
