mod common;

use std::sync::{Arc, Mutex};

use common::{world, world_with};
use delivery_hub::billing::InvoiceDraft;
use delivery_hub::error::DeliveryError;
use delivery_hub::incidents::{
    AlertError, AlertPublisher, IncidentAlert, IncidentDraft, IncidentFilter, IncidentPriority,
    IncidentStatus, IncidentStatusChange, IncidentType,
};
use delivery_hub::reclamations::{
    ReclamationDraft, ReclamationKind, ReclamationPriority, ReclamationStatus,
    ReclamationStatusChange,
};
use delivery_hub::shipments::{ShipmentId, ShipmentPatch};

#[derive(Default)]
struct RecordingAlerts {
    sent: Mutex<Vec<IncidentAlert>>,
}

impl AlertPublisher for RecordingAlerts {
    fn publish(&self, alert: IncidentAlert) -> Result<(), AlertError> {
        self.sent.lock().unwrap().push(alert);
        Ok(())
    }
}

struct BrokenAlerts;

impl AlertPublisher for BrokenAlerts {
    fn publish(&self, _alert: IncidentAlert) -> Result<(), AlertError> {
        Err(AlertError::Transport("smtp relay down".to_string()))
    }
}

fn incident(shipment: ShipmentId, priority: IncidentPriority) -> IncidentDraft {
    IncidentDraft {
        shipment_id: Some(shipment),
        tour_id: None,
        incident_type: IncidentType::Damage,
        priority,
        description: "Box crushed at the depot".to_string(),
        assigned_to: None,
    }
}

#[test]
fn urgent_incidents_raise_alerts() {
    let alerts = Arc::new(RecordingAlerts::default());
    let world = world_with(Some(alerts.clone()));
    let shipment = world.ship(world.client);
    let incidents = world.hub.incidents();

    let quiet = incidents
        .create(incident(shipment.id, IncidentPriority::Low), world.agent.id)
        .expect("low");
    assert!(!quiet.incident.alert_sent);

    let loud = incidents
        .create(incident(shipment.id, IncidentPriority::Critical), world.agent.id)
        .expect("critical");
    assert!(loud.incident.alert_sent);

    let sent = alerts.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].details.get("tracking_number"),
        Some(&shipment.tracking_number)
    );
}

#[test]
fn failed_dispatch_keeps_the_incident() {
    let world = world_with(Some(Arc::new(BrokenAlerts)));
    let shipment = world.ship(world.client);
    let created = world
        .hub
        .incidents()
        .create(incident(shipment.id, IncidentPriority::High), world.agent.id)
        .expect("incident recorded");
    assert!(!created.incident.alert_sent);
    assert_eq!(created.incident.status, IncidentStatus::Open);
}

#[test]
fn incidents_need_a_subject_and_track_resolution() {
    let world = world();
    let incidents = world.hub.incidents();
    let orphan = incidents.create(
        IncidentDraft {
            shipment_id: None,
            ..incident(ShipmentId(1), IncidentPriority::Low)
        },
        world.agent.id,
    );
    assert!(matches!(orphan, Err(DeliveryError::Validation(_))));

    let shipment = world.ship(world.client);
    let created = incidents
        .create(incident(shipment.id, IncidentPriority::Medium), world.agent.id)
        .expect("incident");
    let resolved = incidents
        .update_status(
            created.incident.id,
            IncidentStatusChange {
                status: IncidentStatus::Resolved,
                resolution: Some("Refunded".to_string()),
                assigned_to: Some(world.admin.id),
            },
        )
        .expect("resolve");
    assert!(resolved.incident.resolved_at.is_some());
    assert_eq!(resolved.incident.assigned_to, Some(world.admin.id));

    let reopened = incidents
        .update_status(
            created.incident.id,
            IncidentStatusChange {
                status: IncidentStatus::InProgress,
                resolution: None,
                assigned_to: None,
            },
        )
        .expect("reopen");
    assert!(reopened.incident.resolved_at.is_none());

    let listing = incidents.list(&IncidentFilter {
        status: Some(IncidentStatus::Open),
        ..IncidentFilter::default()
    });
    assert!(listing.incidents.is_empty());
    assert_eq!(listing.stats.in_progress, 1);

    assert!(matches!(
        world.hub.shipments().delete(shipment.id),
        Err(DeliveryError::Conflict(_))
    ));
}

fn complaint(world: &common::World, shipments: Vec<ShipmentId>) -> ReclamationDraft {
    ReclamationDraft {
        client_id: world.client,
        kind: ReclamationKind::DeliveryDelay,
        description: "Two days late".to_string(),
        shipment_ids: shipments,
        invoice_id: None,
        priority: ReclamationPriority::Urgent,
        assigned_to: Some(world.admin.id),
    }
}

#[test]
fn reclamations_only_link_the_clients_own_records() {
    let world = world();
    let foreign = world.ship(world.other_client);
    let result = world
        .hub
        .reclamations()
        .create(complaint(&world, vec![foreign.id]), world.agent.id);
    assert!(matches!(result, Err(DeliveryError::Validation(_))));

    let foreign_invoice = world
        .hub
        .billing()
        .create_invoice(InvoiceDraft {
            client_id: world.other_client,
            shipment_ids: vec![foreign.id],
        })
        .expect("invoice");
    let mut draft = complaint(&world, Vec::new());
    draft.invoice_id = Some(foreign_invoice.invoice.id);
    assert!(matches!(
        world.hub.reclamations().create(draft, world.agent.id),
        Err(DeliveryError::Validation(_))
    ));
}

#[test]
fn shipment_named_in_a_reclamation_keeps_its_client() {
    let world = world();
    let shipment = world.ship(world.client);
    world
        .hub
        .reclamations()
        .create(complaint(&world, vec![shipment.id]), world.agent.id)
        .expect("filed");

    let shipments = world.hub.shipments();
    let moved = shipments.update(
        shipment.id,
        ShipmentPatch {
            client_id: Some(world.other_client),
            ..ShipmentPatch::default()
        },
    );
    assert!(matches!(moved, Err(DeliveryError::Conflict(_))));
    assert_eq!(
        shipments.get(shipment.id).expect("shipment").client_id,
        world.client
    );

    let reworded = shipments
        .update(
            shipment.id,
            ShipmentPatch {
                description: Some("Spare parts, two boxes".to_string()),
                ..ShipmentPatch::default()
            },
        )
        .expect("other edits stay allowed");
    assert_eq!(reworded.client_id, world.client);
}

#[test]
fn deleting_linked_records_unlinks_reclamations() {
    let world = world();
    let shipment = world.ship(world.client);
    let billed = world.ship(world.client);
    let invoice = world
        .hub
        .billing()
        .create_invoice(InvoiceDraft {
            client_id: world.client,
            shipment_ids: vec![billed.id],
        })
        .expect("invoice");
    let mut draft = complaint(&world, vec![shipment.id, billed.id]);
    draft.invoice_id = Some(invoice.invoice.id);
    let reclamations = world.hub.reclamations();
    let filed = reclamations.create(draft, world.agent.id).expect("filed");

    world.hub.shipments().delete(shipment.id).expect("delete");
    world
        .hub
        .billing()
        .delete_invoice(invoice.invoice.id)
        .expect("delete invoice");

    let detail = reclamations.get(filed.reclamation.id).expect("detail");
    assert_eq!(detail.reclamation.shipment_ids, vec![billed.id]);
    assert_eq!(detail.reclamation.invoice_id, None);
}

#[test]
fn reclamation_stats_count_resolution_in_whole_days() {
    let world = world();
    let reclamations = world.hub.reclamations();
    let filed = reclamations
        .create(complaint(&world, Vec::new()), world.agent.id)
        .expect("filed");
    world.clock.advance(chrono::Duration::hours(80));
    reclamations
        .update_status(
            filed.reclamation.id,
            ReclamationStatusChange {
                status: ReclamationStatus::Resolved,
                resolution: Some("Compensation voucher".to_string()),
            },
        )
        .expect("resolved");

    let stats = reclamations.stats();
    assert_eq!(stats.counts.resolved, 1);
    assert_eq!(stats.average_resolution_days, Some(3.0));
    assert_eq!(stats.by_month[0].month, "2025-06");
    assert_eq!(stats.top_kinds[0].kind, ReclamationKind::DeliveryDelay);
}
