use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::domain::{
    AssignmentStep, ClientChoice, ClientStep, ParcelDetails, ParcelStep, ServiceChoice,
    ServiceStep, WizardError, WizardSession, WizardStep, WizardView,
};
use crate::catalog::domain::require_text;
use crate::clock::Clock;
use crate::error::DeliveryError;
use crate::pricing::{self, PriceQuote};
use crate::shipments::service::register;
use crate::shipments::{Shipment, ShipmentDraft};
use crate::store::{Database, Schema};
use crate::users::UserId;

pub const MIN_WEIGHT_KG: f64 = 0.1;
pub const MIN_VOLUME_M3: f64 = 0.01;

/// In-memory wizard sessions keyed by their id.
#[derive(Debug, Default)]
pub struct WizardStore {
    sessions: Mutex<HashMap<Uuid, WizardSession>>,
}

impl WizardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, WizardSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, session: WizardSession) {
        self.lock().insert(session.id, session);
    }

    /// Returns a live session, dropping it first if it idled past `ttl`.
    fn live(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<WizardSession, WizardError> {
        let mut sessions = self.lock();
        match sessions.get(&id) {
            Some(session) if now - session.touched_at <= ttl => Ok(session.clone()),
            Some(_) => {
                sessions.remove(&id);
                debug!(session_id = %id, "wizard session expired");
                Err(WizardError::UnknownSession(id))
            }
            None => Err(WizardError::UnknownSession(id)),
        }
    }

    fn remove(&self, id: Uuid) -> Option<WizardSession> {
        self.lock().remove(&id)
    }

    fn purge_expired(&self, now: DateTime<Utc>, ttl: Duration) {
        self.lock()
            .retain(|_, session| now - session.touched_at <= ttl);
    }
}

/// Four-step guided shipment creation.
pub struct WizardService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
    store: &'a WizardStore,
    ttl: Duration,
}

impl<'a> WizardService<'a> {
    pub fn new(
        db: &'a Database,
        clock: &'a dyn Clock,
        store: &'a WizardStore,
        ttl: Duration,
    ) -> Self {
        Self {
            db,
            clock,
            store,
            ttl,
        }
    }

    pub fn start(&self) -> WizardView {
        let now = self.clock.now();
        self.store.purge_expired(now, self.ttl);
        let session = WizardSession::new(Uuid::new_v4(), now);
        let view = WizardView::of(&session, self.ttl);
        debug!(session_id = %session.id, "wizard session started");
        self.store.insert(session);
        view
    }

    pub fn get(&self, id: Uuid) -> Result<WizardView, DeliveryError> {
        let session = self.store.live(id, self.clock.now(), self.ttl)?;
        Ok(WizardView::of(&session, self.ttl))
    }

    /// Discards the session and everything collected in it.
    pub fn reset(&self, id: Uuid) -> Result<(), DeliveryError> {
        self.store.live(id, self.clock.now(), self.ttl)?;
        self.store.remove(id);
        debug!(session_id = %id, "wizard session reset");
        Ok(())
    }

    pub fn submit_client(&self, id: Uuid, step: ClientStep) -> Result<WizardView, DeliveryError> {
        let now = self.clock.now();
        let mut session = self.store.live(id, now, self.ttl)?;
        session.ensure_ready_for(WizardStep::Client)?;
        let client_name = self
            .db
            .read(|schema| schema.clients.require(step.client_id.0).map(|c| c.name.clone()))?;
        session.client = Some(ClientChoice {
            client_id: step.client_id,
            client_name,
        });
        self.save(session, WizardStep::Client, now)
    }

    pub fn submit_service(
        &self,
        id: Uuid,
        step: ServiceStep,
    ) -> Result<WizardView, DeliveryError> {
        let now = self.clock.now();
        let mut session = self.store.live(id, now, self.ttl)?;
        session.ensure_ready_for(WizardStep::Service)?;
        let (choice, quote) = self.db.read(|schema| {
            let service = schema.service_types.require(step.service_type_id.0)?;
            let destination = schema.destinations.require(step.destination_id.0)?;
            let choice = ServiceChoice {
                service_type_id: service.id,
                service_type_name: service.name.clone(),
                destination_id: destination.id,
                destination_label: destination.label(),
            };
            let quote = requote(schema, &choice, session.parcel.as_ref())?;
            Ok::<_, DeliveryError>((choice, quote))
        })?;
        session.service = Some(choice);
        if quote.is_some() {
            session.quote = quote;
        }
        self.save(session, WizardStep::Service, now)
    }

    pub fn submit_parcel(&self, id: Uuid, step: ParcelStep) -> Result<WizardView, DeliveryError> {
        let now = self.clock.now();
        let mut session = self.store.live(id, now, self.ttl)?;
        session.ensure_ready_for(WizardStep::Parcel)?;
        if !(step.weight_kg.is_finite() && step.weight_kg >= MIN_WEIGHT_KG) {
            return Err(DeliveryError::validation(format!(
                "weight_kg must be at least {MIN_WEIGHT_KG}"
            )));
        }
        if !(step.volume_m3.is_finite() && step.volume_m3 >= MIN_VOLUME_M3) {
            return Err(DeliveryError::validation(format!(
                "volume_m3 must be at least {MIN_VOLUME_M3}"
            )));
        }
        require_text("description", &step.description)?;

        let parcel = ParcelDetails {
            weight_kg: step.weight_kg,
            volume_m3: step.volume_m3,
            description: step.description.trim().to_string(),
            estimated_delivery_date: step.estimated_delivery_date,
        };
        let Some(choice) = session.service.clone() else {
            return Err(WizardError::StepOutOfOrder {
                expected: WizardStep::Service,
            }
            .into());
        };
        let quote = self
            .db
            .read(|schema| requote(schema, &choice, Some(&parcel)))?;
        session.parcel = Some(parcel);
        session.quote = quote;
        self.save(session, WizardStep::Parcel, now)
    }

    /// Creates the shipment from the collected data and closes the session.
    pub fn submit_assignment(
        &self,
        id: Uuid,
        step: AssignmentStep,
        created_by: UserId,
    ) -> Result<Shipment, DeliveryError> {
        let now = self.clock.now();
        let session = self.store.live(id, now, self.ttl)?;
        session.ensure_ready_for(WizardStep::Assignment)?;
        let (Some(client), Some(service), Some(parcel)) =
            (session.client, session.service, session.parcel)
        else {
            return Err(WizardError::StepOutOfOrder {
                expected: WizardStep::Client,
            }
            .into());
        };

        let draft = ShipmentDraft {
            client_id: client.client_id,
            service_type_id: service.service_type_id,
            destination_id: service.destination_id,
            tour_id: step.tour_id,
            weight_kg: parcel.weight_kg,
            volume_m3: parcel.volume_m3,
            description: parcel.description,
            estimated_delivery_date: Some(parcel.estimated_delivery_date),
        };
        let shipment = self
            .db
            .write(|schema| register(schema, draft, created_by, now))?;
        self.store.remove(id);
        info!(
            session_id = %id,
            shipment_id = shipment.id.0,
            tracking_number = %shipment.tracking_number,
            "wizard completed"
        );
        Ok(shipment)
    }

    fn save(
        &self,
        mut session: WizardSession,
        step: WizardStep,
        now: DateTime<Utc>,
    ) -> Result<WizardView, DeliveryError> {
        session.touched_at = now;
        let view = WizardView::of(&session, self.ttl);
        debug!(session_id = %session.id, step = step.number(), "wizard step recorded");
        self.store.insert(session);
        Ok(view)
    }
}

fn requote(
    schema: &Schema,
    choice: &ServiceChoice,
    parcel: Option<&ParcelDetails>,
) -> Result<Option<PriceQuote>, DeliveryError> {
    parcel
        .map(|parcel| {
            pricing::quote_for(
                schema,
                choice.service_type_id,
                choice.destination_id,
                parcel.weight_kg,
                parcel.volume_m3,
            )
        })
        .transpose()
}
