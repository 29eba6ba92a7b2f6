//! Shared application state and the combined HTTP router.

use std::sync::Arc;

use axum::Router;

use crate::billing::{billing_routes, BillingService};
use crate::catalog::{catalog_routes, CatalogService};
use crate::clock::{Clock, SystemClock};
use crate::config::{BillingConfig, WizardConfig};
use crate::incidents::{incident_routes, AlertPublisher, IncidentService, LogAlertPublisher};
use crate::pricing::pricing_routes;
use crate::reclamations::{reclamation_routes, ReclamationService};
use crate::shipments::{shipment_routes, ShipmentService};
use crate::store::Database;
use crate::tours::{tour_routes, TourService};
use crate::users::{dashboard, user_routes, DashboardCounts, User, UserService};
use crate::wizard::{wizard_routes, WizardService, WizardStore};

/// Cheap to clone; every clone shares the same database and sessions.
#[derive(Clone)]
pub struct DeliveryHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    db: Database,
    clock: Arc<dyn Clock>,
    alerts: Arc<dyn AlertPublisher>,
    wizard: WizardStore,
    billing: BillingConfig,
    wizard_config: WizardConfig,
}

impl DeliveryHub {
    pub fn builder() -> DeliveryHubBuilder {
        DeliveryHubBuilder::default()
    }

    pub fn database(&self) -> &Database {
        &self.inner.db
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(&self.inner.db, self.clock())
    }

    pub fn shipments(&self) -> ShipmentService<'_> {
        ShipmentService::new(&self.inner.db, self.clock())
    }

    pub fn tours(&self) -> TourService<'_> {
        TourService::new(&self.inner.db, self.clock())
    }

    pub fn wizard(&self) -> WizardService<'_> {
        WizardService::new(
            &self.inner.db,
            self.clock(),
            &self.inner.wizard,
            self.inner.wizard_config.ttl(),
        )
    }

    pub fn billing(&self) -> BillingService<'_> {
        BillingService::new(&self.inner.db, self.clock(), self.inner.billing.vat_percent)
    }

    pub fn incidents(&self) -> IncidentService<'_> {
        IncidentService::new(&self.inner.db, self.clock(), self.inner.alerts.as_ref())
    }

    pub fn reclamations(&self) -> ReclamationService<'_> {
        ReclamationService::new(&self.inner.db, self.clock())
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(&self.inner.db, self.clock())
    }

    pub fn dashboard(&self, actor: &User) -> DashboardCounts {
        dashboard::dashboard(&self.inner.db, actor)
    }
}

pub struct DeliveryHubBuilder {
    clock: Arc<dyn Clock>,
    alerts: Arc<dyn AlertPublisher>,
    billing: BillingConfig,
    wizard: WizardConfig,
}

impl Default for DeliveryHubBuilder {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            alerts: Arc::new(LogAlertPublisher),
            billing: BillingConfig::default(),
            wizard: WizardConfig::default(),
        }
    }
}

impl DeliveryHubBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn alerts(mut self, alerts: Arc<dyn AlertPublisher>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn billing(mut self, billing: BillingConfig) -> Self {
        self.billing = billing;
        self
    }

    pub fn wizard(mut self, wizard: WizardConfig) -> Self {
        self.wizard = wizard;
        self
    }

    pub fn build(self) -> DeliveryHub {
        DeliveryHub {
            inner: Arc::new(HubInner {
                db: Database::new(),
                clock: self.clock,
                alerts: self.alerts,
                wizard: WizardStore::new(),
                billing: self.billing,
                wizard_config: self.wizard,
            }),
        }
    }
}

/// Every `/api/v1` route, bound to the hub.
pub fn delivery_router(hub: DeliveryHub) -> Router {
    Router::new()
        .merge(catalog_routes())
        .merge(pricing_routes())
        .merge(shipment_routes())
        .merge(wizard_routes())
        .merge(tour_routes())
        .merge(billing_routes())
        .merge(incident_routes())
        .merge(reclamation_routes())
        .merge(user_routes())
        .with_state(hub)
}
