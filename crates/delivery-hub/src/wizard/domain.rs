use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{ClientId, DestinationId, ServiceTypeId};
use crate::pricing::PriceQuote;
use crate::tours::TourId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Client,
    Service,
    Parcel,
    Assignment,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        Self::Client,
        Self::Service,
        Self::Parcel,
        Self::Assignment,
    ];

    pub const fn number(self) -> u8 {
        match self {
            Self::Client => 1,
            Self::Service => 2,
            Self::Parcel => 3,
            Self::Assignment => 4,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Client => "Client selection",
            Self::Service => "Service and destination",
            Self::Parcel => "Parcel details",
            Self::Assignment => "Tour assignment",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("wizard session {0} is unknown or expired")]
    UnknownSession(Uuid),
    #[error("{expected} must be completed first")]
    StepOutOfOrder { expected: WizardStep },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientChoice {
    pub client_id: ClientId,
    pub client_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceChoice {
    pub service_type_id: ServiceTypeId,
    pub service_type_name: String,
    pub destination_id: DestinationId,
    pub destination_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelDetails {
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub description: String,
    pub estimated_delivery_date: NaiveDate,
}

/// Data collected so far for one shipment being created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardSession {
    pub id: Uuid,
    pub client: Option<ClientChoice>,
    pub service: Option<ServiceChoice>,
    pub parcel: Option<ParcelDetails>,
    pub quote: Option<PriceQuote>,
    pub created_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
}

impl WizardSession {
    pub fn new(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            client: None,
            service: None,
            parcel: None,
            quote: None,
            created_at: now,
            touched_at: now,
        }
    }

    /// First step still missing data.
    pub fn current_step(&self) -> WizardStep {
        if self.client.is_none() {
            WizardStep::Client
        } else if self.service.is_none() {
            WizardStep::Service
        } else if self.parcel.is_none() {
            WizardStep::Parcel
        } else {
            WizardStep::Assignment
        }
    }

    /// Fails unless every step before `step` is complete.
    pub fn ensure_ready_for(&self, step: WizardStep) -> Result<(), WizardError> {
        let expected = self.current_step();
        if expected < step {
            Err(WizardError::StepOutOfOrder { expected })
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientStep {
    pub client_id: ClientId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceStep {
    pub service_type_id: ServiceTypeId,
    pub destination_id: DestinationId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParcelStep {
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub description: String,
    pub estimated_delivery_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentStep {
    #[serde(default)]
    pub tour_id: Option<TourId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepTitle {
    pub number: u8,
    pub title: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub session_id: Uuid,
    pub current_step: u8,
    pub total_steps: usize,
    pub step_titles: Vec<StepTitle>,
    pub client: Option<ClientChoice>,
    pub service: Option<ServiceChoice>,
    pub parcel: Option<ParcelDetails>,
    pub quote: Option<PriceQuote>,
    pub expires_at: DateTime<Utc>,
}

impl WizardView {
    pub fn of(session: &WizardSession, ttl: chrono::Duration) -> Self {
        Self {
            session_id: session.id,
            current_step: session.current_step().number(),
            total_steps: WizardStep::ALL.len(),
            step_titles: WizardStep::ALL
                .iter()
                .map(|step| StepTitle {
                    number: step.number(),
                    title: step.title(),
                })
                .collect(),
            client: session.client.clone(),
            service: session.service.clone(),
            parcel: session.parcel.clone(),
            quote: session.quote,
            expires_at: session.touched_at + ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_must_follow_in_order() {
        let mut session = WizardSession::new(Uuid::new_v4(), Utc::now());
        assert_eq!(session.current_step(), WizardStep::Client);
        assert!(session.ensure_ready_for(WizardStep::Client).is_ok());
        match session.ensure_ready_for(WizardStep::Parcel) {
            Err(WizardError::StepOutOfOrder { expected }) => {
                assert_eq!(expected, WizardStep::Client)
            }
            other => panic!("expected out of order, got {other:?}"),
        }

        session.client = Some(ClientChoice {
            client_id: ClientId(1),
            client_name: "Atlas".to_string(),
        });
        assert_eq!(session.current_step(), WizardStep::Service);
        assert!(session.ensure_ready_for(WizardStep::Client).is_ok());
        assert!(session.ensure_ready_for(WizardStep::Service).is_ok());
        assert!(session.ensure_ready_for(WizardStep::Assignment).is_err());
    }

    #[test]
    fn out_of_order_message_names_the_missing_step() {
        let error = WizardError::StepOutOfOrder {
            expected: WizardStep::Service,
        };
        assert_eq!(
            error.to_string(),
            "step 2 (Service and destination) must be completed first"
        );
    }
}
