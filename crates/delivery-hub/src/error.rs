use crate::config::ConfigError;
use crate::shipments::ShipmentStatus;
use crate::telemetry::TelemetryError;
use crate::wizard::WizardError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Failure raised by the delivery services and their HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("no shipment with tracking number {0}")]
    UnknownTracking(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("shipment cannot move from {from} to {to}")]
    InvalidTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },
    #[error("tour state: {0}")]
    TourState(String),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("missing or unknown x-user-id header")]
    Unauthorized,
    #[error("operation not permitted for this user")]
    Forbidden,
    #[error("csv export failed: {0}")]
    Export(#[from] csv::Error),
}

impl DeliveryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// A monetary computation left the representable range.
    pub fn amount_out_of_range() -> Self {
        Self::Validation("amount out of range".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DeliveryError::NotFound { .. } | DeliveryError::UnknownTracking(_) => {
                StatusCode::NOT_FOUND
            }
            DeliveryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DeliveryError::Conflict(_)
            | DeliveryError::InvalidTransition { .. }
            | DeliveryError::TourState(_) => StatusCode::CONFLICT,
            DeliveryError::Wizard(WizardError::UnknownSession(_)) => StatusCode::NOT_FOUND,
            DeliveryError::Wizard(_) => StatusCode::BAD_REQUEST,
            DeliveryError::Unauthorized => StatusCode::UNAUTHORIZED,
            DeliveryError::Forbidden => StatusCode::FORBIDDEN,
            DeliveryError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DeliveryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            DeliveryError::Wizard(WizardError::StepOutOfOrder { expected }) => json!({
                "error": self.to_string(),
                "expected_step": expected.number(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Delivery(DeliveryError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Delivery(err) => write!(f, "delivery error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Delivery(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Delivery(err) => err.into_response(),
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<DeliveryError> for AppError {
    fn from(value: DeliveryError) -> Self {
        Self::Delivery(value)
    }
}
