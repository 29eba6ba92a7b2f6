use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use super::domain::{AssignmentStep, ClientStep, ParcelStep, ServiceStep, WizardView};
use crate::error::DeliveryError;
use crate::hub::DeliveryHub;
use crate::shipments::Shipment;
use crate::users::Actor;

pub fn wizard_routes() -> Router<DeliveryHub> {
    Router::new()
        .route("/api/v1/wizard", post(start_wizard))
        .route(
            "/api/v1/wizard/:session",
            get(get_wizard).delete(reset_wizard),
        )
        .route("/api/v1/wizard/:session/client", post(submit_client))
        .route("/api/v1/wizard/:session/service", post(submit_service))
        .route("/api/v1/wizard/:session/parcel", post(submit_parcel))
        .route("/api/v1/wizard/:session/assignment", post(submit_assignment))
}

async fn start_wizard(State(hub): State<DeliveryHub>) -> (StatusCode, Json<WizardView>) {
    (StatusCode::CREATED, Json(hub.wizard().start()))
}

async fn get_wizard(
    State(hub): State<DeliveryHub>,
    Path(session): Path<Uuid>,
) -> Result<Json<WizardView>, DeliveryError> {
    hub.wizard().get(session).map(Json)
}

async fn reset_wizard(
    State(hub): State<DeliveryHub>,
    Path(session): Path<Uuid>,
) -> Result<StatusCode, DeliveryError> {
    hub.wizard().reset(session)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_client(
    State(hub): State<DeliveryHub>,
    Path(session): Path<Uuid>,
    Json(step): Json<ClientStep>,
) -> Result<Json<WizardView>, DeliveryError> {
    hub.wizard().submit_client(session, step).map(Json)
}

async fn submit_service(
    State(hub): State<DeliveryHub>,
    Path(session): Path<Uuid>,
    Json(step): Json<ServiceStep>,
) -> Result<Json<WizardView>, DeliveryError> {
    hub.wizard().submit_service(session, step).map(Json)
}

async fn submit_parcel(
    State(hub): State<DeliveryHub>,
    Path(session): Path<Uuid>,
    Json(step): Json<ParcelStep>,
) -> Result<Json<WizardView>, DeliveryError> {
    hub.wizard().submit_parcel(session, step).map(Json)
}

async fn submit_assignment(
    State(hub): State<DeliveryHub>,
    Path(session): Path<Uuid>,
    Actor(user): Actor,
    Json(step): Json<AssignmentStep>,
) -> Result<(StatusCode, Json<Shipment>), DeliveryError> {
    let shipment = hub.wizard().submit_assignment(session, step, user.id)?;
    Ok((StatusCode::CREATED, Json(shipment)))
}
