use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::domain::{
    Shipment, ShipmentDraft, ShipmentFilter, ShipmentId, ShipmentPatch, StatusChange,
    StatusHistoryEntry, TrackingView,
};
use crate::catalog::ClientId;
use crate::error::DeliveryError;
use crate::export::CsvExport;
use crate::hub::DeliveryHub;
use crate::users::Actor;

pub fn shipment_routes() -> Router<DeliveryHub> {
    Router::new()
        .route("/api/v1/shipments", get(list_shipments).post(create_shipment))
        .route("/api/v1/shipments/export", get(export_shipments))
        .route(
            "/api/v1/shipments/:id",
            get(get_shipment).put(update_shipment).delete(delete_shipment),
        )
        .route("/api/v1/shipments/:id/status", post(change_status))
        .route("/api/v1/shipments/:id/history", get(shipment_history))
        .route("/api/v1/tracking/:tracking_number", get(track_shipment))
        .route("/api/v1/clients/:id/shipments", get(client_shipments))
}

async fn list_shipments(
    State(hub): State<DeliveryHub>,
    Query(filter): Query<ShipmentFilter>,
) -> Json<Vec<Shipment>> {
    Json(hub.shipments().list(&filter))
}

async fn create_shipment(
    State(hub): State<DeliveryHub>,
    Actor(user): Actor,
    Json(draft): Json<ShipmentDraft>,
) -> Result<(StatusCode, Json<Shipment>), DeliveryError> {
    let shipment = hub.shipments().create(draft, user.id)?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

async fn get_shipment(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ShipmentId>,
) -> Result<Json<Shipment>, DeliveryError> {
    hub.shipments().get(id).map(Json)
}

async fn update_shipment(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ShipmentId>,
    Json(patch): Json<ShipmentPatch>,
) -> Result<Json<Shipment>, DeliveryError> {
    hub.shipments().update(id, patch).map(Json)
}

async fn delete_shipment(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ShipmentId>,
) -> Result<StatusCode, DeliveryError> {
    hub.shipments().delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_status(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ShipmentId>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Shipment>, DeliveryError> {
    hub.shipments()
        .set_status(id, change.status, change.note)
        .map(Json)
}

async fn shipment_history(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ShipmentId>,
) -> Result<Json<Vec<StatusHistoryEntry>>, DeliveryError> {
    hub.shipments().history(id).map(Json)
}

async fn track_shipment(
    State(hub): State<DeliveryHub>,
    Path(tracking_number): Path<String>,
) -> Result<Json<TrackingView>, DeliveryError> {
    hub.shipments().track(&tracking_number).map(Json)
}

async fn client_shipments(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ClientId>,
) -> Result<Json<Vec<Shipment>>, DeliveryError> {
    hub.shipments().client_shipments(id).map(Json)
}

async fn export_shipments(State(hub): State<DeliveryHub>) -> Result<CsvExport, DeliveryError> {
    hub.shipments().export()
}
