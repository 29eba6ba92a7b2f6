use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use super::domain::{
    AddShipment, CompletionReport, Tour, TourDetail, TourDraft, TourFilter, TourId, TourListing,
    TourPatch,
};
use super::journal::{JournalQuery, TourJournal};
use crate::error::DeliveryError;
use crate::export::CsvExport;
use crate::hub::DeliveryHub;
use crate::shipments::ShipmentId;

pub fn tour_routes() -> Router<DeliveryHub> {
    Router::new()
        .route("/api/v1/tours", get(list_tours).post(create_tour))
        .route("/api/v1/tours/journal", get(tour_journal))
        .route("/api/v1/tours/export", get(export_tours))
        .route(
            "/api/v1/tours/:id",
            get(get_tour).put(update_tour).delete(delete_tour),
        )
        .route("/api/v1/tours/:id/start", post(start_tour))
        .route("/api/v1/tours/:id/complete", post(complete_tour))
        .route("/api/v1/tours/:id/cancel", post(cancel_tour))
        .route("/api/v1/tours/:id/shipments", post(add_shipment))
        .route(
            "/api/v1/tours/:id/shipments/:shipment_id",
            delete(remove_shipment),
        )
}

async fn list_tours(
    State(hub): State<DeliveryHub>,
    Query(filter): Query<TourFilter>,
) -> Json<TourListing> {
    Json(hub.tours().list(&filter))
}

async fn create_tour(
    State(hub): State<DeliveryHub>,
    Json(draft): Json<TourDraft>,
) -> Result<(StatusCode, Json<Tour>), DeliveryError> {
    let tour = hub.tours().create(draft)?;
    Ok((StatusCode::CREATED, Json(tour)))
}

async fn get_tour(
    State(hub): State<DeliveryHub>,
    Path(id): Path<TourId>,
) -> Result<Json<TourDetail>, DeliveryError> {
    hub.tours().get(id).map(Json)
}

async fn update_tour(
    State(hub): State<DeliveryHub>,
    Path(id): Path<TourId>,
    Json(patch): Json<TourPatch>,
) -> Result<Json<Tour>, DeliveryError> {
    hub.tours().update(id, patch).map(Json)
}

async fn delete_tour(
    State(hub): State<DeliveryHub>,
    Path(id): Path<TourId>,
) -> Result<StatusCode, DeliveryError> {
    hub.tours().delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_tour(
    State(hub): State<DeliveryHub>,
    Path(id): Path<TourId>,
) -> Result<Json<TourDetail>, DeliveryError> {
    hub.tours().start(id).map(Json)
}

async fn complete_tour(
    State(hub): State<DeliveryHub>,
    Path(id): Path<TourId>,
    Json(report): Json<CompletionReport>,
) -> Result<Json<TourDetail>, DeliveryError> {
    hub.tours().complete(id, report).map(Json)
}

async fn cancel_tour(
    State(hub): State<DeliveryHub>,
    Path(id): Path<TourId>,
) -> Result<Json<Tour>, DeliveryError> {
    hub.tours().cancel(id).map(Json)
}

async fn add_shipment(
    State(hub): State<DeliveryHub>,
    Path(id): Path<TourId>,
    Json(body): Json<AddShipment>,
) -> Result<Json<TourDetail>, DeliveryError> {
    hub.tours().add_shipment(id, body.shipment_id).map(Json)
}

async fn remove_shipment(
    State(hub): State<DeliveryHub>,
    Path((id, shipment_id)): Path<(TourId, ShipmentId)>,
) -> Result<Json<TourDetail>, DeliveryError> {
    hub.tours().remove_shipment(id, shipment_id).map(Json)
}

async fn tour_journal(
    State(hub): State<DeliveryHub>,
    Query(query): Query<JournalQuery>,
) -> Json<TourJournal> {
    Json(hub.tours().journal(query.period))
}

async fn export_tours(State(hub): State<DeliveryHub>) -> Result<CsvExport, DeliveryError> {
    hub.tours().export()
}
