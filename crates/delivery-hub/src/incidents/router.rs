use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::domain::{
    CommentDraft, DocumentDraft, IncidentComment, IncidentDetail, IncidentDocument,
    IncidentDraft, IncidentFilter, IncidentId, IncidentListing, IncidentStatusChange,
};
use crate::error::DeliveryError;
use crate::hub::DeliveryHub;
use crate::users::Actor;

pub fn incident_routes() -> Router<DeliveryHub> {
    Router::new()
        .route("/api/v1/incidents", get(list_incidents).post(create_incident))
        .route("/api/v1/incidents/:id", get(get_incident))
        .route("/api/v1/incidents/:id/status", post(update_status))
        .route("/api/v1/incidents/:id/comments", post(add_comment))
        .route("/api/v1/incidents/:id/documents", post(add_document))
}

async fn list_incidents(
    State(hub): State<DeliveryHub>,
    Query(filter): Query<IncidentFilter>,
) -> Json<IncidentListing> {
    Json(hub.incidents().list(&filter))
}

async fn create_incident(
    State(hub): State<DeliveryHub>,
    Actor(user): Actor,
    Json(draft): Json<IncidentDraft>,
) -> Result<(StatusCode, Json<IncidentDetail>), DeliveryError> {
    let incident = hub.incidents().create(draft, user.id)?;
    Ok((StatusCode::CREATED, Json(incident)))
}

async fn get_incident(
    State(hub): State<DeliveryHub>,
    Path(id): Path<IncidentId>,
) -> Result<Json<IncidentDetail>, DeliveryError> {
    hub.incidents().get(id).map(Json)
}

async fn update_status(
    State(hub): State<DeliveryHub>,
    Path(id): Path<IncidentId>,
    Json(change): Json<IncidentStatusChange>,
) -> Result<Json<IncidentDetail>, DeliveryError> {
    hub.incidents().update_status(id, change).map(Json)
}

async fn add_comment(
    State(hub): State<DeliveryHub>,
    Path(id): Path<IncidentId>,
    Actor(user): Actor,
    Json(draft): Json<CommentDraft>,
) -> Result<(StatusCode, Json<IncidentComment>), DeliveryError> {
    let comment = hub.incidents().add_comment(id, user.id, draft)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn add_document(
    State(hub): State<DeliveryHub>,
    Path(id): Path<IncidentId>,
    Json(draft): Json<DocumentDraft>,
) -> Result<(StatusCode, Json<IncidentDocument>), DeliveryError> {
    let document = hub.incidents().add_document(id, draft)?;
    Ok((StatusCode::CREATED, Json(document)))
}
