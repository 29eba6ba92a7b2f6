use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::domain::{
    ReclamationComment, ReclamationCommentDraft, ReclamationDetail, ReclamationDocument,
    ReclamationDocumentDraft, ReclamationDraft, ReclamationFilter, ReclamationId,
    ReclamationListing, ReclamationStats, ReclamationStatusChange, ReclamationTask,
    ReclamationTaskId, TaskDraft, TaskStatusChange,
};
use crate::error::DeliveryError;
use crate::hub::DeliveryHub;
use crate::users::Actor;

pub fn reclamation_routes() -> Router<DeliveryHub> {
    Router::new()
        .route(
            "/api/v1/reclamations",
            get(list_reclamations).post(create_reclamation),
        )
        .route("/api/v1/reclamations/stats", get(reclamation_stats))
        .route(
            "/api/v1/reclamations/:id",
            get(get_reclamation).put(update_reclamation),
        )
        .route("/api/v1/reclamations/:id/status", post(update_status))
        .route("/api/v1/reclamations/:id/comments", post(add_comment))
        .route("/api/v1/reclamations/:id/documents", post(add_document))
        .route("/api/v1/reclamations/:id/tasks", post(add_task))
        .route("/api/v1/reclamation-tasks/:id/status", post(update_task_status))
}

async fn list_reclamations(
    State(hub): State<DeliveryHub>,
    Query(filter): Query<ReclamationFilter>,
) -> Json<ReclamationListing> {
    Json(hub.reclamations().list(&filter))
}

async fn reclamation_stats(State(hub): State<DeliveryHub>) -> Json<ReclamationStats> {
    Json(hub.reclamations().stats())
}

async fn create_reclamation(
    State(hub): State<DeliveryHub>,
    Actor(user): Actor,
    Json(draft): Json<ReclamationDraft>,
) -> Result<(StatusCode, Json<ReclamationDetail>), DeliveryError> {
    let reclamation = hub.reclamations().create(draft, user.id)?;
    Ok((StatusCode::CREATED, Json(reclamation)))
}

async fn get_reclamation(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ReclamationId>,
) -> Result<Json<ReclamationDetail>, DeliveryError> {
    hub.reclamations().get(id).map(Json)
}

async fn update_reclamation(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ReclamationId>,
    Json(draft): Json<ReclamationDraft>,
) -> Result<Json<ReclamationDetail>, DeliveryError> {
    hub.reclamations().update(id, draft).map(Json)
}

async fn update_status(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ReclamationId>,
    Json(change): Json<ReclamationStatusChange>,
) -> Result<Json<ReclamationDetail>, DeliveryError> {
    hub.reclamations().update_status(id, change).map(Json)
}

async fn add_comment(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ReclamationId>,
    Actor(user): Actor,
    Json(draft): Json<ReclamationCommentDraft>,
) -> Result<(StatusCode, Json<ReclamationComment>), DeliveryError> {
    let comment = hub.reclamations().add_comment(id, user.id, draft)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn add_document(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ReclamationId>,
    Actor(user): Actor,
    Json(draft): Json<ReclamationDocumentDraft>,
) -> Result<(StatusCode, Json<ReclamationDocument>), DeliveryError> {
    let document = hub.reclamations().add_document(id, user.id, draft)?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn add_task(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ReclamationId>,
    Json(draft): Json<TaskDraft>,
) -> Result<(StatusCode, Json<ReclamationTask>), DeliveryError> {
    let task = hub.reclamations().add_task(id, draft)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task_status(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ReclamationTaskId>,
    Json(change): Json<TaskStatusChange>,
) -> Result<Json<ReclamationTask>, DeliveryError> {
    hub.reclamations().update_task_status(id, change).map(Json)
}
