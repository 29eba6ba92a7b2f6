use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};

use super::{Actor, DashboardCounts, User, UserDraft, USER_HEADER};
use crate::error::DeliveryError;
use crate::hub::DeliveryHub;

pub fn user_routes() -> Router<DeliveryHub> {
    Router::new()
        .route("/api/v1/users", get(list_users).post(register_user))
        .route("/api/v1/dashboard", get(dashboard))
}

async fn list_users(State(hub): State<DeliveryHub>) -> Json<Vec<User>> {
    Json(hub.users().list())
}

async fn register_user(
    State(hub): State<DeliveryHub>,
    headers: HeaderMap,
    Json(draft): Json<UserDraft>,
) -> Result<(StatusCode, Json<User>), DeliveryError> {
    let users = hub.users();
    let header = headers.get(USER_HEADER).and_then(|value| value.to_str().ok());
    let caller = users.authenticate(header).ok();
    let user = users.enroll(caller.as_ref(), draft)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn dashboard(State(hub): State<DeliveryHub>, Actor(user): Actor) -> Json<DashboardCounts> {
    Json(hub.dashboard(&user))
}
