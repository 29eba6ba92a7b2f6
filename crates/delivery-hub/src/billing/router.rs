use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::domain::{
    InvoiceDraft, InvoiceFilter, InvoiceId, InvoiceView, Payment, PaymentDraft, PaymentFilter,
};
use crate::error::DeliveryError;
use crate::hub::DeliveryHub;

pub fn billing_routes() -> Router<DeliveryHub> {
    Router::new()
        .route("/api/v1/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/api/v1/invoices/:id",
            get(get_invoice).delete(delete_invoice),
        )
        .route("/api/v1/invoices/:id/payments", post(register_payment))
        .route("/api/v1/payments", get(list_payments))
}

async fn list_invoices(
    State(hub): State<DeliveryHub>,
    Query(filter): Query<InvoiceFilter>,
) -> Json<Vec<InvoiceView>> {
    Json(hub.billing().list_invoices(&filter))
}

async fn create_invoice(
    State(hub): State<DeliveryHub>,
    Json(draft): Json<InvoiceDraft>,
) -> Result<(StatusCode, Json<InvoiceView>), DeliveryError> {
    let invoice = hub.billing().create_invoice(draft)?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn get_invoice(
    State(hub): State<DeliveryHub>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<InvoiceView>, DeliveryError> {
    hub.billing().get(id).map(Json)
}

async fn delete_invoice(
    State(hub): State<DeliveryHub>,
    Path(id): Path<InvoiceId>,
) -> Result<StatusCode, DeliveryError> {
    hub.billing().delete_invoice(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn register_payment(
    State(hub): State<DeliveryHub>,
    Path(id): Path<InvoiceId>,
    Json(draft): Json<PaymentDraft>,
) -> Result<(StatusCode, Json<InvoiceView>), DeliveryError> {
    let invoice = hub.billing().register_payment(id, draft)?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn list_payments(
    State(hub): State<DeliveryHub>,
    Query(filter): Query<PaymentFilter>,
) -> Json<Vec<Payment>> {
    Json(hub.billing().list_payments(&filter))
}
