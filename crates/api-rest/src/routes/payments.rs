//! Payment resource: authenticated CRUD over the ledger.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;

use medibook_core::repositories::payments::{NewPayment, Payment, PaymentService, UpdatePayment};

use crate::error::RestResult;
use crate::extract::AuthUser;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list).post(create))
        .route("/payments/:id", get(get_one).put(update).delete(delete_one))
}

#[utoipa::path(
    get,
    path = "/payments",
    responses(
        (status = 200, description = "All payments", body = [Payment]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list(State(state): State<AppState>, _auth: AuthUser) -> RestResult<Json<Vec<Payment>>> {
    let payments = PaymentService::new(state.pool.clone()).list().await?;
    Ok(Json(payments))
}

#[utoipa::path(
    post,
    path = "/payments",
    request_body = NewPayment,
    responses(
        (status = 201, description = "Payment recorded", body = Payment),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Duplicate transaction id or appointment already paid")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<NewPayment>,
) -> RestResult<(StatusCode, Json<Payment>)> {
    let payment = PaymentService::new(state.pool.clone()).create(req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/payments/{id}",
    responses(
        (status = 200, description = "Payment", body = Payment),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> RestResult<Json<Payment>> {
    let payment = PaymentService::new(state.pool.clone()).get(id).await?;
    Ok(Json(payment))
}

#[utoipa::path(
    put,
    path = "/payments/{id}",
    request_body = UpdatePayment,
    responses(
        (status = 200, description = "Payment updated", body = Payment),
        (status = 404, description = "Payment not found"),
        (status = 409, description = "Duplicate transaction id")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePayment>,
) -> RestResult<Json<Payment>> {
    let payment = PaymentService::new(state.pool.clone()).update(id, req).await?;
    Ok(Json(payment))
}

#[utoipa::path(
    delete,
    path = "/payments/{id}",
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn delete_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> RestResult<StatusCode> {
    PaymentService::new(state.pool.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
