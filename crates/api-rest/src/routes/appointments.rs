//! Appointment resource: booking, the caller's own list, and authenticated
//! CRUD.
//!
//! Both create paths resolve the patient from the authenticated identity;
//! a caller can never book on another patient's behalf.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;

use medibook_core::repositories::appointments::{
    Appointment, AppointmentService, BookAppointment, UpdateAppointment,
};

use crate::error::RestResult;
use crate::extract::AuthUser;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments/book", post(book))
        .route("/appointments/my", get(my))
        .route("/appointments", get(list).post(create))
        .route(
            "/appointments/:id",
            get(get_one).put(update).delete(delete_one),
        )
}

#[utoipa::path(
    post,
    path = "/appointments/book",
    request_body = BookAppointment,
    responses(
        (status = 201, description = "Appointment booked with status 'pending'", body = Appointment),
        (status = 403, description = "Caller has no patient profile"),
        (status = 404, description = "Doctor not found")
    )
)]
/// Books an appointment for the caller's own patient profile.
pub async fn book(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<BookAppointment>,
) -> RestResult<(StatusCode, Json<Appointment>)> {
    let appointment = AppointmentService::new(state.pool.clone())
        .book_for_user(auth.user.id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[utoipa::path(
    get,
    path = "/appointments/my",
    responses(
        (status = 200, description = "Caller's appointments, date-descending; empty without a patient profile", body = [Appointment]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn my(State(state): State<AppState>, auth: AuthUser) -> RestResult<Json<Vec<Appointment>>> {
    let appointments = AppointmentService::new(state.pool.clone())
        .list_for_user(auth.user.id)
        .await?;
    Ok(Json(appointments))
}

#[utoipa::path(
    get,
    path = "/appointments",
    responses(
        (status = 200, description = "All appointments", body = [Appointment])
    )
)]
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> RestResult<Json<Vec<Appointment>>> {
    let appointments = AppointmentService::new(state.pool.clone()).list().await?;
    Ok(Json(appointments))
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = BookAppointment,
    responses(
        (status = 201, description = "Appointment created for the caller's patient profile", body = Appointment),
        (status = 403, description = "Caller has no patient profile")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<BookAppointment>,
) -> RestResult<(StatusCode, Json<Appointment>)> {
    // Same server-side patient resolution as /appointments/book.
    let appointment = AppointmentService::new(state.pool.clone())
        .book_for_user(auth.user.id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    responses(
        (status = 200, description = "Appointment", body = Appointment),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> RestResult<Json<Appointment>> {
    let appointment = AppointmentService::new(state.pool.clone()).get(id).await?;
    Ok(Json(appointment))
}

#[utoipa::path(
    put,
    path = "/appointments/{id}",
    request_body = UpdateAppointment,
    responses(
        (status = 200, description = "Appointment updated", body = Appointment),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAppointment>,
) -> RestResult<Json<Appointment>> {
    let appointment = AppointmentService::new(state.pool.clone())
        .update(id, req)
        .await?;
    Ok(Json(appointment))
}

#[utoipa::path(
    delete,
    path = "/appointments/{id}",
    responses(
        (status = 204, description = "Appointment deleted; payment cascades"),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn delete_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> RestResult<StatusCode> {
    AppointmentService::new(state.pool.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
