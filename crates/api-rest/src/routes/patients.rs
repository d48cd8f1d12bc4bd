//! Patient resource: authenticated CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;

use medibook_core::repositories::patients::{NewPatient, Patient, PatientService, UpdatePatient};

use crate::error::RestResult;
use crate::extract::AuthUser;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list).post(create))
        .route("/patients/:id", get(get_one).put(update).delete(delete_one))
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patient profiles", body = [Patient]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list(State(state): State<AppState>, _auth: AuthUser) -> RestResult<Json<Vec<Patient>>> {
    let patients = PatientService::new(state.pool.clone()).list().await?;
    Ok(Json(patients))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = NewPatient,
    responses(
        (status = 201, description = "Patient profile created", body = Patient),
        (status = 404, description = "User not found"),
        (status = 409, description = "User already has a patient profile")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<NewPatient>,
) -> RestResult<(StatusCode, Json<Patient>)> {
    let patient = PatientService::new(state.pool.clone()).create(req).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    responses(
        (status = 200, description = "Patient profile", body = Patient),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> RestResult<Json<Patient>> {
    let patient = PatientService::new(state.pool.clone()).get(id).await?;
    Ok(Json(patient))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    request_body = UpdatePatient,
    responses(
        (status = 200, description = "Patient updated", body = Patient),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePatient>,
) -> RestResult<Json<Patient>> {
    let patient = PatientService::new(state.pool.clone()).update(id, req).await?;
    Ok(Json(patient))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    responses(
        (status = 204, description = "Patient deleted; appointments cascade"),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn delete_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> RestResult<StatusCode> {
    PatientService::new(state.pool.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
