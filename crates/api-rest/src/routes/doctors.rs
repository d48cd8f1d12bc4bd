//! Doctor resource: public discovery plus admin-only CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use utoipa::IntoParams;

use medibook_core::repositories::doctors::{
    Doctor, DoctorDetail, DoctorService, NewDoctor, UpdateDoctor,
};

use crate::error::RestResult;
use crate::extract::AuthUser;
use crate::AppState;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SpecialtyQuery {
    pub specialty: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/doctors/by-specialty", get(by_specialty))
        .route("/doctors", get(list).post(create))
        .route("/doctors/:id", get(get_one).put(update).delete(delete_one))
}

#[utoipa::path(
    get,
    path = "/doctors/by-specialty",
    params(SpecialtyQuery),
    responses(
        (status = 200, description = "Doctors, optionally filtered by specialty name", body = [DoctorDetail])
    )
)]
/// Public doctor discovery. The filter is a case-insensitive exact match on
/// specialty name; an absent filter returns every doctor.
pub async fn by_specialty(
    State(state): State<AppState>,
    Query(query): Query<SpecialtyQuery>,
) -> RestResult<Json<Vec<DoctorDetail>>> {
    let doctors = DoctorService::new(state.pool.clone())
        .list_detailed(query.specialty.as_deref())
        .await?;
    Ok(Json(doctors))
}

#[utoipa::path(
    get,
    path = "/doctors",
    responses(
        (status = 200, description = "All doctors", body = [DoctorDetail]),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> RestResult<Json<Vec<DoctorDetail>>> {
    auth.require_admin()?;
    let doctors = DoctorService::new(state.pool.clone())
        .list_detailed(None)
        .await?;
    Ok(Json(doctors))
}

#[utoipa::path(
    post,
    path = "/doctors",
    request_body = NewDoctor,
    responses(
        (status = 201, description = "Doctor created", body = Doctor),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User or specialist not found"),
        (status = 409, description = "User already has a doctor profile")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewDoctor>,
) -> RestResult<(StatusCode, Json<Doctor>)> {
    auth.require_admin()?;
    let doctor = DoctorService::new(state.pool.clone()).create(req).await?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}",
    responses(
        (status = 200, description = "Doctor detail", body = DoctorDetail),
        (status = 404, description = "Doctor not found")
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> RestResult<Json<DoctorDetail>> {
    auth.require_admin()?;
    let doctor = DoctorService::new(state.pool.clone()).get_detailed(id).await?;
    Ok(Json(doctor))
}

#[utoipa::path(
    put,
    path = "/doctors/{id}",
    request_body = UpdateDoctor,
    responses(
        (status = 200, description = "Doctor updated", body = Doctor),
        (status = 404, description = "Doctor not found")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateDoctor>,
) -> RestResult<Json<Doctor>> {
    auth.require_admin()?;
    let doctor = DoctorService::new(state.pool.clone()).update(id, req).await?;
    Ok(Json(doctor))
}

#[utoipa::path(
    delete,
    path = "/doctors/{id}",
    responses(
        (status = 204, description = "Doctor deleted; appointments and payments cascade"),
        (status = 404, description = "Doctor not found")
    )
)]
pub async fn delete_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> RestResult<StatusCode> {
    auth.require_admin()?;
    DoctorService::new(state.pool.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
