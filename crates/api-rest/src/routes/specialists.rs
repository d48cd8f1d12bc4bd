//! Specialist catalog, symptom index, and the public symptom-match lookup.
//!
//! The whole surface is public, matching the original access policy for the
//! specialist catalog.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use medibook_core::repositories::specialists::{
    NewSpecialist, Specialist, SpecialistService, SymptomEntry, SymptomMatch, UpdateSpecialist,
};

use crate::error::RestResult;
use crate::AppState;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SymptomQuery {
    pub symptom: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct NewSymptom {
    pub symptom: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/symptom-match", get(symptom_match))
        .route("/specialists", get(list).post(create))
        .route(
            "/specialists/:id",
            get(get_one).put(update).delete(delete_one),
        )
        .route(
            "/specialists/:id/symptoms",
            get(list_symptoms).post(add_symptom),
        )
}

#[utoipa::path(
    get,
    path = "/symptom-match",
    params(SymptomQuery),
    responses(
        (status = 200, description = "Symptom-index entries whose keyword contains the query, case-insensitively; empty when the parameter is absent or nothing matches", body = [SymptomMatch])
    )
)]
/// Public symptom-to-specialist lookup.
pub async fn symptom_match(
    State(state): State<AppState>,
    Query(query): Query<SymptomQuery>,
) -> RestResult<Json<Vec<SymptomMatch>>> {
    let matches = SpecialistService::new(state.pool.clone())
        .match_symptom(query.symptom.as_deref())
        .await?;
    Ok(Json(matches))
}

#[utoipa::path(
    get,
    path = "/specialists",
    responses(
        (status = 200, description = "All specialists", body = [Specialist])
    )
)]
pub async fn list(State(state): State<AppState>) -> RestResult<Json<Vec<Specialist>>> {
    let specialists = SpecialistService::new(state.pool.clone()).list().await?;
    Ok(Json(specialists))
}

#[utoipa::path(
    post,
    path = "/specialists",
    request_body = NewSpecialist,
    responses(
        (status = 201, description = "Specialist created", body = Specialist),
        (status = 400, description = "Empty name")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<NewSpecialist>,
) -> RestResult<(StatusCode, Json<Specialist>)> {
    let specialist = SpecialistService::new(state.pool.clone()).create(req).await?;
    Ok((StatusCode::CREATED, Json(specialist)))
}

#[utoipa::path(
    get,
    path = "/specialists/{id}",
    responses(
        (status = 200, description = "Specialist", body = Specialist),
        (status = 404, description = "Specialist not found")
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> RestResult<Json<Specialist>> {
    let specialist = SpecialistService::new(state.pool.clone()).get(id).await?;
    Ok(Json(specialist))
}

#[utoipa::path(
    put,
    path = "/specialists/{id}",
    request_body = UpdateSpecialist,
    responses(
        (status = 200, description = "Specialist updated", body = Specialist),
        (status = 404, description = "Specialist not found")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSpecialist>,
) -> RestResult<Json<Specialist>> {
    let specialist = SpecialistService::new(state.pool.clone())
        .update(id, req)
        .await?;
    Ok(Json(specialist))
}

#[utoipa::path(
    delete,
    path = "/specialists/{id}",
    responses(
        (status = 204, description = "Specialist deleted; symptom entries cascade, doctors keep a null specialty"),
        (status = 404, description = "Specialist not found")
    )
)]
pub async fn delete_one(State(state): State<AppState>, Path(id): Path<i64>) -> RestResult<StatusCode> {
    SpecialistService::new(state.pool.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/specialists/{id}/symptoms",
    responses(
        (status = 200, description = "Symptom keywords indexed for this specialist", body = [SymptomEntry]),
        (status = 404, description = "Specialist not found")
    )
)]
pub async fn list_symptoms(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> RestResult<Json<Vec<SymptomEntry>>> {
    let entries = SpecialistService::new(state.pool.clone())
        .list_symptoms(id)
        .await?;
    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/specialists/{id}/symptoms",
    request_body = NewSymptom,
    responses(
        (status = 201, description = "Symptom keyword indexed", body = SymptomEntry),
        (status = 404, description = "Specialist not found")
    )
)]
pub async fn add_symptom(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewSymptom>,
) -> RestResult<(StatusCode, Json<SymptomEntry>)> {
    let entry = SpecialistService::new(state.pool.clone())
        .add_symptom(id, &req.symptom)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
