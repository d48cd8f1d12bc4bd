//! # API REST
//!
//! REST API implementation for medibook.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Bearer-token authentication of requests
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! Uses `medibook-core` for all domain and data operations.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use medibook_core::repositories::accounts::{NewAccount, Profile, User};
use medibook_core::repositories::appointments::{Appointment, BookAppointment, UpdateAppointment};
use medibook_core::repositories::doctors::{Doctor, DoctorDetail, NewDoctor, UpdateDoctor};
use medibook_core::repositories::patients::{NewPatient, Patient, UpdatePatient};
use medibook_core::repositories::payments::{NewPayment, Payment, PaymentMethod, UpdatePayment};
use medibook_core::repositories::specialists::{
    NewSpecialist, Specialist, SymptomEntry, SymptomMatch, UpdateSpecialist,
};
use medibook_core::{CoreConfig, Role};

/// Application state shared across REST API handlers.
///
/// Holds the startup-resolved configuration and the database pool; request
/// handlers build repository services on top of these.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub pool: SqlitePool,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, pool: SqlitePool) -> Self {
        Self { cfg, pool }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        routes::auth::register,
        routes::auth::login,
        routes::auth::refresh,
        routes::auth::role,
        routes::doctors::by_specialty,
        routes::doctors::list,
        routes::doctors::create,
        routes::doctors::get_one,
        routes::doctors::update,
        routes::doctors::delete_one,
        routes::patients::list,
        routes::patients::create,
        routes::patients::get_one,
        routes::patients::update,
        routes::patients::delete_one,
        routes::appointments::book,
        routes::appointments::my,
        routes::appointments::list,
        routes::appointments::create,
        routes::appointments::get_one,
        routes::appointments::update,
        routes::appointments::delete_one,
        routes::specialists::symptom_match,
        routes::specialists::list,
        routes::specialists::create,
        routes::specialists::get_one,
        routes::specialists::update,
        routes::specialists::delete_one,
        routes::specialists::list_symptoms,
        routes::specialists::add_symptom,
        routes::payments::list,
        routes::payments::create,
        routes::payments::get_one,
        routes::payments::update,
        routes::payments::delete_one,
    ),
    components(schemas(
        HealthRes,
        User,
        Role,
        Profile,
        NewAccount,
        routes::auth::RegisterResponse,
        routes::auth::LoginRequest,
        routes::auth::LoginResponse,
        routes::auth::RefreshRequest,
        routes::auth::RefreshResponse,
        routes::auth::RoleResponse,
        Doctor,
        DoctorDetail,
        NewDoctor,
        UpdateDoctor,
        Patient,
        NewPatient,
        UpdatePatient,
        Specialist,
        NewSpecialist,
        UpdateSpecialist,
        SymptomEntry,
        SymptomMatch,
        routes::specialists::NewSymptom,
        Appointment,
        BookAppointment,
        UpdateAppointment,
        Payment,
        PaymentMethod,
        NewPayment,
        UpdatePayment,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::auth::router())
        .merge(routes::doctors::router())
        .merge(routes::patients::router())
        .merge(routes::appointments::router())
        .merge(routes::specialists::router())
        .merge(routes::payments::router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used for monitoring and load balancer checks.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "medibook API is alive".into(),
    })
}
