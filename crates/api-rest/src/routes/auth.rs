//! Authentication endpoints: registration, login, token refresh, and the
//! "who am I" role query.
//!
//! Login and `/auth/role` derive the caller's role through the same core
//! function, so the two answers always agree for the same identity.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use medibook_core::repositories::accounts::{AccountService, NewAccount, Profile, User};
use medibook_core::security::{self, TokenUse};
use medibook_core::{ApiError, Role};

use crate::error::RestResult;
use crate::extract::AuthUser;
use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: User,
    pub role: Role,
    pub profile: Profile,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
    pub username: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Serialize, ToSchema)]
pub struct RoleResponse {
    pub username: String,
    pub role: Role,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/role", get(role))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = NewAccount,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Username already taken")
    )
)]
/// Registers a new account as either a patient or a doctor.
///
/// Exactly one profile row is created alongside the user; the role in the
/// response is derived from that profile.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<NewAccount>,
) -> RestResult<(StatusCode, Json<RegisterResponse>)> {
    let accounts = AccountService::new(state.pool.clone());
    let (user, profile) = accounts.register(req).await?;
    let role = accounts.role_for(&user).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user, role, profile }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed token pair", body = LoginResponse),
        (status = 401, description = "Bad credentials")
    )
)]
/// Verifies credentials and issues an access/refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> RestResult<Json<LoginResponse>> {
    let accounts = AccountService::new(state.pool.clone());
    let user = accounts.verify_login(&req.username, &req.password).await?;
    let role = accounts.role_for(&user).await?;

    let pair = security::issue_token_pair(&state.cfg, user.id, &user.username, role)?;

    Ok(Json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        role,
        username: user.username,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Fresh access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> RestResult<Json<RefreshResponse>> {
    let claims = security::verify_token(&state.cfg, &req.refresh_token, TokenUse::Refresh)?;

    let accounts = AccountService::new(state.pool.clone());
    let user = accounts
        .find_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| ApiError::Authentication("unknown user".into()))?;
    let role = accounts.role_for(&user).await?;

    let access_token =
        security::issue_token(&state.cfg, user.id, &user.username, role, TokenUse::Access)?;

    Ok(Json(RefreshResponse { access_token }))
}

#[utoipa::path(
    get,
    path = "/auth/role",
    responses(
        (status = 200, description = "Caller identity and derived role", body = RoleResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn role(auth: AuthUser) -> Json<RoleResponse> {
    Json(RoleResponse {
        username: auth.user.username,
        role: auth.role,
    })
}
