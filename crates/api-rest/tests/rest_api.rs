//! Router-level tests: every request goes through the real axum router,
//! extractors, and the repository layer against an in-memory database.

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use api_rest::AppState;
use medibook_core::{db, CoreConfig};

async fn test_app() -> Router {
    // Single connection so every request sees the same in-memory database.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");
    db::init_schema(&pool).await.expect("schema applies");

    let cfg = CoreConfig::new(
        "sqlite::memory:".into(),
        "test-secret".into(),
        3600,
        86_400,
    )
    .expect("valid config");

    api_rest::router(AppState::new(Arc::new(cfg), pool))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serializes")))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    };

    let response = app.clone().oneshot(request).await.expect("handler runs");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body reads")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn patient_registration(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "first_name": "Alice",
        "last_name": "W",
        "password": "hunter2hunter2",
        "password2": "hunter2hunter2",
        "is_patient": true,
        "age": 30,
        "gender": "female",
        "phone": "0700000000",
        "address": "Nairobi"
    })
}

fn doctor_registration(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "first_name": "Bob",
        "last_name": "M",
        "password": "hunter2hunter2",
        "password2": "hunter2hunter2",
        "is_doctor": true,
        "bio": "general practice"
    })
}

async fn register(app: &Router, body: Value) -> Value {
    let (status, body) = send(app, "POST", "/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body
}

async fn login(app: &Router, username: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn register_login_book_and_list_my_appointments() {
    let app = test_app().await;

    let doctor = register(&app, doctor_registration("dr.bob")).await;
    assert_eq!(doctor["role"], json!("doctor"));
    let doctor_id = doctor["profile"]["data"]["id"].as_i64().expect("doctor id");

    let patient = register(&app, patient_registration("alice")).await;
    assert_eq!(patient["role"], json!("patient"));
    assert_eq!(patient["profile"]["kind"], json!("patient"));
    assert_eq!(patient["profile"]["data"]["age"], json!(30));

    let session = login(&app, "alice").await;
    assert_eq!(session["role"], json!("patient"));
    assert_eq!(session["username"], json!("alice"));
    let token = session["access_token"].as_str().expect("token");

    let (status, booked) = send(
        &app,
        "POST",
        "/appointments/book",
        Some(token),
        Some(json!({ "doctor_id": doctor_id, "date": "2025-06-01", "time": "09:00:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "booking failed: {booked}");
    assert_eq!(booked["status"], json!("pending"));

    let (status, mine) = send(&app, "GET", "/appointments/my", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().expect("list");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], booked["id"]);
    assert_eq!(mine[0]["date"], json!("2025-06-01"));
    assert_eq!(mine[0]["status"], json!("pending"));
}

#[tokio::test]
async fn register_rejects_password_mismatch() {
    let app = test_app().await;

    let mut body = patient_registration("alice");
    body["password2"] = json!("something-else");

    let (status, body) = send(&app, "POST", "/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("message").contains("match"));
}

#[tokio::test]
async fn register_rejects_missing_role_selection() {
    let app = test_app().await;

    let mut body = patient_registration("alice");
    body["is_patient"] = json!(false);

    let (status, _) = send(&app, "POST", "/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_without_patient_profile_is_forbidden() {
    let app = test_app().await;

    let doctor = register(&app, doctor_registration("dr.bob")).await;
    let doctor_id = doctor["profile"]["data"]["id"].as_i64().expect("doctor id");

    let session = login(&app, "dr.bob").await;
    let token = session["access_token"].as_str().expect("token");

    let (status, body) = send(
        &app,
        "POST",
        "/appointments/book",
        Some(token),
        Some(json!({ "doctor_id": doctor_id, "date": "2025-06-01", "time": "09:00:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"]
        .as_str()
        .expect("message")
        .contains("patient profile"));

    // And their appointment list is empty, not an error.
    let (status, mine) = send(&app, "GET", "/appointments/my", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine, json!([]));
}

#[tokio::test]
async fn authenticated_routes_reject_missing_or_garbage_tokens() {
    let app = test_app().await;

    let (status, _) = send(&app, "GET", "/appointments/my", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/auth/role", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_endpoint_agrees_with_login() {
    let app = test_app().await;
    register(&app, patient_registration("alice")).await;

    let session = login(&app, "alice").await;
    let token = session["access_token"].as_str().expect("token");

    let (status, body) = send(&app, "GET", "/auth/role", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], session["role"]);
    assert_eq!(body["username"], json!("alice"));
}

#[tokio::test]
async fn refresh_issues_new_access_token_and_rejects_access_tokens() {
    let app = test_app().await;
    register(&app, patient_registration("alice")).await;

    let session = login(&app, "alice").await;
    let refresh_token = session["refresh_token"].as_str().expect("token");
    let access_token = session["access_token"].as_str().expect("token");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["access_token"].as_str().expect("fresh token");

    let (status, _) = send(&app, "GET", "/auth/role", Some(fresh), None).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not accepted on the refresh endpoint.
    let (status, _) = send(
        &app,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": access_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doctor_discovery_is_public_and_filters_by_specialty() {
    let app = test_app().await;

    let (status, derm) = send(
        &app,
        "POST",
        "/specialists",
        None,
        Some(json!({ "name": "Dermatology", "description": "skin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let derm_id = derm["id"].as_i64().expect("id");

    let mut registration = doctor_registration("dr.skin");
    registration["specialty_id"] = json!(derm_id);
    register(&app, registration).await;
    register(&app, doctor_registration("dr.plain")).await;

    let (status, all) = send(&app, "GET", "/doctors/by-specialty", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().expect("list").len(), 2);

    let (status, filtered) = send(
        &app,
        "GET",
        "/doctors/by-specialty?specialty=dermatology",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let filtered = filtered.as_array().expect("list");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["user"]["username"], json!("dr.skin"));
    assert_eq!(filtered[0]["specialty"]["name"], json!("Dermatology"));
    assert!(filtered[0]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn doctor_crud_is_admin_only() {
    let app = test_app().await;
    register(&app, patient_registration("alice")).await;

    let session = login(&app, "alice").await;
    let token = session["access_token"].as_str().expect("token");

    let (status, _) = send(&app, "GET", "/doctors", Some(token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn symptom_match_is_public_case_insensitive_substring() {
    let app = test_app().await;

    let (_, gp) = send(
        &app,
        "POST",
        "/specialists",
        None,
        Some(json!({ "name": "General Practice", "description": "gp" })),
    )
    .await;
    let gp_id = gp["id"].as_i64().expect("id");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/specialists/{gp_id}/symptoms"),
        None,
        Some(json!({ "symptom": "fever" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, hits) = send(&app, "GET", "/symptom-match?symptom=FEVER", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let hits = hits.as_array().expect("list");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["specialist"]["name"], json!("General Practice"));

    // Absent parameter and unmatched term both give an empty 200.
    let (status, empty) = send(&app, "GET", "/symptom-match", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty, json!([]));

    let (status, empty) = send(&app, "GET", "/symptom-match?symptom=toothache", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty, json!([]));
}

#[tokio::test]
async fn duplicate_payment_transaction_id_conflicts() {
    let app = test_app().await;

    let doctor = register(&app, doctor_registration("dr.bob")).await;
    let doctor_id = doctor["profile"]["data"]["id"].as_i64().expect("doctor id");
    register(&app, patient_registration("alice")).await;

    let session = login(&app, "alice").await;
    let token = session["access_token"].as_str().expect("token");

    let mut appointment_ids = Vec::new();
    for date in ["2025-06-01", "2025-06-02"] {
        let (status, booked) = send(
            &app,
            "POST",
            "/appointments/book",
            Some(token),
            Some(json!({ "doctor_id": doctor_id, "date": date, "time": "09:00:00" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        appointment_ids.push(booked["id"].as_i64().expect("id"));
    }

    let (status, first) = send(
        &app,
        "POST",
        "/payments",
        Some(token),
        Some(json!({
            "appointment_id": appointment_ids[0],
            "amount": "1500.00",
            "method": "mpesa",
            "transaction_id": "TXN-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "payment failed: {first}");
    assert_eq!(first["amount"], json!("1500.00"));

    let (status, body) = send(
        &app,
        "POST",
        "/payments",
        Some(token),
        Some(json!({
            "appointment_id": appointment_ids[1],
            "amount": "900.00",
            "method": "stripe",
            "transaction_id": "TXN-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]
        .as_str()
        .expect("message")
        .contains("transaction id"));

    // The first payment is unaffected.
    let first_id = first["id"].as_i64().expect("id");
    let (status, kept) = send(&app, "GET", &format!("/payments/{first_id}"), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kept["transaction_id"], json!("TXN-1"));
}

#[tokio::test]
async fn deleting_an_appointment_cascades_to_its_payment() {
    let app = test_app().await;

    let doctor = register(&app, doctor_registration("dr.bob")).await;
    let doctor_id = doctor["profile"]["data"]["id"].as_i64().expect("doctor id");
    register(&app, patient_registration("alice")).await;

    let session = login(&app, "alice").await;
    let token = session["access_token"].as_str().expect("token");

    let (_, booked) = send(
        &app,
        "POST",
        "/appointments/book",
        Some(token),
        Some(json!({ "doctor_id": doctor_id, "date": "2025-06-01", "time": "09:00:00" })),
    )
    .await;
    let appointment_id = booked["id"].as_i64().expect("id");

    let (_, payment) = send(
        &app,
        "POST",
        "/payments",
        Some(token),
        Some(json!({
            "appointment_id": appointment_id,
            "amount": "1500.00",
            "method": "mpesa",
            "transaction_id": "TXN-1"
        })),
    )
    .await;
    let payment_id = payment["id"].as_i64().expect("id");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/appointments/{appointment_id}"),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/payments/{payment_id}"), Some(token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
