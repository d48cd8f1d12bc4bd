//! Database pool and schema management.
//!
//! The relational store is the sole shared mutable resource of the system.
//! All referential-integrity policy lives here, in the schema itself:
//!
//! - `users → doctors / patients`: ON DELETE CASCADE
//! - `specialists → doctors`: ON DELETE SET NULL
//! - `specialists → symptom_map`: ON DELETE CASCADE
//! - `patients / doctors → appointments`: ON DELETE CASCADE
//! - `appointments → payments`: ON DELETE CASCADE
//!
//! Uniqueness (`users.username`, `payments.transaction_id`, the 1:1 profile
//! and payment links) is likewise enforced by the store, not by
//! application-level locking. Foreign keys are switched on per connection;
//! SQLite does not enforce them otherwise.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::ApiResult;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL DEFAULT '',
    first_name    TEXT NOT NULL DEFAULT '',
    last_name     TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,
    is_staff      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS specialists (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS doctors (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    specialty_id    INTEGER REFERENCES specialists(id) ON DELETE SET NULL,
    bio             TEXT NOT NULL DEFAULT '',
    is_available    INTEGER NOT NULL DEFAULT 1,
    available_times TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS patients (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    age     INTEGER NOT NULL DEFAULT 0,
    gender  TEXT NOT NULL DEFAULT '',
    phone   TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS symptom_map (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    symptom       TEXT NOT NULL,
    specialist_id INTEGER NOT NULL REFERENCES specialists(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS appointments (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER REFERENCES patients(id) ON DELETE CASCADE,
    doctor_id  INTEGER NOT NULL REFERENCES doctors(id) ON DELETE CASCADE,
    date       TEXT NOT NULL,
    time       TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'pending',
    notes      TEXT
);

CREATE TABLE IF NOT EXISTS payments (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    appointment_id INTEGER NOT NULL UNIQUE REFERENCES appointments(id) ON DELETE CASCADE,
    amount_cents   INTEGER NOT NULL,
    method         TEXT NOT NULL,
    transaction_id TEXT NOT NULL UNIQUE,
    status         TEXT NOT NULL DEFAULT 'pending',
    created_at     TEXT NOT NULL
);
"#;

/// Opens a connection pool against `database_url`, creating the database
/// file when missing and enabling foreign-key enforcement per connection.
pub async fn connect(database_url: &str) -> ApiResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Applies the schema. Idempotent; run once at startup.
pub async fn init_schema(pool: &SqlitePool) -> ApiResult<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // A single connection keeps every test query on the same in-memory
    // database.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");
    init_schema(&pool).await.expect("schema applies");
    pool
}
