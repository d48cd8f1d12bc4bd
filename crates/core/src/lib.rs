//! # Medibook Core
//!
//! Core business logic for the medibook appointment-booking backend.
//!
//! This crate contains the domain and data layer:
//! - Account registration, credential verification, and role resolution
//! - Repository services for doctors, patients, specialists, appointments,
//!   and payments over a shared SQLite pool
//! - Referential-integrity policy (cascade and nullify rules) applied in the
//!   schema itself
//!
//! **No API concerns**: HTTP routing, request parsing, and OpenAPI
//! documentation belong in `api-rest`.

pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod roles;
pub mod security;
pub mod validation;

pub use config::CoreConfig;
pub use error::{ApiError, ApiResult};
pub use roles::Role;
pub use validation::Amount;
