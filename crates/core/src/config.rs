//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The intent is to avoid reading
//! process-wide environment variables during request handling, which can lead
//! to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use crate::{ApiError, ApiResult};
use chrono::Duration;

/// Default SQLite database location, relative to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://medibook.db";

/// Default lifetime of an access token, in seconds.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;

/// Default lifetime of a refresh token, in seconds.
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_url: String,
    token_secret: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the token secret is empty or either
    /// token lifetime is not positive.
    pub fn new(
        database_url: String,
        token_secret: String,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> ApiResult<Self> {
        if token_secret.trim().is_empty() {
            return Err(ApiError::Validation("token secret cannot be empty".into()));
        }
        if access_ttl_secs <= 0 || refresh_ttl_secs <= 0 {
            return Err(ApiError::Validation(
                "token lifetimes must be positive".into(),
            ));
        }

        Ok(Self {
            database_url,
            token_secret,
            access_token_ttl: Duration::seconds(access_ttl_secs),
            refresh_token_ttl: Duration::seconds(refresh_ttl_secs),
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn token_secret(&self) -> &[u8] {
        self.token_secret.as_bytes()
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }
}
