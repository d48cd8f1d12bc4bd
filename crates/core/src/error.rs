//! Error taxonomy shared across the workspace.
//!
//! Every fallible operation in the core crate returns [`ApiResult`]. The
//! variants map one-to-one onto HTTP status categories in `api-rest`, so
//! repository code picks the variant and the transport layer never has to
//! re-classify errors.

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("permission denied: {0}")]
    Permission(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Re-classifies a database error as [`ApiError::Conflict`] when it was
    /// caused by a uniqueness violation, keeping the store as the single
    /// enforcement point for unique columns.
    pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> ApiError {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => ApiError::Conflict(message.into()),
            _ => ApiError::Database(err),
        }
    }
}
