//! Input validation utilities.
//!
//! This module contains functions and newtypes for validating user inputs so
//! that they meet safety and correctness requirements before reaching the
//! store.

use serde::{Deserialize, Serialize};

use crate::{ApiError, ApiResult};

/// Validates that a username is safe to store and query.
///
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Restricts characters to a conservative ASCII set
///
/// # Errors
///
/// Returns `ApiError::Validation` if the username is invalid.
pub fn validate_username(username: &str) -> ApiResult<()> {
    const MAX_USERNAME_LEN: usize = 150;

    if username.trim().is_empty() {
        return Err(ApiError::Validation("username cannot be empty".into()));
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::Validation(format!(
            "username exceeds maximum length of {} characters",
            MAX_USERNAME_LEN
        )));
    }

    let ok = username
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'@' | b'.' | b'+' | b'-' | b'_'));

    if !ok {
        return Err(ApiError::Validation(
            "username contains invalid characters (only alphanumeric, '@', '.', '+', '-', '_' allowed)"
                .into(),
        ));
    }

    Ok(())
}

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validates a raw password before it is hashed.
pub fn validate_password(password: &str) -> ApiResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// A monetary amount with exactly two decimal places.
///
/// Stored as integer cents; parsed from and rendered as strings such as
/// `"1500.00"`. Never a float.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl std::str::FromStr for Amount {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::Validation(format!("invalid amount: {s:?}"));

        let s = s.trim();
        if s.is_empty() || s.starts_with('-') || s.starts_with('+') {
            return Err(invalid());
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() || whole.bytes().any(|b| !b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || frac.bytes().any(|b| !b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .map(Amount)
            .ok_or_else(invalid)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl TryFrom<String> for Amount {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.to_string()
    }
}

/// Deserializer that distinguishes an absent field from an explicit `null`,
/// so partial updates can clear a nullable column.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    // Only called when the field is present; `null` becomes `Some(None)`.
    Option::<T>::deserialize(deserializer).map(Some)
}
