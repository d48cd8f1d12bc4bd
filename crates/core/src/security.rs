//! Credential hashing and bearer-token handling.
//!
//! Passwords are hashed with Argon2; access/refresh tokens are HS256 JWTs.
//! A token carries a `token_use` claim so a refresh token can never be
//! presented where an access token is expected, and vice versa.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{ApiError, ApiResult, CoreConfig, Role};

/// Which half of the token pair a JWT belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenUse {
    Access,
    Refresh,
}

impl TokenUse {
    fn as_str(&self) -> &'static str {
        match self {
            TokenUse::Access => "access",
            TokenUse::Refresh => "refresh",
        }
    }
}

/// Claims embedded in every issued token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id, as a string.
    pub sub: String,
    pub username: String,
    pub role: String,
    pub token_use: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// The user id carried in `sub`.
    pub fn user_id(&self) -> ApiResult<i64> {
        self.sub
            .parse()
            .map_err(|_| ApiError::Authentication("invalid token subject".into()))
    }
}

/// Signed access/refresh token pair returned at login.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Hashes a password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// Verifies a password against a stored Argon2 hash.
///
/// # Errors
///
/// Returns `ApiError::Authentication` when the password does not match, and
/// `ApiError::Internal` when the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> ApiResult<()> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(format!("malformed password hash: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::Authentication("invalid username or password".into()))
}

/// Issues a single signed token for `user_id`.
pub fn issue_token(
    cfg: &CoreConfig,
    user_id: i64,
    username: &str,
    role: Role,
    token_use: TokenUse,
) -> ApiResult<String> {
    let ttl = match token_use {
        TokenUse::Access => cfg.access_token_ttl(),
        TokenUse::Refresh => cfg.refresh_token_ttl(),
    };

    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: role.as_str().to_string(),
        token_use: token_use.as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.token_secret()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

/// Issues the access/refresh pair returned by login.
pub fn issue_token_pair(
    cfg: &CoreConfig,
    user_id: i64,
    username: &str,
    role: Role,
) -> ApiResult<TokenPair> {
    Ok(TokenPair {
        access_token: issue_token(cfg, user_id, username, role, TokenUse::Access)?,
        refresh_token: issue_token(cfg, user_id, username, role, TokenUse::Refresh)?,
    })
}

/// Decodes and validates a token, checking signature, expiry, and that it
/// was issued for `expected` use.
pub fn verify_token(cfg: &CoreConfig, token: &str, expected: TokenUse) -> ApiResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.token_secret()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Authentication("invalid or expired token".into()))?;

    if data.claims.token_use != expected.as_str() {
        return Err(ApiError::Authentication(format!(
            "expected {} token",
            expected.as_str()
        )));
    }

    Ok(data.claims)
}

#[cfg(test)]
mod security_tests {
    use super::*;

    fn test_config() -> CoreConfig {
        CoreConfig::new(
            "sqlite::memory:".into(),
            "test-secret".into(),
            60,
            3600,
        )
        .expect("valid config")
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").expect("hashes");
        verify_password("correct horse", &hash).expect("matches");

        let err = verify_password("wrong horse", &hash).expect_err("mismatch rejected");
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let cfg = test_config();
        let pair = issue_token_pair(&cfg, 7, "alice", Role::Patient).expect("issues");

        let claims = verify_token(&cfg, &pair.access_token, TokenUse::Access).expect("verifies");
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "patient");
    }

    #[test]
    fn access_token_rejected_as_refresh() {
        let cfg = test_config();
        let pair = issue_token_pair(&cfg, 7, "alice", Role::Patient).expect("issues");

        let err = verify_token(&cfg, &pair.access_token, TokenUse::Refresh)
            .expect_err("wrong use rejected");
        assert!(matches!(err, ApiError::Authentication(_)));

        verify_token(&cfg, &pair.refresh_token, TokenUse::Refresh).expect("refresh verifies");
    }

    #[test]
    fn foreign_signature_rejected() {
        let cfg = test_config();
        let other = CoreConfig::new("sqlite::memory:".into(), "other-secret".into(), 60, 3600)
            .expect("valid config");

        let token = issue_token(&other, 7, "alice", Role::User, TokenUse::Access).expect("issues");
        let err = verify_token(&cfg, &token, TokenUse::Access).expect_err("signature rejected");
        assert!(matches!(err, ApiError::Authentication(_)));
    }
}
