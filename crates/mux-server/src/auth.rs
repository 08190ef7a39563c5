//! JWT bearer authentication.
//!
//! Tokens are HS256 with `sub` holding the user's UUID. Verification happens
//! in the [`AuthenticatedUser`] extractor; handlers receive an opaque
//! [`UserId`] and trust it from there.

use crate::error::ApiError;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mux_core::UserId;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Paired signing and verification keys for one shared HS256 secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Derive both keys from the shared secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys(REDACTED)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issue a bearer token for a user, valid for `lifetime`.
pub fn issue_token(
    keys: &JwtKeys,
    user_id: UserId,
    lifetime: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: Utc::now().timestamp() + i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
}

fn verify_token(keys: &JwtKeys, token: &str) -> Result<UserId, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|e| {
        debug!(error = %e, "Token verification failed");
        ApiError::unauthorized("Invalid authentication credentials")
    })?;

    data.claims
        .sub
        .parse::<UserId>()
        .map_err(|_| ApiError::unauthorized("Invalid user ID format"))
}

/// The verified caller identity, extracted from the `Authorization` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authentication credentials"))?;

        let keys = JwtKeys::from_ref(state);
        Ok(Self(verify_token(&keys, token.trim())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new(&SecretString::new("unit-test-secret".to_string()))
    }

    #[test]
    fn issued_token_verifies_to_same_user() {
        let keys = keys();
        let user = UserId::generate();
        let token = issue_token(&keys, user, Duration::from_secs(60)).expect("issue");
        assert_eq!(verify_token(&keys, &token).expect("verify"), user);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let claims = Claims {
            sub: UserId::generate().to_string(),
            exp: Utc::now().timestamp() - 3600,
        };
        let token =
            encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).expect("encode");
        assert!(verify_token(&keys, &token).is_err());
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let keys = keys();
        let claims = Claims {
            sub: "alice".to_string(),
            exp: Utc::now().timestamp() + 3600,
        };
        let token =
            encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).expect("encode");
        assert!(verify_token(&keys, &token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = JwtKeys::new(&SecretString::new("different".to_string()));
        let token =
            issue_token(&other, UserId::generate(), Duration::from_secs(60)).expect("issue");
        assert!(verify_token(&keys(), &token).is_err());
    }
}
