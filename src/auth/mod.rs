//! Bearer-token authentication behind a pluggable [`Authenticator`].
//!
//! The shipped [`DemoTokenAuthenticator`] issues `user_<id>_<expiryUnixMillis>` tokens. They
//! are not signed: anyone can forge one. Swap the implementation for a signed-token or
//! session-store authenticator without touching the routes.

pub mod password;

use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;

const TOKEN_PREFIX: &str = "user";

/// Reasons a request fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header.
    #[error("missing bearer token")]
    MissingToken,
    /// The token does not parse.
    #[error("malformed token")]
    Malformed,
    /// The token is past its expiry.
    #[error("token expired")]
    Expired,
    /// Unknown username or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Token handed to a client after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Bearer token.
    pub token: String,
    /// Instant after which the token is rejected.
    pub expires_at: OffsetDateTime,
}

/// Issues and verifies bearer tokens.
pub trait Authenticator: Send + Sync {
    /// Mint a token for `user_id`, valid from `now`.
    fn issue(&self, user_id: u64, now: OffsetDateTime) -> IssuedToken;
    /// Resolve a token to the user id it was issued for.
    fn verify(&self, token: &str, now: OffsetDateTime) -> Result<u64, AuthError>;
}

/// Unsigned `user_<id>_<expiry>` tokens for demos and local development.
#[derive(Debug, Clone)]
pub struct DemoTokenAuthenticator {
    ttl: Duration,
}

impl DemoTokenAuthenticator {
    /// Authenticator issuing tokens valid for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl Authenticator for DemoTokenAuthenticator {
    fn issue(&self, user_id: u64, now: OffsetDateTime) -> IssuedToken {
        let expires_at = now + self.ttl;
        let expiry_ms = expires_at.unix_timestamp_nanos() / 1_000_000;
        IssuedToken {
            token: format!("{TOKEN_PREFIX}_{user_id}_{expiry_ms}"),
            expires_at,
        }
    }

    fn verify(&self, token: &str, now: OffsetDateTime) -> Result<u64, AuthError> {
        let mut parts = token.split('_');
        let (Some(TOKEN_PREFIX), Some(user_id), Some(expiry), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed);
        };

        let user_id = user_id.parse::<u64>().map_err(|_| AuthError::Malformed)?;
        let expiry_ms = expiry.parse::<i128>().map_err(|_| AuthError::Malformed)?;

        if now.unix_timestamp_nanos() / 1_000_000 > expiry_ms {
            return Err(AuthError::Expired);
        }

        Ok(user_id)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header_value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token.trim())
}
