use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};

use crate::{
    auth::{AuthError, bearer_token, password},
    dto::{
        auth::{LoginRequest, LoginResponse},
        user::UserResponse,
    },
    error::ServiceError,
    state::SharedState,
};

/// How a route identifies its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// A valid bearer token is mandatory.
    Required,
    /// Token-less requests act as the configured demo user, when allowed.
    DemoFallback,
}

/// Exchange credentials for a bearer token.
pub async fn login(
    state: &SharedState,
    request: LoginRequest,
) -> Result<LoginResponse, ServiceError> {
    let Some(user) = state
        .store()
        .find_user_by_username(request.username.trim().to_string())
        .await?
    else {
        debug!(username = %request.username, "login for unknown username");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !password::matches(&request.password, &user.password_salt, &user.password_digest) {
        debug!(user_id = user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = state.authenticator().issue(user.id, state.clock().now());
    info!(user_id = user.id, "user logged in");

    Ok(LoginResponse {
        user: user.into(),
        token: issued.token,
        expires_at: issued
            .expires_at
            .format(&Rfc3339)
            .map_err(|err| ServiceError::Internal(format!("formatting token expiry: {err}")))?,
    })
}

/// Resolve the caller's user id from an optional `Authorization` header value.
pub fn resolve_user(
    state: &SharedState,
    authorization: Option<&str>,
    mode: AuthMode,
) -> Result<u64, ServiceError> {
    match authorization {
        Some(header) => {
            let token = bearer_token(header)?;
            Ok(state.authenticator().verify(token, state.clock().now())?)
        }
        None if mode == AuthMode::DemoFallback && state.config().allow_demo_user => {
            Ok(state.config().demo_user_id)
        }
        None => Err(AuthError::MissingToken.into()),
    }
}

/// Profile of the authenticated user.
pub async fn current_user(state: &SharedState, user_id: u64) -> Result<UserResponse, ServiceError> {
    state
        .store()
        .find_user(user_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound("user not found".into()))
}
