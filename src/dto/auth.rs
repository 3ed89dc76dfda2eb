use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::user::UserResponse;

/// Credentials exchanged for a bearer token.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    /// Login name.
    pub username: String,
    #[validate(length(min = 1))]
    /// Plain-text password; never stored.
    pub password: String,
}

/// Successful login: the user and a token for the `Authorization: Bearer` header.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// The authenticated user.
    pub user: UserResponse,
    /// Bearer token.
    pub token: String,
    /// RFC 3339 instant after which the token is rejected.
    pub expires_at: String,
}
