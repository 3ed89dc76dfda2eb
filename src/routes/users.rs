use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::user::{CreateUserRequest, UserResponse},
    error::AppError,
    routes::extract::AppJson,
    services::user_service,
    state::SharedState,
};

/// Sign-up and public profile endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user))
}

/// Register a new learner.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn create_user(
    State(state): State<SharedState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;
    let user = user_service::create_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Retrieve a user by id.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = u64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(user_service::get_user(&state, id).await?))
}
