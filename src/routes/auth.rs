use axum::{
    Extension, Json, Router,
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    auth::AuthError,
    dto::{
        auth::{LoginRequest, LoginResponse},
        user::UserResponse,
    },
    error::AppError,
    routes::extract::AppJson,
    services::auth_service::{self, AuthMode},
    state::SharedState,
};

/// Authenticated caller, inserted as a request extension by the auth middlewares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub u64);

/// Login and current-user endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    let me = Router::new()
        .route("/api/users/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, require_user));

    Router::new().route("/api/auth/login", post(login)).merge(me)
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;
    Ok(Json(auth_service::login(&state, payload).await?))
}

/// Profile of the user owning the bearer token.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "auth",
    params(("Authorization" = String, Header, description = "`Bearer <token>` issued by /api/auth/login")),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing, malformed or expired token"),
        (status = 404, description = "The token's user no longer exists")
    )
)]
pub async fn me(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(auth_service::current_user(&state, user_id).await?))
}

/// Reject requests without a valid bearer token.
pub async fn require_user(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, req, next, AuthMode::Required).await
}

/// Accept a valid bearer token, or act as the demo user when no token is sent.
pub async fn user_or_demo(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, req, next, AuthMode::DemoFallback).await
}

async fn authenticate(
    state: &SharedState,
    mut req: Request<Body>,
    next: Next,
    mode: AuthMode,
) -> Result<Response, AppError> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| AuthError::Malformed)?.to_owned()),
        None => None,
    };

    let user_id = auth_service::resolve_user(state, header.as_deref(), mode)?;
    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}
