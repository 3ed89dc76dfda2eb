use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::progress::{
        GameCompletionRequest, GameProgressResponse, UpdateUserProgressRequest,
        UserProgressResponse,
    },
    error::AppError,
    routes::{
        auth::{CurrentUser, user_or_demo},
        extract::AppJson,
    },
    services::progress_service,
    state::SharedState,
};

/// User and per-game progress endpoints (bearer token or demo user).
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/api/progress",
            get(get_user_progress).put(update_user_progress),
        )
        .route("/api/game-progress", post(record_game_completion))
        .route("/api/game-progress/all", get(list_game_progress))
        .route("/api/game-progress/{game_id}", get(get_game_progress))
        .route_layer(middleware::from_fn_with_state(state, user_or_demo))
}

/// Progress of the caller, created on first access.
#[utoipa::path(
    get,
    path = "/api/progress",
    tag = "progress",
    params(("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`; the demo user is used when absent")),
    responses(
        (status = 200, description = "User progress", body = UserProgressResponse),
        (status = 401, description = "Malformed or expired token")
    )
)]
pub async fn get_user_progress(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<UserProgressResponse>, AppError> {
    Ok(Json(progress_service::user_progress(&state, user_id).await?))
}

/// Overwrite some of the caller's counters.
#[utoipa::path(
    put,
    path = "/api/progress",
    tag = "progress",
    params(("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`; the demo user is used when absent")),
    request_body = UpdateUserProgressRequest,
    responses(
        (status = 200, description = "Updated progress", body = UserProgressResponse),
        (status = 401, description = "Malformed or expired token")
    )
)]
pub async fn update_user_progress(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    AppJson(payload): AppJson<UpdateUserProgressRequest>,
) -> Result<Json<UserProgressResponse>, AppError> {
    Ok(Json(
        progress_service::update_user_progress(&state, user_id, payload).await?,
    ))
}

/// Progress of the caller for one game, created on first access.
#[utoipa::path(
    get,
    path = "/api/game-progress/{game_id}",
    tag = "progress",
    params(
        ("game_id" = String, Path, description = "Game identifier"),
        ("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")
    ),
    responses(
        (status = 200, description = "Game progress", body = GameProgressResponse),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game_progress(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(game_id): Path<String>,
) -> Result<Json<GameProgressResponse>, AppError> {
    Ok(Json(
        progress_service::game_progress(&state, user_id, game_id).await?,
    ))
}

/// Every game progress record of the caller.
#[utoipa::path(
    get,
    path = "/api/game-progress/all",
    tag = "progress",
    params(("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")),
    responses((status = 200, description = "All game progress", body = [GameProgressResponse]))
)]
pub async fn list_game_progress(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<GameProgressResponse>>, AppError> {
    Ok(Json(
        progress_service::all_game_progress(&state, user_id).await?,
    ))
}

/// Fold the outcome of a finished game into the caller's aggregates.
#[utoipa::path(
    post,
    path = "/api/game-progress",
    tag = "progress",
    params(("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")),
    request_body = GameCompletionRequest,
    responses(
        (status = 200, description = "Updated game progress", body = GameProgressResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn record_game_completion(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    AppJson(payload): AppJson<GameCompletionRequest>,
) -> Result<Json<GameProgressResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        progress_service::record_game_completion(&state, user_id, payload).await?,
    ))
}
