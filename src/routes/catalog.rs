use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::catalog::GameResponse, error::AppError, services::catalog_service, state::SharedState,
};

/// Read-only catalog endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/games", get(list_games))
        .route("/api/games/{game_id}", get(get_game))
}

/// List every game with its phrases.
#[utoipa::path(
    get,
    path = "/api/games",
    tag = "catalog",
    responses((status = 200, description = "Available games", body = [GameResponse]))
)]
pub async fn list_games(State(state): State<SharedState>) -> Json<Vec<GameResponse>> {
    Json(catalog_service::list_games(&state))
}

/// Retrieve one game.
#[utoipa::path(
    get,
    path = "/api/games/{game_id}",
    tag = "catalog",
    params(("game_id" = String, Path, description = "Game identifier, e.g. `wordMatch`")),
    responses(
        (status = 200, description = "Game found", body = GameResponse),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    Ok(Json(catalog_service::get_game(&state, &game_id)?))
}
