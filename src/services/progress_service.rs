use tracing::info;

use crate::{
    dto::progress::{
        GameCompletionRequest, GameProgressResponse, UpdateUserProgressRequest,
        UserProgressResponse,
    },
    error::ServiceError,
    services::catalog_service,
    state::SharedState,
};

/// Progress of the user, created with zeroed counters on first access.
pub async fn user_progress(
    state: &SharedState,
    user_id: u64,
) -> Result<UserProgressResponse, ServiceError> {
    let progress = state
        .store()
        .user_progress_or_create(user_id, state.clock().now())
        .await?;
    Ok(progress.into())
}

/// Overwrite the counters present in the request.
pub async fn update_user_progress(
    state: &SharedState,
    user_id: u64,
    request: UpdateUserProgressRequest,
) -> Result<UserProgressResponse, ServiceError> {
    let progress = state
        .store()
        .update_user_progress(user_id, request.into(), state.clock().now())
        .await?;
    Ok(progress.into())
}

/// Progress for one game, created with zeroed counters on first access.
pub async fn game_progress(
    state: &SharedState,
    user_id: u64,
    game_id: String,
) -> Result<GameProgressResponse, ServiceError> {
    catalog_service::require_game(state, &game_id)?;
    let progress = state
        .store()
        .game_progress_or_create(user_id, game_id, state.clock().now())
        .await?;
    Ok(progress.into())
}

/// Every game progress record of the user.
pub async fn all_game_progress(
    state: &SharedState,
    user_id: u64,
) -> Result<Vec<GameProgressResponse>, ServiceError> {
    let records = state.store().list_game_progress(user_id).await?;
    Ok(records.into_iter().map(Into::into).collect())
}

/// Fold a client-side session outcome into the user's aggregates.
pub async fn record_game_completion(
    state: &SharedState,
    user_id: u64,
    request: GameCompletionRequest,
) -> Result<GameProgressResponse, ServiceError> {
    let game = catalog_service::require_game(state, &request.game_id)?;
    let total = game.total_phrases() as u32;
    if request.score > total {
        return Err(ServiceError::InvalidInput(format!(
            "score {} exceeds the {total} phrases of `{}`",
            request.score, game.id
        )));
    }

    let delta = request.delta();
    let progress = state
        .store()
        .apply_game_completion(user_id, request.game_id, delta, state.clock().now())
        .await?;

    info!(
        user_id,
        game_id = %progress.game_id,
        score = request.score,
        completed = request.completed,
        time_spent = ?request.time_spent,
        attempts = ?request.attempts_count,
        skipped = ?request.skipped_count,
        "game completion recorded"
    );
    Ok(progress.into())
}
