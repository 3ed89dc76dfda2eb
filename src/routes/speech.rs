use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::speech::{CreateSpeechAttemptRequest, SpeechAttemptResponse},
    error::AppError,
    routes::{
        auth::{CurrentUser, user_or_demo},
        extract::AppJson,
    },
    services::speech_service,
    state::SharedState,
};

/// Speech-attempt audit log endpoints (bearer token or demo user).
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/api/speech-attempts", post(record_attempt))
        .route("/api/speech-attempts/{game_id}", get(list_attempts))
        .route_layer(middleware::from_fn_with_state(state, user_or_demo))
}

/// Append an attempt evaluated by the client.
#[utoipa::path(
    post,
    path = "/api/speech-attempts",
    tag = "speech",
    params(("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")),
    request_body = CreateSpeechAttemptRequest,
    responses(
        (status = 201, description = "Attempt recorded", body = SpeechAttemptResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn record_attempt(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    AppJson(payload): AppJson<CreateSpeechAttemptRequest>,
) -> Result<(StatusCode, Json<SpeechAttemptResponse>), AppError> {
    payload.validate()?;
    let attempt = speech_service::record_attempt(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Attempts of the caller for one game, oldest first.
#[utoipa::path(
    get,
    path = "/api/speech-attempts/{game_id}",
    tag = "speech",
    params(
        ("game_id" = String, Path, description = "Game identifier"),
        ("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")
    ),
    responses((status = 200, description = "Recorded attempts", body = [SpeechAttemptResponse]))
)]
pub async fn list_attempts(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<SpeechAttemptResponse>>, AppError> {
    Ok(Json(
        speech_service::list_attempts(&state, user_id, game_id).await?,
    ))
}
