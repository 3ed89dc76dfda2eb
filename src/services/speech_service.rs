use crate::{
    catalog::Language,
    dao::models::NewSpeechAttempt,
    dto::speech::{CreateSpeechAttemptRequest, SpeechAttemptResponse},
    error::ServiceError,
    services::catalog_service,
    state::SharedState,
};

/// Append a client-evaluated attempt to the audit log.
pub async fn record_attempt(
    state: &SharedState,
    user_id: u64,
    request: CreateSpeechAttemptRequest,
) -> Result<SpeechAttemptResponse, ServiceError> {
    catalog_service::require_game(state, &request.game_id)?;
    let language = request
        .language
        .parse::<Language>()
        .map_err(ServiceError::InvalidInput)?;

    let attempt = state
        .store()
        .record_speech_attempt(
            NewSpeechAttempt {
                user_id,
                game_id: request.game_id,
                phrase_id: request.phrase_id,
                target_phrase: request.target_phrase,
                user_speech: request.user_speech,
                is_correct: request.is_correct,
                language,
            },
            state.clock().now(),
        )
        .await?;
    Ok(attempt.into())
}

/// Attempts of the user for one game, oldest first.
pub async fn list_attempts(
    state: &SharedState,
    user_id: u64,
    game_id: String,
) -> Result<Vec<SpeechAttemptResponse>, ServiceError> {
    let attempts = state.store().list_speech_attempts(user_id, game_id).await?;
    Ok(attempts.into_iter().map(Into::into).collect())
}
