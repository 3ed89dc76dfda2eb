//! Hand-off from hosted sessions to the progress store.

use tracing::{info, warn};

use crate::{
    catalog::Phrase,
    dao::models::{GameProgressEntity, NewSpeechAttempt},
    error::ServiceError,
    speech::Verdict,
    state::{SharedState, play_session::PlaySession},
};

/// Report a completed session to the progress store, at most once per session.
///
/// Must be called with the session lock held. Returns `None` when there is nothing to
/// report (not completed yet, or already reported). On a store failure the session stays
/// unreported so a later call can retry.
pub async fn report_completion(
    state: &SharedState,
    session: &mut PlaySession,
) -> Result<Option<GameProgressEntity>, ServiceError> {
    let Some(delta) = session.pending_report() else {
        return Ok(None);
    };

    let completed = delta.completed;
    let score = delta.score;
    let progress = state
        .store()
        .apply_game_completion(
            session.user_id(),
            session.game().id.clone(),
            delta,
            state.clock().now(),
        )
        .await
        .inspect_err(|err| {
            warn!(
                session_id = %session.id(),
                error = %err,
                "failed to report session completion"
            );
        })?;

    session.mark_reported(state.clock().now());
    info!(
        session_id = %session.id(),
        user_id = session.user_id(),
        game_id = %progress.game_id,
        score,
        completed,
        "session completion reported"
    );
    Ok(Some(progress))
}

/// Append an evaluated utterance to the speech-attempt log. Failures are logged only.
pub async fn log_attempt(
    state: &SharedState,
    session: &PlaySession,
    phrase: &Phrase,
    verdict: &Verdict,
) {
    let attempt = NewSpeechAttempt {
        user_id: session.user_id(),
        game_id: session.game().id.clone(),
        phrase_id: phrase.id,
        target_phrase: phrase.text_in(session.language()).to_string(),
        user_speech: Some(verdict.transcript.clone()).filter(|text| !text.is_empty()),
        is_correct: Some(verdict.is_correct),
        language: session.language(),
    };

    if let Err(err) = state
        .store()
        .record_speech_attempt(attempt, state.clock().now())
        .await
    {
        warn!(session_id = %session.id(), error = %err, "failed to log speech attempt");
    }
}
