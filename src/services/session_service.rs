use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    catalog::Language,
    dto::session::{AttemptResponse, SessionResponse, StartSessionRequest, SubmitAttemptRequest},
    error::ServiceError,
    services::{catalog_service, session_bridge},
    speech::EvaluationError,
    state::{
        SessionEvent, SessionHandle, SharedState,
        play_session::PlaySession,
    },
};

/// Open a hosted session for `user_id` at the first phrase of the requested game.
pub async fn start_session(
    state: &SharedState,
    user_id: u64,
    request: StartSessionRequest,
) -> Result<SessionResponse, ServiceError> {
    let game = catalog_service::require_game(state, &request.game_id)?.clone();

    let language = match request.language {
        Some(code) => code.parse::<Language>().map_err(ServiceError::InvalidInput)?,
        None => state
            .store()
            .find_user(user_id)
            .await?
            .map(|user| user.language)
            .unwrap_or_default(),
    };

    let session = PlaySession::start(user_id, game, language, state.clock().now())?;
    let snapshot = SessionResponse::from(&session);
    state.insert_session(session);

    info!(
        session_id = %snapshot.id,
        user_id,
        game_id = %snapshot.game_id,
        %language,
        "session started"
    );
    Ok(snapshot)
}

/// Current snapshot of a session owned by `user_id`.
pub async fn get_session(
    state: &SharedState,
    user_id: u64,
    id: Uuid,
) -> Result<SessionResponse, ServiceError> {
    let handle = owned_session(state, user_id, id).await?;
    let session = handle.lock().await;
    Ok(SessionResponse::from(&*session))
}

/// Evaluate one utterance for the phrase being presented.
///
/// The session lock is released while the evaluator runs so the session can still be ended.
/// Evaluator failures leave the counters untouched and come back as retryable feedback.
pub async fn submit_attempt(
    state: &SharedState,
    user_id: u64,
    id: Uuid,
    request: SubmitAttemptRequest,
) -> Result<AttemptResponse, ServiceError> {
    let utterance = request
        .into_utterance()
        .map_err(|err| ServiceError::InvalidInput(format!("audio is not valid base64: {err}")))?;
    let handle = owned_session(state, user_id, id).await?;
    let attempt_id = Uuid::new_v4();

    let (phrase, target) = {
        let mut session = handle.lock().await;
        session.apply(SessionEvent::SubmitAttempt(attempt_id))?;
        let phrase = session
            .current_phrase()
            .cloned()
            .ok_or_else(|| ServiceError::Internal(format!("session `{id}` lost its phrase")))?;
        let target = phrase.text_in(session.language()).to_string();
        (phrase, target)
    };

    debug!(session_id = %id, %attempt_id, phrase_id = phrase.id, "evaluating attempt");
    let outcome = timeout(
        state.config().evaluation_timeout,
        state.evaluator().evaluate(utterance, target),
    )
    .await
    .unwrap_or(Err(EvaluationError::Timeout));

    let mut session = handle.lock().await;
    match outcome {
        Ok(verdict) => {
            session
                .apply(SessionEvent::Verdict {
                    attempt_id,
                    is_correct: verdict.is_correct,
                })
                .inspect_err(|_| {
                    debug!(session_id = %id, %attempt_id, "verdict arrived after the session moved on");
                })?;
            session.set_feedback(verdict.feedback.clone());
            session_bridge::log_attempt(state, &session, &phrase, &verdict).await;
            info!(
                session_id = %id,
                phrase_id = phrase.id,
                is_correct = verdict.is_correct,
                confidence = verdict.confidence,
                "attempt judged"
            );

            schedule_feedback_elapsed(state, &handle, &mut session).await;

            Ok(AttemptResponse {
                feedback: verdict.feedback.clone(),
                verdict: Some(verdict.into()),
                session: SessionResponse::from(&*session),
            })
        }
        Err(err) => {
            session.apply(SessionEvent::EvaluationFailed { attempt_id })?;
            warn!(session_id = %id, %attempt_id, error = %err, "speech evaluation failed");
            let feedback = err.to_string();
            session.set_feedback(feedback.clone());

            Ok(AttemptResponse {
                verdict: None,
                feedback,
                session: SessionResponse::from(&*session),
            })
        }
    }
}

/// Skip the phrase being presented. Skipping the last phrase completes and reports the session.
pub async fn skip_phrase(
    state: &SharedState,
    user_id: u64,
    id: Uuid,
) -> Result<SessionResponse, ServiceError> {
    let handle = owned_session(state, user_id, id).await?;
    let mut session = handle.lock().await;

    session.apply(SessionEvent::Skip)?;
    if session.phase().is_terminal() {
        session_bridge::report_completion(state, &mut session).await?;
    }
    Ok(SessionResponse::from(&*session))
}

/// Stop the session now and report it.
///
/// Ending a session that already completed but whose report failed retries the report;
/// ending a reported session is rejected.
pub async fn end_session(
    state: &SharedState,
    user_id: u64,
    id: Uuid,
) -> Result<SessionResponse, ServiceError> {
    let handle = owned_session(state, user_id, id).await?;
    let mut session = handle.lock().await;

    let retrying = session.phase().is_terminal() && session.pending_report().is_some();
    if !retrying {
        session.apply(SessionEvent::End)?;
    }
    session_bridge::report_completion(state, &mut session).await?;
    info!(session_id = %id, retrying, "session ended");
    Ok(SessionResponse::from(&*session))
}

/// Forget a session. Nothing is reported for a session that did not complete.
pub async fn discard_session(state: &SharedState, user_id: u64, id: Uuid) -> Result<(), ServiceError> {
    owned_session(state, user_id, id).await?;
    state.remove_session(id);
    info!(session_id = %id, user_id, "session discarded");
    Ok(())
}

/// Move past the feedback display, now when the delay is zero or later on a spawned task.
async fn schedule_feedback_elapsed(
    state: &SharedState,
    handle: &SessionHandle,
    session: &mut PlaySession,
) {
    let delay = state.config().feedback_delay;
    if delay.is_zero() {
        finish_feedback(state, session).await;
        return;
    }

    let state = state.clone();
    let handle = handle.clone();
    tokio::spawn(async move {
        sleep(delay).await;
        let mut session = handle.lock().await;
        finish_feedback(&state, &mut session).await;
    });
}

async fn finish_feedback(state: &SharedState, session: &mut PlaySession) {
    if let Err(err) = session.apply(SessionEvent::FeedbackElapsed) {
        // Ended or skipped while the feedback was showing.
        debug!(session_id = %session.id(), error = %err, "feedback delay elapsed on a moved session");
        return;
    }

    if session.phase().is_terminal() {
        if let Err(err) = session_bridge::report_completion(state, session).await {
            warn!(session_id = %session.id(), error = %err, "completion left unreported; end the session to retry");
        }
    }
}

/// Fetch a session owned by `user_id` and mark it active. Sessions of other users are
/// reported as missing.
async fn owned_session(
    state: &SharedState,
    user_id: u64,
    id: Uuid,
) -> Result<SessionHandle, ServiceError> {
    let not_found = || ServiceError::NotFound(format!("session `{id}` not found"));
    let handle = state.session(id).ok_or_else(not_found)?;
    {
        let mut session = handle.lock().await;
        if session.user_id() != user_id {
            return Err(not_found());
        }
        session.touch(state.clock().now());
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        catalog::Catalog,
        config::AppConfig,
        dao::progress_store::{InMemoryProgressStore, ProgressRepository},
        speech::{SpeechEvaluator, Utterance, Verdict},
        state::AppState,
    };

    struct FailingEvaluator;

    impl SpeechEvaluator for FailingEvaluator {
        fn evaluate(
            &self,
            _utterance: Utterance,
            _target_phrase: String,
        ) -> BoxFuture<'static, Result<Verdict, EvaluationError>> {
            Box::pin(async { Err(EvaluationError::Backend("offline".into())) })
        }
    }

    fn state_with(store: InMemoryProgressStore, feedback_delay: Duration) -> SharedState {
        let config = AppConfig {
            feedback_delay,
            ..AppConfig::default()
        };
        AppState::new(config, Catalog::builtin(), Arc::new(store)).into_shared()
    }

    fn start_request() -> StartSessionRequest {
        StartSessionRequest {
            game_id: "wordMatch".into(),
            language: Some("en".into()),
        }
    }

    fn transcript(text: &str) -> SubmitAttemptRequest {
        SubmitAttemptRequest {
            transcript: Some(text.into()),
            audio: None,
        }
    }

    #[tokio::test]
    async fn correct_attempt_moves_to_the_next_phrase() {
        let state = state_with(InMemoryProgressStore::new(), Duration::ZERO);
        let session = start_session(&state, 1, start_request()).await.unwrap();
        let target = session.current_phrase.unwrap().text;

        let response = submit_attempt(&state, 1, session.id, transcript(&target))
            .await
            .unwrap();

        assert!(response.verdict.unwrap().is_correct);
        assert_eq!(response.session.phase, "presenting");
        assert_eq!(response.session.current_phrase_index, Some(1));
        assert_eq!(response.session.correct_phrase_indices, vec![0]);
    }

    #[tokio::test]
    async fn evaluator_failure_is_retryable_feedback() {
        let store = InMemoryProgressStore::new();
        let state = AppState::new(AppConfig::default(), Catalog::builtin(), Arc::new(store))
            .with_evaluator(Arc::new(FailingEvaluator))
            .into_shared();
        let session = start_session(&state, 1, start_request()).await.unwrap();

        let response = submit_attempt(&state, 1, session.id, transcript("apple"))
            .await
            .unwrap();

        assert!(response.verdict.is_none());
        assert!(response.feedback.contains("offline"));
        assert_eq!(response.session.phase, "presenting");
        assert_eq!(response.session.current_phrase_index, Some(0));
        assert!(response.session.correct_phrase_indices.is_empty());
    }

    #[tokio::test]
    async fn sessions_of_other_users_are_hidden() {
        let state = state_with(InMemoryProgressStore::new(), Duration::ZERO);
        let session = start_session(&state, 1, start_request()).await.unwrap();

        let err = get_session(&state, 2, session.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = discard_session(&state, 2, session.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn ending_twice_is_rejected_and_reports_once() {
        let store = InMemoryProgressStore::new();
        let state = state_with(store.clone(), Duration::ZERO);
        let session = start_session(&state, 1, start_request()).await.unwrap();

        let ended = end_session(&state, 1, session.id).await.unwrap();
        assert!(ended.reported);
        assert!(!ended.summary.unwrap().completed);

        let err = end_session(&state, 1, session.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let progress = store
            .game_progress_or_create(1, "wordMatch".into(), state.clock().now())
            .await
            .unwrap();
        assert_eq!(progress.times_played, 1);
        assert_eq!(progress.times_completed, 0);
    }

    #[tokio::test]
    async fn feedback_delay_advances_in_the_background() {
        let state = state_with(InMemoryProgressStore::new(), Duration::from_millis(20));
        let session = start_session(&state, 1, start_request()).await.unwrap();

        let response = submit_attempt(&state, 1, session.id, transcript("definitely wrong"))
            .await
            .unwrap();
        assert_eq!(response.session.phase, "incorrect");

        tokio::time::sleep(Duration::from_millis(250)).await;
        let snapshot = get_session(&state, 1, session.id).await.unwrap();
        assert_eq!(snapshot.phase, "presenting");
        assert_eq!(snapshot.current_phrase_index, Some(0));
    }

    #[tokio::test]
    async fn unknown_games_are_not_found() {
        let state = state_with(InMemoryProgressStore::new(), Duration::ZERO);
        let err = start_session(
            &state,
            1,
            StartSessionRequest {
                game_id: "chess".into(),
                language: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
