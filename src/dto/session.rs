use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    catalog::Language,
    dto::{
        format_time,
        validation::{validate_language, validate_not_blank},
    },
    speech::{Utterance, Verdict},
    state::{play_session::PlaySession, session_machine::CompletionSummary},
};

/// Open a hosted play session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    /// Catalog game id.
    pub game_id: String,
    /// Prompt language (`en` or `hi`); defaults to the user's language.
    #[validate(custom(function = "validate_language"))]
    pub language: Option<String>,
}

/// One utterance for the phrase being presented: a device transcript or base64 audio.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    /// Text recognized on the learner's device.
    pub transcript: Option<String>,
    /// Base64-encoded audio recording.
    pub audio: Option<String>,
}

impl Validate for SubmitAttemptRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match (&self.transcript, &self.audio) {
            (Some(_), Some(_)) | (None, None) => {
                let mut err = ValidationError::new("utterance");
                err.message = Some("provide exactly one of `transcript` or `audio`".into());
                errors.add("transcript", err);
            }
            (None, Some(audio)) if STANDARD.decode(audio).is_err() => {
                let mut err = ValidationError::new("base64");
                err.message = Some("audio must be base64 encoded".into());
                errors.add("audio", err);
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl SubmitAttemptRequest {
    /// Convert a validated request into an utterance.
    pub fn into_utterance(self) -> Result<Utterance, base64::DecodeError> {
        match (self.transcript, self.audio) {
            (Some(text), _) => Ok(Utterance::Transcript(text)),
            (None, Some(audio)) => STANDARD.decode(audio).map(Utterance::Audio),
            (None, None) => Ok(Utterance::Audio(Vec::new())),
        }
    }
}

/// Phrase the learner is asked to say, in the session language.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionPhraseResponse {
    /// Catalog phrase id.
    pub id: u32,
    /// Prompt text in English.
    pub text: String,
}

/// Outcome of a completed session.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummaryResponse {
    /// Whether the learner reached the end of the phrase list.
    pub completed: bool,
    /// Phrases answered correctly.
    pub score: u32,
    /// Phrases in the game.
    pub total_phrases: u32,
    /// Stars earned, 0 to 3.
    pub stars_earned: u32,
    /// Phrases answered or skipped.
    pub attempts_count: u32,
    /// Phrases skipped.
    pub skipped_count: u32,
    /// Seconds spent playing.
    pub time_spent: u64,
    /// `score / totalPhrases`, between 0 and 1.
    pub accuracy: f64,
    /// Human-readable result, e.g. `3/5 correct (60.0%)`.
    pub evaluation: String,
    /// Words answered correctly.
    pub words_learned: u32,
}

impl From<CompletionSummary> for CompletionSummaryResponse {
    fn from(summary: CompletionSummary) -> Self {
        Self {
            completed: summary.completed,
            score: summary.score,
            total_phrases: summary.total_phrases,
            stars_earned: summary.stars_earned,
            attempts_count: summary.attempts_count,
            skipped_count: summary.skipped_count,
            time_spent: summary.time_spent,
            accuracy: summary.accuracy,
            evaluation: summary.evaluation,
            words_learned: summary.words_learned,
        }
    }
}

/// Snapshot of a hosted session.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Session identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: u64,
    /// Catalog game id.
    pub game_id: String,
    /// Prompt language.
    pub language: Language,
    /// `presenting`, `evaluating`, `correct`, `incorrect` or `completed`.
    pub phase: String,
    /// Index of the phrase on screen.
    pub current_phrase_index: Option<usize>,
    /// Phrase on screen.
    pub current_phrase: Option<SessionPhraseResponse>,
    /// Phrases in the game.
    pub total_phrases: usize,
    /// Indices answered correctly.
    pub correct_phrase_indices: Vec<usize>,
    /// Indices skipped.
    pub skipped_phrase_indices: Vec<usize>,
    /// Seconds played so far.
    pub elapsed_seconds: u64,
    /// Whether the session still accepts events.
    pub is_active: bool,
    /// RFC 3339 start time.
    pub started_at: String,
    /// Feedback from the latest evaluation.
    pub last_feedback: Option<String>,
    /// Whether the completion reached the progress store.
    pub reported: bool,
    /// Outcome, once the session is over.
    pub summary: Option<CompletionSummaryResponse>,
}

impl From<&PlaySession> for SessionResponse {
    fn from(session: &PlaySession) -> Self {
        let machine = session.machine();
        let phase = session.phase();
        Self {
            id: session.id(),
            user_id: session.user_id(),
            game_id: session.game().id.clone(),
            language: session.language(),
            phase: phase.name().to_string(),
            current_phrase_index: phase.phrase_index(),
            current_phrase: session
                .current_phrase()
                .map(|phrase| SessionPhraseResponse {
                    id: phrase.id,
                    text: phrase.text_in(session.language()).to_string(),
                }),
            total_phrases: machine.total_phrases(),
            correct_phrase_indices: machine.correct_indices().to_vec(),
            skipped_phrase_indices: machine.skipped_indices().to_vec(),
            elapsed_seconds: machine.elapsed_seconds(),
            is_active: machine.is_active(),
            started_at: format_time(session.started_at()),
            last_feedback: session.last_feedback().map(str::to_string),
            reported: session.is_reported(),
            summary: session.summary().map(Into::into),
        }
    }
}

/// How the evaluator judged an utterance.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerdictResponse {
    /// Whether the utterance matched.
    pub is_correct: bool,
    /// Closeness estimate, 0.0 to 1.0.
    pub confidence: f32,
    /// Message to show the learner.
    pub feedback: String,
    /// Normalized transcript that was judged.
    pub transcript: String,
}

impl From<Verdict> for VerdictResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            is_correct: verdict.is_correct,
            confidence: verdict.confidence,
            feedback: verdict.feedback,
            transcript: verdict.transcript,
        }
    }
}

/// Result of submitting an utterance. `verdict` is absent when evaluation failed and the
/// learner should simply try again.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttemptResponse {
    /// Judgement, absent when evaluation failed.
    pub verdict: Option<VerdictResponse>,
    /// Message to show the learner.
    pub feedback: String,
    /// Session snapshot after the attempt.
    pub session: SessionResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_requires_exactly_one_utterance() {
        let both = SubmitAttemptRequest {
            transcript: Some("apple".into()),
            audio: Some("AAEC".into()),
        };
        assert!(both.validate().is_err());

        let neither = SubmitAttemptRequest {
            transcript: None,
            audio: None,
        };
        assert!(neither.validate().is_err());
    }

    #[test]
    fn audio_is_decoded_from_base64() {
        let request = SubmitAttemptRequest {
            transcript: None,
            audio: Some("AAEC".into()),
        };
        assert!(request.validate().is_ok());
        assert_eq!(request.into_utterance().unwrap(), Utterance::Audio(vec![0, 1, 2]));

        let garbage = SubmitAttemptRequest {
            transcript: None,
            audio: Some("not base64!".into()),
        };
        assert!(garbage.validate().is_err());
    }
}
