use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    catalog::Language,
    dao::models::SpeechAttemptEntity,
    dto::{
        format_time,
        validation::{validate_language, validate_not_blank},
    },
};

fn default_language() -> String {
    Language::default().code().to_string()
}

/// Audit entry sent by clients that evaluate speech on their own.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpeechAttemptRequest {
    #[validate(custom(function = "validate_not_blank"))]
    /// Catalog game id.
    pub game_id: String,
    /// Catalog phrase id.
    pub phrase_id: u32,
    #[validate(custom(function = "validate_not_blank"))]
    /// Phrase the learner was asked to say.
    pub target_phrase: String,
    /// What the recognizer heard.
    pub user_speech: Option<String>,
    /// Whether the utterance matched.
    pub is_correct: Option<bool>,
    #[serde(default = "default_language")]
    #[validate(custom(function = "validate_language"))]
    /// Prompt language code (`en` or `hi`).
    pub language: String,
}

/// One stored speech attempt.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAttemptResponse {
    /// Identifier.
    pub id: u64,
    /// Owning user.
    pub user_id: u64,
    /// Catalog game id.
    pub game_id: String,
    /// Catalog phrase id.
    pub phrase_id: u32,
    /// Phrase the learner was asked to say.
    pub target_phrase: String,
    /// What the recognizer heard.
    pub user_speech: Option<String>,
    /// Whether the utterance matched.
    pub is_correct: Option<bool>,
    /// Prompt language code (`en` or `hi`).
    pub language: Language,
    /// RFC 3339 creation time.
    pub created_at: String,
}

impl From<SpeechAttemptEntity> for SpeechAttemptResponse {
    fn from(attempt: SpeechAttemptEntity) -> Self {
        Self {
            id: attempt.id,
            user_id: attempt.user_id,
            game_id: attempt.game_id,
            phrase_id: attempt.phrase_id,
            target_phrase: attempt.target_phrase,
            user_speech: attempt.user_speech,
            is_correct: attempt.is_correct,
            language: attempt.language,
            created_at: format_time(attempt.created_at),
        }
    }
}
