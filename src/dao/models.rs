use time::OffsetDateTime;

use crate::catalog::Language;

/// Registered learner account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    /// Stable identifier for the user.
    pub id: u64,
    /// Unique login name.
    pub username: String,
    /// Hex-encoded SHA-256 of `salt || password`.
    pub password_digest: String,
    /// Per-user random salt mixed into [`UserEntity::password_digest`].
    pub password_salt: String,
    /// Display name.
    pub name: String,
    /// Age of the learner, when given.
    pub age: Option<u8>,
    /// Preferred prompt language.
    pub language: Language,
    /// Contact address of a parent, when given.
    pub parent_email: Option<String>,
    /// Creation time.
    pub created_at: OffsetDateTime,
}

/// User account ready to be inserted (the store allocates the id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserEntity {
    /// Login name, unique case-insensitively.
    pub username: String,
    /// Hex SHA-256 of salt and password.
    pub password_digest: String,
    /// Per-user salt.
    pub password_salt: String,
    /// Display name.
    pub name: String,
    /// Age of the learner, when given.
    pub age: Option<u8>,
    /// Prompt language.
    pub language: Language,
    /// Contact address of a parent, when given.
    pub parent_email: Option<String>,
}

/// Lifetime and daily counters of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgressEntity {
    /// Identifier.
    pub id: u64,
    /// Owning user.
    pub user_id: u64,
    /// Stars earned since the start of the current day.
    pub today_stars: u32,
    /// Consecutive days with at least one reported game.
    pub streak: u32,
    /// Words answered correctly.
    pub words_learned: u32,
    /// Games played to the end.
    pub games_completed: u32,
    /// Last time the record was written by an activity.
    pub last_active: OffsetDateTime,
}

/// Counters for one (user, game) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProgressEntity {
    /// Identifier.
    pub id: u64,
    /// Owning user.
    pub user_id: u64,
    /// Catalog game id.
    pub game_id: String,
    /// Reported plays, finished or not.
    pub times_played: u32,
    /// Never exceeds [`GameProgressEntity::times_played`].
    pub times_completed: u32,
    /// Highest score ever reported for the pair.
    pub best_score: u32,
    /// Last time the record changed.
    pub last_played: OffsetDateTime,
    /// Evaluation text of the latest play.
    pub last_evaluation: Option<String>,
    /// Time of the latest reported play.
    pub last_attempt_date: Option<OffsetDateTime>,
}

/// Append-only audit entry for one evaluated utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAttemptEntity {
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
    /// What the recognizer heard, when available.
    pub user_speech: Option<String>,
    /// Whether the utterance matched.
    pub is_correct: Option<bool>,
    /// Prompt language.
    pub language: Language,
    /// Creation time.
    pub created_at: OffsetDateTime,
}

/// Speech attempt ready to be appended (the store allocates id and timestamp).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpeechAttempt {
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
    /// Prompt language.
    pub language: Language,
}

/// Session outcome handed to the store at game end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameCompletionDelta {
    /// Whether the learner reached the end of the phrase list.
    pub completed: bool,
    /// Phrases answered correctly.
    pub score: u32,
    /// Human readable summary that replaces the previous one.
    pub evaluation: Option<String>,
    /// Stars earned, 0 to 3.
    pub stars_earned: u32,
    /// Words answered correctly.
    pub words_learned: u32,
}

/// Partial overwrite of user counters; `None` leaves a counter untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserProgressPatch {
    /// Stars earned today.
    pub today_stars: Option<u32>,
    /// Consecutive days with a completed game.
    pub streak: Option<u32>,
    /// Words answered correctly.
    pub words_learned: Option<u32>,
    /// Games played to the end.
    pub games_completed: Option<u32>,
}
