use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{GameCompletionDelta, GameProgressEntity, UserProgressEntity, UserProgressPatch},
    dto::{format_time, validation::validate_not_blank},
};

/// Lifetime and daily counters of the current user.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProgressResponse {
    /// Identifier.
    pub id: u64,
    /// Owning user.
    pub user_id: u64,
    /// Stars earned today.
    pub today_stars: u32,
    /// Consecutive days with a completed game.
    pub streak: u32,
    /// Words answered correctly.
    pub words_learned: u32,
    /// Games played to the end.
    pub games_completed: u32,
    /// RFC 3339 time of the latest completed game.
    pub last_active: String,
}

impl From<UserProgressEntity> for UserProgressResponse {
    fn from(progress: UserProgressEntity) -> Self {
        Self {
            id: progress.id,
            user_id: progress.user_id,
            today_stars: progress.today_stars,
            streak: progress.streak,
            words_learned: progress.words_learned,
            games_completed: progress.games_completed,
            last_active: format_time(progress.last_active),
        }
    }
}

/// Partial overwrite of user counters; omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserProgressRequest {
    /// Stars earned today.
    pub today_stars: Option<u32>,
    /// Consecutive days with a completed game.
    pub streak: Option<u32>,
    /// Words answered correctly.
    pub words_learned: Option<u32>,
    /// Games played to the end.
    pub games_completed: Option<u32>,
}

impl From<UpdateUserProgressRequest> for UserProgressPatch {
    fn from(request: UpdateUserProgressRequest) -> Self {
        Self {
            today_stars: request.today_stars,
            streak: request.streak,
            words_learned: request.words_learned,
            games_completed: request.games_completed,
        }
    }
}

/// Counters for one (user, game) pair.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameProgressResponse {
    /// Identifier.
    pub id: u64,
    /// Owning user.
    pub user_id: u64,
    /// Catalog game id.
    pub game_id: String,
    /// Reported plays, finished or not.
    pub times_played: u32,
    /// Plays that reached the end of the phrase list.
    pub times_completed: u32,
    /// Highest score reported.
    pub best_score: u32,
    /// RFC 3339 time the record last changed.
    pub last_played: String,
    /// Evaluation text of the latest play.
    pub last_evaluation: Option<String>,
    /// RFC 3339 time of the latest reported play.
    pub last_attempt_date: Option<String>,
}

impl From<GameProgressEntity> for GameProgressResponse {
    fn from(progress: GameProgressEntity) -> Self {
        Self {
            id: progress.id,
            user_id: progress.user_id,
            game_id: progress.game_id,
            times_played: progress.times_played,
            times_completed: progress.times_completed,
            best_score: progress.best_score,
            last_played: format_time(progress.last_played),
            last_evaluation: progress.last_evaluation,
            last_attempt_date: progress.last_attempt_date.map(format_time),
        }
    }
}

/// Outcome of a finished game reported by a client that ran the session itself.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GameCompletionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    /// Catalog game id.
    pub game_id: String,
    /// Whether the end of the phrase list was reached.
    pub completed: bool,
    /// Number of phrases answered correctly.
    pub score: u32,
    /// Human-readable result, e.g. `3/5 correct (60.0%)`.
    pub evaluation: Option<String>,
    #[validate(range(max = 3))]
    /// Stars earned, 0 to 3.
    pub stars_earned: u32,
    /// Words answered correctly.
    pub words_learned: u32,
    /// Seconds spent playing. Informational.
    pub time_spent: Option<u64>,
    /// Phrases answered or skipped. Informational.
    pub attempts_count: Option<u32>,
    /// Phrases skipped. Informational.
    pub skipped_count: Option<u32>,
}

impl GameCompletionRequest {
    /// Counters folded into the aggregates.
    pub fn delta(&self) -> GameCompletionDelta {
        GameCompletionDelta {
            completed: self.completed,
            score: self.score,
            evaluation: self.evaluation.clone(),
            stars_earned: self.stars_earned,
            words_learned: self.words_learned,
        }
    }
}
