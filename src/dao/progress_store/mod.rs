pub mod memory;
pub mod streak;

use futures::future::BoxFuture;
use time::OffsetDateTime;

use crate::dao::{
    models::{
        GameCompletionDelta, GameProgressEntity, NewSpeechAttempt, NewUserEntity,
        SpeechAttemptEntity, UserEntity, UserProgressEntity, UserProgressPatch,
    },
    storage::StorageResult,
};

pub use self::memory::InMemoryProgressStore;

/// Authoritative store for users, progress aggregates and the speech-attempt log.
///
/// Every write that touches a user's aggregates is serialized per user: steps applied by
/// [`ProgressRepository::apply_game_completion`] are never observed half-done and two
/// concurrent completions for the same user never lose an increment.
pub trait ProgressRepository: Send + Sync {
    /// Insert a user; fails with a conflict when the username is taken.
    fn create_user(&self, user: NewUserEntity) -> BoxFuture<'static, StorageResult<UserEntity>>;
    /// User by id.
    fn find_user(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// User by login name, ignoring case.
    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;

    /// Return the user's progress, creating a zeroed record on first access.
    fn user_progress_or_create(
        &self,
        user_id: u64,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<UserProgressEntity>>;
    /// Overwrite the counters present in `patch`, creating the record if needed.
    /// `last_active` is left alone so a patch never extends the streak.
    fn update_user_progress(
        &self,
        user_id: u64,
        patch: UserProgressPatch,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<UserProgressEntity>>;

    /// Return the (user, game) progress, creating a zeroed record on first access.
    fn game_progress_or_create(
        &self,
        user_id: u64,
        game_id: String,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<GameProgressEntity>>;
    /// Every game progress record of the user.
    fn list_game_progress(
        &self,
        user_id: u64,
    ) -> BoxFuture<'static, StorageResult<Vec<GameProgressEntity>>>;
    /// Fold a finished session into the game and user aggregates, returning the game record.
    fn apply_game_completion(
        &self,
        user_id: u64,
        game_id: String,
        delta: GameCompletionDelta,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<GameProgressEntity>>;

    /// Append one entry to the speech-attempt log.
    fn record_speech_attempt(
        &self,
        attempt: NewSpeechAttempt,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<SpeechAttemptEntity>>;
    /// Attempts of the user for one game, oldest first.
    fn list_speech_attempts(
        &self,
        user_id: u64,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<SpeechAttemptEntity>>>;

    /// Succeeds when the store answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
