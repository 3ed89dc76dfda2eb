//! In-process implementation of [`ProgressRepository`].
//!
//! Each user owns a ledger (user progress plus every game progress record) behind its own
//! async mutex. All aggregate reads and writes for a user go through that mutex; users never
//! contend with each other.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use crate::dao::{
    models::{
        GameCompletionDelta, GameProgressEntity, NewSpeechAttempt, NewUserEntity,
        SpeechAttemptEntity, UserEntity, UserProgressEntity, UserProgressPatch,
    },
    progress_store::{ProgressRepository, streak},
    storage::{StorageError, StorageResult},
};

/// Aggregates owned by a single user.
#[derive(Debug, Default)]
pub struct UserLedger {
    progress: Option<UserProgressEntity>,
    games: IndexMap<String, GameProgressEntity>,
}

impl UserLedger {
    /// The user's progress record, if it was ever created.
    pub fn progress(&self) -> Option<&UserProgressEntity> {
        self.progress.as_ref()
    }

    /// Game progress records in creation order.
    pub fn games(&self) -> impl Iterator<Item = &GameProgressEntity> {
        self.games.values()
    }
}

#[derive(Debug, Default)]
struct IdSequence(AtomicU64);

impl IdSequence {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Default)]
struct Inner {
    users: DashMap<u64, UserEntity>,
    usernames: DashMap<String, u64>,
    ledgers: DashMap<u64, Arc<Mutex<UserLedger>>>,
    attempts: DashMap<(u64, String), Vec<SpeechAttemptEntity>>,
    user_ids: IdSequence,
    user_progress_ids: IdSequence,
    game_progress_ids: IdSequence,
    attempt_ids: IdSequence,
}

/// Progress store kept entirely in process memory.
#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    inner: Arc<Inner>,
}

impl InMemoryProgressStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` with exclusive access to the user's ledger.
    pub async fn with_user_lock<T>(
        &self,
        user_id: u64,
        work: impl FnOnce(&mut UserLedger) -> T,
    ) -> T {
        self.inner.with_user_lock(user_id, work).await
    }
}

impl Inner {
    async fn with_user_lock<T>(
        &self,
        user_id: u64,
        work: impl FnOnce(&mut UserLedger) -> T,
    ) -> T {
        // Clone the handle out so the shard guard is released before awaiting the mutex.
        let ledger = self.ledgers.entry(user_id).or_default().clone();
        let mut guard = ledger.lock().await;
        work(&mut *guard)
    }

    fn user_progress<'a>(
        &self,
        ledger: &'a mut UserLedger,
        user_id: u64,
        now: OffsetDateTime,
    ) -> &'a mut UserProgressEntity {
        let progress = ledger.progress.get_or_insert_with(|| {
            debug!(user_id, "creating user progress");
            UserProgressEntity {
                id: self.user_progress_ids.next(),
                user_id,
                today_stars: 0,
                streak: 0,
                words_learned: 0,
                games_completed: 0,
                last_active: now,
            }
        });
        streak::roll_over(progress, now.date());
        progress
    }

    fn game_progress<'a>(
        &self,
        ledger: &'a mut UserLedger,
        user_id: u64,
        game_id: &str,
        now: OffsetDateTime,
    ) -> &'a mut GameProgressEntity {
        ledger
            .games
            .entry(game_id.to_owned())
            .or_insert_with(|| {
                debug!(user_id, game_id, "creating game progress");
                GameProgressEntity {
                    id: self.game_progress_ids.next(),
                    user_id,
                    game_id: game_id.to_owned(),
                    times_played: 0,
                    times_completed: 0,
                    best_score: 0,
                    last_played: now,
                    last_evaluation: None,
                    last_attempt_date: None,
                }
            })
    }
}

impl ProgressRepository for InMemoryProgressStore {
    fn create_user(&self, user: NewUserEntity) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let key = user.username.to_lowercase();
            let id = match inner.usernames.entry(key) {
                Entry::Occupied(_) => {
                    return Err(StorageError::Conflict(format!(
                        "username `{}` is already taken",
                        user.username
                    )));
                }
                Entry::Vacant(slot) => {
                    let id = inner.user_ids.next();
                    slot.insert(id);
                    id
                }
            };

            let entity = UserEntity {
                id,
                username: user.username,
                password_digest: user.password_digest,
                password_salt: user.password_salt,
                name: user.name,
                age: user.age,
                language: user.language,
                parent_email: user.parent_email,
                created_at: OffsetDateTime::now_utc(),
            };
            inner.users.insert(id, entity.clone());
            Ok(entity)
        })
    }

    fn find_user(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.users.get(&id).map(|entry| entry.value().clone())) })
    }

    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let id = inner
                .usernames
                .get(&username.to_lowercase())
                .map(|entry| *entry.value());
            Ok(id.and_then(|id| inner.users.get(&id).map(|entry| entry.value().clone())))
        })
    }

    fn user_progress_or_create(
        &self,
        user_id: u64,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<UserProgressEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let progress = inner
                .with_user_lock(user_id, |ledger| {
                    inner.user_progress(ledger, user_id, now).clone()
                })
                .await;
            Ok(progress)
        })
    }

    fn update_user_progress(
        &self,
        user_id: u64,
        patch: UserProgressPatch,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<UserProgressEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let progress = inner
                .with_user_lock(user_id, |ledger| {
                    let progress = inner.user_progress(ledger, user_id, now);
                    if let Some(value) = patch.today_stars {
                        progress.today_stars = value;
                    }
                    if let Some(value) = patch.streak {
                        progress.streak = value;
                    }
                    if let Some(value) = patch.words_learned {
                        progress.words_learned = value;
                    }
                    if let Some(value) = patch.games_completed {
                        progress.games_completed = value;
                    }
                    // Not a play: `last_active` only moves on completions.
                    progress.clone()
                })
                .await;
            Ok(progress)
        })
    }

    fn game_progress_or_create(
        &self,
        user_id: u64,
        game_id: String,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<GameProgressEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let progress = inner
                .with_user_lock(user_id, |ledger| {
                    inner.game_progress(ledger, user_id, &game_id, now).clone()
                })
                .await;
            Ok(progress)
        })
    }

    fn list_game_progress(
        &self,
        user_id: u64,
    ) -> BoxFuture<'static, StorageResult<Vec<GameProgressEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let records = inner
                .with_user_lock(user_id, |ledger| ledger.games.values().cloned().collect())
                .await;
            Ok(records)
        })
    }

    fn apply_game_completion(
        &self,
        user_id: u64,
        game_id: String,
        delta: GameCompletionDelta,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<GameProgressEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let updated = inner
                .with_user_lock(user_id, |ledger| {
                    let game = inner.game_progress(ledger, user_id, &game_id, now);
                    game.times_played = game.times_played.saturating_add(1);
                    if delta.completed {
                        game.times_completed = game.times_completed.saturating_add(1);
                    }
                    game.best_score = game.best_score.max(delta.score);
                    game.last_evaluation = delta.evaluation.clone();
                    game.last_attempt_date = Some(now);
                    game.last_played = now;
                    let updated = game.clone();

                    let progress = inner.user_progress(ledger, user_id, now);
                    streak::record_activity(progress, now.date());
                    progress.today_stars = progress.today_stars.saturating_add(delta.stars_earned);
                    progress.words_learned =
                        progress.words_learned.saturating_add(delta.words_learned);
                    if delta.completed {
                        progress.games_completed = progress.games_completed.saturating_add(1);
                    }
                    progress.last_active = now;

                    updated
                })
                .await;
            Ok(updated)
        })
    }

    fn record_speech_attempt(
        &self,
        attempt: NewSpeechAttempt,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<SpeechAttemptEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = SpeechAttemptEntity {
                id: inner.attempt_ids.next(),
                user_id: attempt.user_id,
                game_id: attempt.game_id,
                phrase_id: attempt.phrase_id,
                target_phrase: attempt.target_phrase,
                user_speech: attempt.user_speech,
                is_correct: attempt.is_correct,
                language: attempt.language,
                created_at: now,
            };
            inner
                .attempts
                .entry((entity.user_id, entity.game_id.clone()))
                .or_default()
                .push(entity.clone());
            Ok(entity)
        })
    }

    fn list_speech_attempts(
        &self,
        user_id: u64,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<SpeechAttemptEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .attempts
                .get(&(user_id, game_id))
                .map(|entry| entry.value().clone())
                .unwrap_or_default())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::catalog::Language;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn completion(completed: bool, score: u32, stars: u32, words: u32) -> GameCompletionDelta {
        GameCompletionDelta {
            completed,
            score,
            evaluation: Some(format!("{score}/5 correct")),
            stars_earned: stars,
            words_learned: words,
        }
    }

    fn new_user(username: &str) -> NewUserEntity {
        NewUserEntity {
            username: username.into(),
            password_digest: "digest".into(),
            password_salt: "salt".into(),
            name: "Asha".into(),
            age: Some(6),
            language: Language::En,
            parent_email: None,
        }
    }

    #[tokio::test]
    async fn reading_progress_twice_creates_one_record() {
        let store = InMemoryProgressStore::new();
        let first = store.user_progress_or_create(7, now()).await.unwrap();
        let second = store.user_progress_or_create(7, now()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.today_stars, 0);
        assert_eq!(first.games_completed, 0);
    }

    #[tokio::test]
    async fn completion_aggregates_into_both_records() {
        let store = InMemoryProgressStore::new();
        let game = store
            .apply_game_completion(1, "speakRepeat".into(), completion(true, 3, 2, 3), now())
            .await
            .unwrap();

        assert_eq!(game.times_played, 1);
        assert_eq!(game.times_completed, 1);
        assert_eq!(game.best_score, 3);
        assert_eq!(game.last_attempt_date, Some(now()));

        let user = store.user_progress_or_create(1, now()).await.unwrap();
        assert_eq!(user.today_stars, 2);
        assert_eq!(user.words_learned, 3);
        assert_eq!(user.games_completed, 1);
        assert_eq!(user.streak, 1);
    }

    #[tokio::test]
    async fn best_score_is_monotonic_and_plays_are_counted() {
        let store = InMemoryProgressStore::new();
        let mut previous_best = 0;
        for (n, score) in [2, 4, 1, 3].into_iter().enumerate() {
            let game = store
                .apply_game_completion(1, "wordMatch".into(), completion(true, score, 1, score), now())
                .await
                .unwrap();
            assert!(game.best_score >= previous_best);
            assert_eq!(game.times_played as usize, n + 1);
            previous_best = game.best_score;
        }
        assert_eq!(previous_best, 4);
    }

    #[tokio::test]
    async fn early_end_counts_play_but_not_completion() {
        let store = InMemoryProgressStore::new();
        let game = store
            .apply_game_completion(1, "storyTime".into(), completion(false, 1, 1, 1), now())
            .await
            .unwrap();
        assert_eq!((game.times_played, game.times_completed), (1, 0));

        let user = store.user_progress_or_create(1, now()).await.unwrap();
        assert_eq!(user.games_completed, 0);
        assert_eq!(user.words_learned, 1);
    }

    #[tokio::test]
    async fn evaluation_is_overwritten() {
        let store = InMemoryProgressStore::new();
        store
            .apply_game_completion(1, "wordMatch".into(), completion(true, 2, 2, 2), now())
            .await
            .unwrap();
        let mut delta = completion(true, 1, 1, 1);
        delta.evaluation = None;
        let game = store
            .apply_game_completion(1, "wordMatch".into(), delta, now())
            .await
            .unwrap();
        assert_eq!(game.last_evaluation, None);
        assert_eq!(game.best_score, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_completions_lose_no_increment() {
        let store = InMemoryProgressStore::new();
        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .apply_game_completion(1, "wordMatch".into(), completion(true, 1, 1, 1), now())
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let game = store
            .game_progress_or_create(1, "wordMatch".into(), now())
            .await
            .unwrap();
        let user = store.user_progress_or_create(1, now()).await.unwrap();
        assert_eq!(game.times_played, 64);
        assert_eq!(user.games_completed, 64);
        assert_eq!(user.today_stars, 64);
    }

    #[tokio::test]
    async fn new_day_resets_today_stars_and_grows_streak() {
        let store = InMemoryProgressStore::new();
        store
            .apply_game_completion(1, "wordMatch".into(), completion(true, 3, 2, 3), now())
            .await
            .unwrap();

        let tomorrow = now() + Duration::days(1);
        let before = store.user_progress_or_create(1, tomorrow).await.unwrap();
        assert_eq!(before.today_stars, 0);
        assert_eq!(before.streak, 1);

        store
            .apply_game_completion(1, "wordMatch".into(), completion(true, 3, 3, 3), tomorrow)
            .await
            .unwrap();
        let after = store.user_progress_or_create(1, tomorrow).await.unwrap();
        assert_eq!(after.today_stars, 3);
        assert_eq!(after.streak, 2);
        assert_eq!(after.words_learned, 6);
    }

    #[tokio::test]
    async fn patch_only_touches_given_counters() {
        let store = InMemoryProgressStore::new();
        store
            .apply_game_completion(1, "wordMatch".into(), completion(true, 3, 2, 3), now())
            .await
            .unwrap();
        let patched = store
            .update_user_progress(
                1,
                UserProgressPatch {
                    streak: Some(9),
                    ..Default::default()
                },
                now(),
            )
            .await
            .unwrap();
        assert_eq!(patched.streak, 9);
        assert_eq!(patched.today_stars, 2);
        assert_eq!(patched.games_completed, 1);
    }

    #[tokio::test]
    async fn patch_does_not_count_as_a_day_of_play() {
        let store = InMemoryProgressStore::new();
        store
            .apply_game_completion(1, "wordMatch".into(), completion(true, 3, 2, 3), now())
            .await
            .unwrap();

        let next_day = now() + Duration::days(1);
        let patched = store
            .update_user_progress(
                1,
                UserProgressPatch {
                    words_learned: Some(10),
                    ..Default::default()
                },
                next_day,
            )
            .await
            .unwrap();
        assert_eq!(patched.last_active, now());

        let two_days_later = now() + Duration::days(2);
        store
            .apply_game_completion(1, "wordMatch".into(), completion(true, 3, 2, 3), two_days_later)
            .await
            .unwrap();
        let progress = store.user_progress_or_create(1, two_days_later).await.unwrap();
        assert_eq!(progress.streak, 1);
        assert_eq!(progress.last_active, two_days_later);
    }

    #[tokio::test]
    async fn usernames_are_unique_case_insensitively() {
        let store = InMemoryProgressStore::new();
        let user = store.create_user(new_user("Asha")).await.unwrap();
        assert_eq!(user.id, 1);

        let err = store.create_user(new_user("asha")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        let found = store.find_user_by_username("ASHA".into()).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn attempts_are_listed_per_user_and_game_in_order() {
        let store = InMemoryProgressStore::new();
        for (user_id, phrase_id) in [(1, 1), (1, 2), (2, 1)] {
            store
                .record_speech_attempt(
                    NewSpeechAttempt {
                        user_id,
                        game_id: "wordMatch".into(),
                        phrase_id,
                        target_phrase: "apple".into(),
                        user_speech: Some("apple".into()),
                        is_correct: Some(true),
                        language: Language::En,
                    },
                    now(),
                )
                .await
                .unwrap();
        }

        let attempts = store.list_speech_attempts(1, "wordMatch".into()).await.unwrap();
        let phrases: Vec<_> = attempts.iter().map(|a| a.phrase_id).collect();
        assert_eq!(phrases, [1, 2]);
        assert!(store.list_speech_attempts(1, "storyTime".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ledger_lock_exposes_all_game_records() {
        let store = InMemoryProgressStore::new();
        for game in ["wordMatch", "storyTime"] {
            store
                .apply_game_completion(3, game.into(), completion(true, 1, 1, 1), now())
                .await
                .unwrap();
        }
        let count = store.with_user_lock(3, |ledger| ledger.games().count()).await;
        assert_eq!(count, 2);
        assert_eq!(store.list_game_progress(3).await.unwrap().len(), 2);
    }
}
