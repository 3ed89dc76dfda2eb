use std::time::Duration;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    catalog::{Game, Language, Phrase},
    dao::models::GameCompletionDelta,
    state::session_machine::{
        CompletionSummary, InvalidTransition, SessionEvent, SessionPhase, SessionStateMachine,
    },
};

/// A play-through hosted by the server on behalf of one user.
#[derive(Debug, Clone)]
pub struct PlaySession {
    id: Uuid,
    user_id: u64,
    game: Game,
    language: Language,
    machine: SessionStateMachine,
    started_at: OffsetDateTime,
    last_feedback: Option<String>,
    last_activity: OffsetDateTime,
    reported_at: Option<OffsetDateTime>,
}

impl PlaySession {
    /// Create a session for `game` and start it at the first phrase.
    pub fn start(
        user_id: u64,
        game: Game,
        language: Language,
        now: OffsetDateTime,
    ) -> Result<Self, InvalidTransition> {
        let mut machine = SessionStateMachine::new(game.total_phrases());
        machine.apply(SessionEvent::Start)?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            game,
            language,
            machine,
            started_at: now,
            last_feedback: None,
            last_activity: now,
            reported_at: None,
        })
    }

    /// Session identifier handed to the client.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owner of the session.
    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// Game being played.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Language the phrases are presented in.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Underlying state machine.
    pub fn machine(&self) -> &SessionStateMachine {
        &self.machine
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    /// When the session was started.
    pub fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    /// Feedback from the last evaluation, if any.
    pub fn last_feedback(&self) -> Option<&str> {
        self.last_feedback.as_deref()
    }

    /// Whether the completion has already been handed to the progress store.
    pub fn is_reported(&self) -> bool {
        self.reported_at.is_some()
    }

    /// Last time the learner acted on the session.
    pub fn last_activity(&self) -> OffsetDateTime {
        self.last_activity
    }

    /// Record learner activity at `now`.
    pub fn touch(&mut self, now: OffsetDateTime) {
        self.last_activity = self.last_activity.max(now);
    }

    /// Whether the session can be dropped at `now`.
    ///
    /// Reported sessions are kept for `retention` so the final snapshot stays readable; any
    /// other session goes once it has been idle for `idle_ttl`.
    pub fn is_expired(&self, now: OffsetDateTime, retention: Duration, idle_ttl: Duration) -> bool {
        match self.reported_at {
            Some(reported_at) => now - reported_at >= retention,
            None => now - self.last_activity >= idle_ttl,
        }
    }

    /// Phrase currently presented or judged.
    pub fn current_phrase(&self) -> Option<&Phrase> {
        self.phase()
            .phrase_index()
            .and_then(|index| self.game.phrase(index))
    }

    /// Target text of the current phrase in the session language.
    pub fn current_target(&self) -> Option<&str> {
        self.current_phrase()
            .map(|phrase| phrase.text_in(self.language))
    }

    /// Feed one event to the state machine.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        self.machine.apply(event)
    }

    /// Remember the message shown to the learner.
    pub fn set_feedback(&mut self, feedback: impl Into<String>) {
        self.last_feedback = Some(feedback.into());
    }

    /// Advance the play clock by one second; `false` once the session is over.
    pub fn tick(&mut self) -> bool {
        self.machine.tick()
    }

    /// Completion summary, available once the session is over.
    pub fn summary(&self) -> Option<CompletionSummary> {
        self.machine.summary()
    }

    /// Delta to report, if the session is complete and has not been reported yet.
    pub fn pending_report(&self) -> Option<GameCompletionDelta> {
        if self.is_reported() {
            return None;
        }
        self.summary().map(|summary| GameCompletionDelta {
            completed: summary.completed,
            score: summary.score,
            evaluation: Some(summary.evaluation),
            stars_earned: summary.stars_earned,
            words_learned: summary.words_learned,
        })
    }

    /// Record that the completion reached the store; later reports are suppressed.
    pub fn mark_reported(&mut self, now: OffsetDateTime) {
        self.reported_at = Some(now);
        self.touch(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn session(game_id: &str) -> PlaySession {
        let catalog = Catalog::builtin();
        let game = catalog.get(game_id).unwrap().clone();
        PlaySession::start(7, game, Language::Hi, OffsetDateTime::UNIX_EPOCH).unwrap()
    }

    #[test]
    fn starts_presenting_the_first_phrase_in_the_session_language() {
        let session = session("wordMatch");
        assert_eq!(session.phase(), SessionPhase::Presenting { phrase_index: 0 });
        let first = &session.game().phrases[0];
        assert_eq!(session.current_target(), Some(first.text_hi.as_str()));
    }

    #[test]
    fn report_is_handed_out_until_marked() {
        let mut session = session("speakRepeat");
        assert!(session.pending_report().is_none());

        session.apply(SessionEvent::End).unwrap();
        let delta = session.pending_report().unwrap();
        assert!(!delta.completed);
        assert_eq!(delta.evaluation.as_deref(), Some("0/5 correct (0.0%)"));

        session.mark_reported(OffsetDateTime::UNIX_EPOCH);
        assert!(session.pending_report().is_none());
        assert!(session.is_reported());
    }

    #[test]
    fn expiry_depends_on_whether_the_session_was_reported() {
        let retention = Duration::from_secs(60);
        let idle_ttl = Duration::from_secs(600);
        let start = OffsetDateTime::UNIX_EPOCH;
        let mut session = session("wordMatch");

        let later = start + time::Duration::seconds(120);
        assert!(!session.is_expired(later, retention, idle_ttl));
        assert!(session.is_expired(start + time::Duration::seconds(600), retention, idle_ttl));

        session.touch(later);
        assert!(!session.is_expired(start + time::Duration::seconds(600), retention, idle_ttl));

        session.apply(SessionEvent::End).unwrap();
        session.mark_reported(later);
        assert!(!session.is_expired(later + time::Duration::seconds(59), retention, idle_ttl));
        assert!(session.is_expired(later + time::Duration::seconds(60), retention, idle_ttl));
    }
}
