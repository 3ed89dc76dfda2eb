use thiserror::Error;
use uuid::Uuid;

/// Identifier handed out when an utterance is submitted; the verdict must echo it back.
pub type AttemptId = Uuid;

/// Phases of one play-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created but not started yet.
    Idle,
    /// Waiting for the learner to speak the phrase at `phrase_index`.
    Presenting {
        /// Index into the game's phrase list.
        phrase_index: usize,
    },
    /// An utterance for `phrase_index` is with the speech evaluator.
    Evaluating {
        /// Index into the game's phrase list.
        phrase_index: usize,
        /// Attempt whose verdict is awaited.
        attempt_id: AttemptId,
    },
    /// The phrase was spoken correctly; feedback is being shown.
    Correct {
        /// Index into the game's phrase list.
        phrase_index: usize,
    },
    /// The phrase was not recognized; feedback is being shown before a retry.
    Incorrect {
        /// Index into the game's phrase list.
        phrase_index: usize,
    },
    /// Terminal phase.
    Completed(CompletionReason),
}

impl SessionPhase {
    /// Wire name of the phase.
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Presenting { .. } => "presenting",
            SessionPhase::Evaluating { .. } => "evaluating",
            SessionPhase::Correct { .. } => "correct",
            SessionPhase::Incorrect { .. } => "incorrect",
            SessionPhase::Completed(_) => "completed",
        }
    }

    /// Phrase the phase refers to, if any.
    pub fn phrase_index(&self) -> Option<usize> {
        match *self {
            SessionPhase::Presenting { phrase_index }
            | SessionPhase::Evaluating { phrase_index, .. }
            | SessionPhase::Correct { phrase_index }
            | SessionPhase::Incorrect { phrase_index } => Some(phrase_index),
            SessionPhase::Idle | SessionPhase::Completed(_) => None,
        }
    }

    /// Whether no further event is accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Completed(_))
    }
}

/// Why a session reached [`SessionPhase::Completed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The last phrase was answered correctly or skipped.
    ReachedEnd,
    /// The learner stopped before the end of the phrase list.
    EndedEarly,
}

/// Events that can be applied to a [`SessionStateMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Begin the play-through at the first phrase.
    Start,
    /// An utterance was captured and sent for evaluation.
    SubmitAttempt(AttemptId),
    /// The evaluator judged the attempt.
    Verdict {
        /// Attempt the verdict belongs to.
        attempt_id: AttemptId,
        /// Whether the utterance matched the phrase.
        is_correct: bool,
    },
    /// The evaluator could not judge the attempt; the learner may retry.
    EvaluationFailed {
        /// Attempt that failed.
        attempt_id: AttemptId,
    },
    /// The feedback display delay is over.
    FeedbackElapsed,
    /// Give up on the current phrase.
    Skip,
    /// Stop the session now.
    End,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in.
    pub from: SessionPhase,
    /// Rejected event.
    pub event: SessionEvent,
}

/// Outcome of a completed session, computed once the machine is terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSummary {
    /// Whether the learner reached the end of the phrase list.
    pub completed: bool,
    /// Number of phrases answered correctly.
    pub score: u32,
    /// Phrases in the game.
    pub total_phrases: u32,
    /// `ceil(score / total * 3)`, always within `0..=3`.
    pub stars_earned: u32,
    /// Phrases answered or skipped.
    pub attempts_count: u32,
    /// Phrases skipped.
    pub skipped_count: u32,
    /// Seconds spent actively playing.
    pub time_spent: u64,
    /// `score / total` in `0.0..=1.0`.
    pub accuracy: f64,
    /// Human readable one-liner, e.g. `3/5 correct (60.0%)`.
    pub evaluation: String,
    /// Words answered correctly.
    pub words_learned: u32,
}

/// Stars for a score: `ceil(score / total * 3)` in integer arithmetic.
pub fn stars_for(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = score.min(total);
    (score * 3).div_ceil(total)
}

/// Pure, synchronous state machine for one play-through of a game.
///
/// Tracks the phrase cursor, which phrases were answered or skipped, and elapsed time.
/// A phrase index appears at most once across the correct and skipped lists, so
/// `correct + skipped <= total` always holds, and the machine can only complete once.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    total_phrases: usize,
    correct: Vec<usize>,
    skipped: Vec<usize>,
    elapsed_seconds: u64,
}

impl SessionStateMachine {
    /// Create an idle machine for a game with `total_phrases` phrases.
    pub fn new(total_phrases: usize) -> Self {
        Self {
            phase: SessionPhase::Idle,
            total_phrases,
            correct: Vec::new(),
            skipped: Vec::new(),
            elapsed_seconds: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Phrases in the game.
    pub fn total_phrases(&self) -> usize {
        self.total_phrases
    }

    /// Indices answered correctly, in answer order.
    pub fn correct_indices(&self) -> &[usize] {
        &self.correct
    }

    /// Indices skipped, in skip order.
    pub fn skipped_indices(&self) -> &[usize] {
        &self.skipped
    }

    /// Seconds accrued while active.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Whether the session is started and not yet completed.
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, SessionPhase::Idle | SessionPhase::Completed(_))
    }

    /// Advance elapsed time by one second while active. Returns whether time accrued.
    pub fn tick(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.elapsed_seconds += 1;
        true
    }

    /// Apply an event, updating counters and returning the new phase.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;

        match (self.phase, event) {
            (SessionPhase::Idle, SessionEvent::Start) => {
                self.correct.clear();
                self.skipped.clear();
                self.elapsed_seconds = 0;
            }
            (
                SessionPhase::Evaluating { phrase_index, .. },
                SessionEvent::Verdict {
                    is_correct: true, ..
                },
            ) => {
                if !self.skipped.contains(&phrase_index) && !self.correct.contains(&phrase_index) {
                    self.correct.push(phrase_index);
                }
            }
            (SessionPhase::Presenting { phrase_index }, SessionEvent::Skip) => {
                if !self.correct.contains(&phrase_index) && !self.skipped.contains(&phrase_index) {
                    self.skipped.push(phrase_index);
                }
            }
            _ => {}
        }

        self.phase = next;
        Ok(next)
    }

    /// Completion outcome, available once the machine is terminal.
    pub fn summary(&self) -> Option<CompletionSummary> {
        let SessionPhase::Completed(reason) = self.phase else {
            return None;
        };

        let score = self.correct.len() as u32;
        let total = self.total_phrases as u32;
        let skipped_count = self.skipped.len() as u32;
        let accuracy = if total == 0 {
            0.0
        } else {
            f64::from(score) / f64::from(total)
        };

        Some(CompletionSummary {
            completed: reason == CompletionReason::ReachedEnd,
            score,
            total_phrases: total,
            stars_earned: stars_for(score, total),
            attempts_count: score + skipped_count,
            skipped_count,
            time_spent: self.elapsed_seconds,
            accuracy,
            evaluation: format!("{score}/{total} correct ({:.1}%)", accuracy * 100.0),
            words_learned: score,
        })
    }

    /// Phase following `index`: the next phrase, or completion after the last one.
    fn advance_from(&self, index: usize) -> SessionPhase {
        let next = index + 1;
        if next >= self.total_phrases {
            SessionPhase::Completed(CompletionReason::ReachedEnd)
        } else {
            SessionPhase::Presenting { phrase_index: next }
        }
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::Idle, SessionEvent::Start) if self.total_phrases == 0 => {
                SessionPhase::Completed(CompletionReason::ReachedEnd)
            }
            (SessionPhase::Idle, SessionEvent::Start) => {
                SessionPhase::Presenting { phrase_index: 0 }
            }
            (SessionPhase::Presenting { phrase_index }, SessionEvent::SubmitAttempt(attempt_id)) => {
                SessionPhase::Evaluating {
                    phrase_index,
                    attempt_id,
                }
            }
            (
                SessionPhase::Evaluating {
                    phrase_index,
                    attempt_id: pending,
                },
                SessionEvent::Verdict {
                    attempt_id,
                    is_correct,
                },
            ) if pending == attempt_id => {
                if is_correct {
                    SessionPhase::Correct { phrase_index }
                } else {
                    SessionPhase::Incorrect { phrase_index }
                }
            }
            (
                SessionPhase::Evaluating {
                    phrase_index,
                    attempt_id: pending,
                },
                SessionEvent::EvaluationFailed { attempt_id },
            ) if pending == attempt_id => SessionPhase::Presenting { phrase_index },
            (SessionPhase::Correct { phrase_index }, SessionEvent::FeedbackElapsed) => {
                self.advance_from(phrase_index)
            }
            (SessionPhase::Incorrect { phrase_index }, SessionEvent::FeedbackElapsed) => {
                SessionPhase::Presenting { phrase_index }
            }
            (SessionPhase::Presenting { phrase_index }, SessionEvent::Skip) => {
                self.advance_from(phrase_index)
            }
            // The last phrase is already answered; ending now is the same as waiting.
            (SessionPhase::Correct { phrase_index }, SessionEvent::End)
                if phrase_index + 1 >= self.total_phrases =>
            {
                SessionPhase::Completed(CompletionReason::ReachedEnd)
            }
            (from, SessionEvent::End) if !from.is_terminal() => {
                SessionPhase::Completed(CompletionReason::EndedEarly)
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
