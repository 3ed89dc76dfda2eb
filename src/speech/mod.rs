//! Speech evaluation capability injected into hosted sessions.
//!
//! An evaluator turns an utterance into a [`Verdict`] for the phrase being practised. Two
//! implementations exist: [`device::DeviceTranscriptEvaluator`] trusts the transcript produced
//! by the learner's device, [`remote::RemoteModelEvaluator`] sends raw audio to a transcription
//! model over HTTP.

/// Evaluator for transcripts recognized on the device.
pub mod device;
pub mod matching;
#[cfg(feature = "remote-evaluator")]
/// Evaluator backed by a remote transcription model.
pub mod remote;

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::config::EvaluatorConfig;

/// What the learner said, as captured by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utterance {
    /// Text recognized on the learner's device.
    Transcript(String),
    /// Encoded audio bytes recorded by the client.
    Audio(Vec<u8>),
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Whether the utterance matched the target.
    pub is_correct: bool,
    /// 0.0..=1.0 estimate of how close the utterance was.
    pub confidence: f32,
    /// Message to show the learner.
    pub feedback: String,
    /// Normalized transcript that was judged.
    pub transcript: String,
}

/// Evaluation failures. All of them are retryable by the learner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// Raw audio reached an evaluator that only judges transcripts.
    #[error("no transcript captured; please try again")]
    NoTranscript,
    /// The recording was empty.
    #[error("no audio captured; please try again")]
    NoAudio,
    /// The transcription service failed.
    #[error("speech service unreachable: {0}")]
    Backend(String),
    /// The evaluation took longer than the configured timeout.
    #[error("speech evaluation timed out")]
    Timeout,
}

/// Judges a learner's utterance against a target phrase.
pub trait SpeechEvaluator: Send + Sync {
    /// Judge `utterance` against `target_phrase`.
    fn evaluate(
        &self,
        utterance: Utterance,
        target_phrase: String,
    ) -> BoxFuture<'static, Result<Verdict, EvaluationError>>;
}

/// Build the evaluator selected by configuration.
pub fn build_evaluator(config: &EvaluatorConfig) -> Arc<dyn SpeechEvaluator> {
    match config {
        EvaluatorConfig::Device => Arc::new(device::DeviceTranscriptEvaluator),
        #[cfg(feature = "remote-evaluator")]
        EvaluatorConfig::Remote { url } => Arc::new(remote::RemoteModelEvaluator::new(url.clone())),
        #[cfg(not(feature = "remote-evaluator"))]
        EvaluatorConfig::Remote { url } => {
            tracing::warn!(
                %url,
                "remote evaluator requested but the `remote-evaluator` feature is disabled; using device transcripts"
            );
            Arc::new(device::DeviceTranscriptEvaluator)
        }
    }
}
