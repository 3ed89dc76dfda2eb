use futures::future::BoxFuture;

use super::{EvaluationError, SpeechEvaluator, Utterance, Verdict, matching};

/// Evaluator for device-native recognition: the client sends what its recognizer heard.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceTranscriptEvaluator;

impl SpeechEvaluator for DeviceTranscriptEvaluator {
    fn evaluate(
        &self,
        utterance: Utterance,
        target_phrase: String,
    ) -> BoxFuture<'static, Result<Verdict, EvaluationError>> {
        Box::pin(async move {
            match utterance {
                Utterance::Transcript(text) => Ok(matching::judge(&text, &target_phrase)),
                Utterance::Audio(_) => Err(EvaluationError::NoTranscript),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn judges_transcripts() {
        let verdict = DeviceTranscriptEvaluator
            .evaluate(Utterance::Transcript("Apple".into()), "apple".into())
            .await
            .unwrap();
        assert!(verdict.is_correct);
    }

    #[tokio::test]
    async fn raw_audio_needs_a_server_model() {
        let err = DeviceTranscriptEvaluator
            .evaluate(Utterance::Audio(vec![0, 1, 2]), "apple".into())
            .await
            .unwrap_err();
        assert_eq!(err, EvaluationError::NoTranscript);
    }
}
