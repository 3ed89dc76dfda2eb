use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{EvaluationError, SpeechEvaluator, Utterance, Verdict, matching};

/// Response body expected from the transcription endpoint.
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Evaluator backed by a server-side transcription model reachable over HTTP.
///
/// Audio is posted as `application/octet-stream`; the endpoint answers `{ "text": "..." }`.
#[derive(Clone)]
pub struct RemoteModelEvaluator {
    client: Client,
    url: Arc<str>,
}

impl RemoteModelEvaluator {
    /// Evaluator posting audio to the transcription endpoint at `url`.
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url: Arc::from(url),
        }
    }

    async fn transcribe(
        client: Client,
        url: Arc<str>,
        audio: Vec<u8>,
    ) -> Result<String, EvaluationError> {
        let response = client
            .post(url.as_ref())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, url = %url, "transcription request failed");
                EvaluationError::Backend(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, url = %url, "transcription endpoint returned an error");
            return Err(EvaluationError::Backend(format!(
                "transcription endpoint answered {status}"
            )));
        }

        let body = response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|err| EvaluationError::Backend(err.to_string()))?;
        debug!(transcript = %body.text, "remote transcription received");
        Ok(body.text)
    }
}

impl SpeechEvaluator for RemoteModelEvaluator {
    fn evaluate(
        &self,
        utterance: Utterance,
        target_phrase: String,
    ) -> BoxFuture<'static, Result<Verdict, EvaluationError>> {
        let client = self.client.clone();
        let url = self.url.clone();
        Box::pin(async move {
            let transcript = match utterance {
                Utterance::Transcript(text) => text,
                Utterance::Audio(audio) if audio.is_empty() => {
                    return Err(EvaluationError::NoAudio);
                }
                Utterance::Audio(audio) => Self::transcribe(client, url, audio).await?,
            };
            Ok(matching::judge(&transcript, &target_phrase))
        })
    }
}
