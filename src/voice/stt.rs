//! Speech-to-text (STT) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::Transcriber;
use super::recording::{is_wav, prepare_for_transcription};
use crate::{Error, Result};

/// Default Whisper model
pub const DEFAULT_STT_MODEL: &str = "whisper-1";

/// Biases Whisper towards code-mixed Hindi/English vocabulary
const HINGLISH_PROMPT: &str =
    "Hinglish conversation mixing Hindi and English naturally. Speaker uses both languages interchangeably.";

const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech to text with `OpenAI` Whisper
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    url: String,
}

impl SpeechToText {
    /// Create a new STT instance using `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_whisper(api_key: SecretString, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            url: WHISPER_URL.to_string(),
        })
    }

    /// Point the client at a compatible transcription endpoint
    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let prepared = prepare_for_transcription(audio)?;
        let (file_name, mime) = if is_wav(&prepared) {
            ("audio.wav", "audio/wav")
        } else {
            ("audio.webm", "audio/webm")
        };

        tracing::debug!(audio_bytes = prepared.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(prepared)
                    .file_name(file_name)
                    .mime_str(mime)
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("prompt", HINGLISH_PROMPT)
            .text("temperature", "0");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            e
        })?;

        let transcript = result.text.trim().to_string();
        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_api_key() {
        let err = SpeechToText::new_whisper(SecretString::from(String::new()), DEFAULT_STT_MODEL.to_string());
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn empty_audio_fails_before_any_request() {
        let stt = SpeechToText::new_whisper(SecretString::from("key".to_string()), DEFAULT_STT_MODEL.to_string())
            .unwrap()
            .with_url("http://127.0.0.1:9/unreachable".to_string());

        assert!(matches!(stt.transcribe(&[]).await, Err(Error::Stt(_))));
    }
}
