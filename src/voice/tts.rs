//! Text-to-speech (TTS) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::SpeechService;
use crate::{Error, Result};

/// Default ElevenLabs model, multilingual so Hinglish is pronounced naturally
pub const DEFAULT_TTS_MODEL: &str = "eleven_multilingual_v2";

/// Default voice identity for the persona
pub const DEFAULT_VOICE_ID: &str = "gO8Kb3hHPEPElVxVHDwT";

const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1";

/// ElevenLabs voice tuning
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.85,
        }
    }
}

/// Synthesizes speech from text with ElevenLabs
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    model: String,
    settings: VoiceSettings,
    base_url: String,
}

impl TextToSpeech {
    /// Create a new TTS instance using ElevenLabs
    ///
    /// # Errors
    ///
    /// Returns error if API key or voice id is missing
    pub fn new_elevenlabs(api_key: SecretString, voice_id: String) -> Result<Self> {
        Self::new_elevenlabs_with_model(api_key, voice_id, DEFAULT_TTS_MODEL.to_string())
    }

    /// Create a new TTS instance using ElevenLabs with custom model
    ///
    /// # Errors
    ///
    /// Returns error if API key or voice id is missing
    pub fn new_elevenlabs_with_model(
        api_key: SecretString,
        voice_id: String,
        model: String,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }
        if voice_id.trim().is_empty() {
            return Err(Error::Config("ElevenLabs voice id required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice: voice_id,
            model,
            settings: VoiceSettings::default(),
            base_url: ELEVENLABS_URL.to_string(),
        })
    }

    /// Override the voice tuning
    #[must_use]
    pub const fn with_settings(mut self, settings: VoiceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Voice identity used for synthesis
    #[must_use]
    pub fn voice_id(&self) -> &str {
        &self.voice
    }
}

#[async_trait]
impl SpeechService for TextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
            voice_settings: VoiceSettings,
        }

        if text.trim().is_empty() {
            return Err(Error::Tts("nothing to synthesize".to_string()));
        }

        let url = format!("{}/text-to-speech/{}", self.base_url, self.voice);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
            voice_settings: self.settings,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.expose_secret())
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "ElevenLabs API error");
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(Error::Tts("ElevenLabs returned no audio".to_string()));
        }

        tracing::debug!(audio_bytes = audio.len(), voice = %self.voice, "synthesis complete");
        Ok(audio.to_vec())
    }
}
