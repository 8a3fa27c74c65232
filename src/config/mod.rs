//! Configuration management for the Krishna voice companion
//!
//! Precedence: environment → config file → built-in defaults.

pub mod file;

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::llm::retry::DEFAULT_CALL_TIMEOUT;
use crate::llm::{DEFAULT_GEMINI_URL, DEFAULT_MODEL, GeminiClient, RetryPolicy, RetryingModel};
use crate::reply::ReplyService;
use crate::voice::{
    Conversation, DEFAULT_STT_MODEL, DEFAULT_TTS_MODEL, DEFAULT_VOICE_ID, SpeechToText,
    TextToSpeech, VoiceSettings,
};
use crate::{Error, Result};

use self::file::KrishnaConfigFile;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8501;

/// Krishna configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Language model configuration
    pub llm: LlmConfig,

    /// Backoff for model calls
    pub retry: RetryPolicy,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// HTTP API server configuration
    pub server: ServerConfig,
}

/// Language model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Gemini API key (from `GEMINI_API_KEY`)
    pub api_key: SecretString,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Time budget for a single model call
    pub timeout: Duration,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// `OpenAI` key for Whisper STT
    pub openai_api_key: Option<SecretString>,

    /// ElevenLabs key for TTS
    pub elevenlabs_api_key: Option<SecretString>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "eleven_multilingual_v2")
    pub tts_model: String,

    /// ElevenLabs voice identifier
    pub voice_id: String,

    /// Voice tuning
    pub settings: VoiceSettings,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if no Gemini API key is configured
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if no Gemini API key is configured or a value is invalid
    pub fn from_sources(fc: KrishnaConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = non_empty(env("GEMINI_API_KEY").or(fc.api_keys.gemini)).ok_or_else(|| {
            Error::Config("GEMINI_API_KEY is not set (env or [api_keys].gemini)".to_string())
        })?;

        let llm = LlmConfig {
            api_key: SecretString::from(api_key),
            model: non_empty(env("KRISHNA_LLM_MODEL").or(fc.llm.model))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: fc.llm.base_url.unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string()),
            timeout: fc
                .llm
                .timeout_secs
                .map_or(DEFAULT_CALL_TIMEOUT, Duration::from_secs),
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: fc.retry.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            base_delay: fc
                .retry
                .base_delay_ms
                .map_or(defaults.base_delay, Duration::from_millis),
            max_delay: fc
                .retry
                .max_delay_ms
                .map_or(defaults.max_delay, Duration::from_millis),
        };

        let settings = VoiceSettings {
            stability: fc.voice.stability.unwrap_or(VoiceSettings::default().stability),
            similarity_boost: fc
                .voice
                .similarity_boost
                .unwrap_or(VoiceSettings::default().similarity_boost),
        };

        let voice = VoiceConfig {
            openai_api_key: non_empty(env("OPENAI_API_KEY").or(fc.api_keys.openai)).map(SecretString::from),
            elevenlabs_api_key: non_empty(env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs))
                .map(SecretString::from),
            stt_model: fc.voice.stt_model.unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            tts_model: fc.voice.tts_model.unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            voice_id: non_empty(env("KRISHNA_VOICE_ID").or(fc.voice.voice_id))
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            settings,
        };

        let port = match env("KRISHNA_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid KRISHNA_PORT: {raw}")))?,
            None => fc.server.port.unwrap_or(DEFAULT_PORT),
        };

        Ok(Self {
            llm,
            retry,
            voice,
            server: ServerConfig { port },
        })
    }

    /// Build the reply pipeline on a retrying Gemini client
    ///
    /// # Errors
    ///
    /// Returns error if the model client cannot be created
    pub fn reply_service(&self) -> Result<ReplyService> {
        let client = GeminiClient::with_base_url(
            self.llm.api_key.clone(),
            self.llm.model.clone(),
            self.llm.base_url.clone(),
        )?;
        let model = RetryingModel::new(client, self.retry.clone()).with_timeout(self.llm.timeout);

        tracing::debug!(model = %self.llm.model, attempts = self.retry.max_attempts, "reply service ready");
        Ok(ReplyService::new(Arc::new(model)))
    }

    /// Build the voice conversation, if both voice keys are configured
    ///
    /// # Errors
    ///
    /// Returns error if a configured client cannot be created
    pub fn conversation(&self, replies: ReplyService) -> Result<Option<Conversation>> {
        let (Some(openai), Some(elevenlabs)) = (
            self.voice.openai_api_key.clone(),
            self.voice.elevenlabs_api_key.clone(),
        ) else {
            tracing::info!("voice keys not configured, spoken conversation disabled");
            return Ok(None);
        };

        let stt = SpeechToText::new_whisper(openai, self.voice.stt_model.clone())?;
        let tts = TextToSpeech::new_elevenlabs_with_model(
            elevenlabs,
            self.voice.voice_id.clone(),
            self.voice.tts_model.clone(),
        )?
        .with_settings(self.voice.settings);

        Ok(Some(Conversation::new(replies, Arc::new(stt), Arc::new(tts))))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_gemini_key_is_fatal() {
        let err = Config::from_sources(KrishnaConfigFile::default(), env_of(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let blank = Config::from_sources(KrishnaConfigFile::default(), env_of(&[("GEMINI_API_KEY", " ")]));
        assert!(blank.is_err());
    }

    #[test]
    fn defaults_apply() {
        let config =
            Config::from_sources(KrishnaConfigFile::default(), env_of(&[("GEMINI_API_KEY", "g")])).unwrap();

        assert_eq!(config.llm.api_key.expose_secret(), "g");
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.timeout, DEFAULT_CALL_TIMEOUT);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(500));
        assert_eq!(config.voice.voice_id, DEFAULT_VOICE_ID);
        assert_eq!(config.voice.tts_model, DEFAULT_TTS_MODEL);
        assert!(config.voice.openai_api_key.is_none());
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn env_overrides_file() {
        let mut fc = KrishnaConfigFile::default();
        fc.api_keys.gemini = Some("file-key".to_string());
        fc.llm.model = Some("file-model".to_string());
        fc.server.port = Some(9000);

        let config = Config::from_sources(
            fc,
            env_of(&[("GEMINI_API_KEY", "env-key"), ("KRISHNA_LLM_MODEL", "env-model")]),
        )
        .unwrap();

        assert_eq!(config.llm.api_key.expose_secret(), "env-key");
        assert_eq!(config.llm.model, "env-model");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let result = Config::from_sources(
            KrishnaConfigFile::default(),
            env_of(&[("GEMINI_API_KEY", "g"), ("KRISHNA_PORT", "not-a-port")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn conversation_requires_both_voice_keys() {
        let config = Config::from_sources(
            KrishnaConfigFile::default(),
            env_of(&[("GEMINI_API_KEY", "g"), ("OPENAI_API_KEY", "o")]),
        )
        .unwrap();
        let replies = config.reply_service().unwrap();
        assert!(config.conversation(replies.clone()).unwrap().is_none());

        let config = Config::from_sources(
            KrishnaConfigFile::default(),
            env_of(&[("GEMINI_API_KEY", "g"), ("OPENAI_API_KEY", "o"), ("ELEVENLABS_API_KEY", "e")]),
        )
        .unwrap();
        assert!(config.conversation(replies).unwrap().is_some());
    }
}
