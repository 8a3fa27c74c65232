//! Error types for the Krishna voice companion

use std::time::Duration;

use thiserror::Error;

use crate::llm::retry::is_recoverable;

/// Result type alias for Krishna operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing a spoken reply
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Language model quota or rate limit exhausted
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Provider-suggested wait before the next attempt
        retry_after: Option<Duration>,
    },

    /// A single model call exceeded its time budget
    #[error("language model call timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success response from an upstream API
    #[error("upstream error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Language model error
    #[error("llm error: {0}")]
    Llm(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Transcription produced no words
    #[error("no speech detected")]
    NoSpeech,

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this is a quota / rate-limit failure that must reach the caller
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether the failed call is worth repeating after a backoff
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) => true,
            Self::Upstream { status, body } => is_recoverable(*status, body),
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Provider-suggested wait, if any
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
