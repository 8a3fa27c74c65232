//! Krishna - voice companion for Hinglish speakers
//!
//! This library provides the core functionality behind the Krishna voice companion:
//! - Reply pipeline (normalization, intent classification, persona response)
//! - Language model access with bounded retry and backoff
//! - Voice collaborators (recording validation, STT, TTS)
//! - HTTP API for text and spoken turns
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │          Browser recorder / player, CLI             │
//! └────────────────────┬────────────────────────────────┘
//!                      │ audio bytes / text
//! ┌────────────────────▼────────────────────────────────┐
//! │   Conversation: STT ─► ReplyService ─► TTS          │
//! │   ReplyService: normalize ─► classify ─► generate   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   Gemini  │  Whisper  │  ElevenLabs                 │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod reply;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use llm::{GeminiClient, LanguageModel, RetryPolicy, RetryingModel, SharedModel};
pub use reply::{
    FALLBACK_GREETING, IntentClassifier, IntentLabel, Reply, ReplyOutcome, ReplyService,
    ResponseGenerator, TextNormalizer, UNAVAILABLE_MESSAGE,
};
pub use voice::{Conversation, SpeechService, SpeechToText, TextToSpeech, Transcriber, Turn};
