//! Voice collaborators around the reply pipeline
//!
//! Recording validation, speech-to-text and text-to-speech. Capture and
//! playback happen in the client; this side only sees audio bytes.

mod conversation;
pub mod recording;
mod stt;
mod tts;

use async_trait::async_trait;

pub use conversation::{Conversation, Turn};
pub use recording::{SAMPLE_RATE, prepare_for_transcription, samples_to_wav, validate_recording};
pub use stt::{DEFAULT_STT_MODEL, SpeechToText};
pub use tts::{DEFAULT_TTS_MODEL, DEFAULT_VOICE_ID, TextToSpeech, VoiceSettings};

use crate::Result;

/// Converts a recorded utterance to text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe raw audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if the audio is empty, unreadable or the provider fails
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Converts reply text to playable audio
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Synthesize `text` as MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
