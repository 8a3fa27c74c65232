//! One spoken exchange: audio in, reply text and audio out

use std::sync::Arc;

use super::{SpeechService, Transcriber};
use crate::reply::{Reply, ReplyService};
use crate::{Error, Result};

/// Result of a single conversational turn
#[derive(Debug, Clone)]
pub struct Turn {
    /// What the user said, as transcribed
    pub transcript: String,
    /// What Krishna answers
    pub reply: Reply,
    /// Spoken reply (MP3), absent when synthesis failed
    pub audio: Option<Vec<u8>>,
    /// Why synthesis failed, if it did
    pub synthesis_error: Option<String>,
}

/// Runs transcribe → reply → synthesize for one recording
#[derive(Clone)]
pub struct Conversation {
    replies: ReplyService,
    transcriber: Arc<dyn Transcriber>,
    speech: Arc<dyn SpeechService>,
}

impl Conversation {
    #[must_use]
    pub fn new(
        replies: ReplyService,
        transcriber: Arc<dyn Transcriber>,
        speech: Arc<dyn SpeechService>,
    ) -> Self {
        Self {
            replies,
            transcriber,
            speech,
        }
    }

    /// Process one recorded utterance
    ///
    /// A synthesis failure still yields the reply text.
    ///
    /// # Errors
    ///
    /// Returns error if the audio is unusable, transcription fails, or the
    /// transcript is empty ([`Error::NoSpeech`])
    pub async fn turn(&self, audio: &[u8]) -> Result<Turn> {
        let transcript = self.transcriber.transcribe(audio).await?;
        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            tracing::info!("no speech detected in recording");
            return Err(Error::NoSpeech);
        }

        let reply = self.replies.respond(&transcript).await;

        let (audio, synthesis_error) = match self.speech.synthesize(&reply.text).await {
            Ok(audio) => (Some(audio), None),
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis failed, returning text only");
                (None, Some(e.to_string()))
            }
        };

        Ok(Turn {
            transcript,
            reply,
            audio,
            synthesis_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::llm::fake::FakeModel;
    use crate::reply::{FALLBACK_GREETING, ReplyOutcome};

    struct FixedTranscript(&'static str);

    #[async_trait]
    impl Transcriber for FixedTranscript {
        async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct EchoSpeech;

    #[async_trait]
    impl SpeechService for EchoSpeech {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            Ok(text.as_bytes().to_vec())
        }
    }

    struct BrokenSpeech;

    #[async_trait]
    impl SpeechService for BrokenSpeech {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Err(Error::Tts("voice not found".to_string()))
        }
    }

    fn replies() -> ReplyService {
        ReplyService::new(Arc::new(FakeModel::replying("unused")))
    }

    #[tokio::test]
    async fn greeting_turn_speaks_fallback() {
        let conversation = Conversation::new(replies(), Arc::new(FixedTranscript(" Hello ")), Arc::new(EchoSpeech));

        let turn = conversation.turn(b"audio").await.unwrap();
        assert_eq!(turn.transcript, "Hello");
        assert_eq!(turn.reply.outcome, ReplyOutcome::Greeting);
        assert_eq!(turn.audio.as_deref(), Some(FALLBACK_GREETING.as_bytes()));
        assert!(turn.synthesis_error.is_none());
    }

    #[tokio::test]
    async fn silent_recording_is_reported() {
        let conversation = Conversation::new(replies(), Arc::new(FixedTranscript("   ")), Arc::new(EchoSpeech));
        assert!(matches!(conversation.turn(b"audio").await, Err(Error::NoSpeech)));
    }

    #[tokio::test]
    async fn synthesis_failure_keeps_reply_text() {
        let conversation = Conversation::new(replies(), Arc::new(FixedTranscript("namaste")), Arc::new(BrokenSpeech));

        let turn = conversation.turn(b"audio").await.unwrap();
        assert_eq!(turn.reply.text, FALLBACK_GREETING);
        assert!(turn.audio.is_none());
        assert!(turn.synthesis_error.unwrap().contains("voice not found"));
    }
}
