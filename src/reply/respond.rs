//! Persona response generation

use super::greetings::FALLBACK_GREETING;
use super::intent::IntentLabel;
use super::prompts::{RESPONSE_LABELS, response_prompt, strip_label_artifacts};
use crate::Result;
use crate::llm::SharedModel;

/// Writes the short Hinglish reply for a classified concern
#[derive(Clone)]
pub struct ResponseGenerator {
    model: SharedModel,
}

impl ResponseGenerator {
    #[must_use]
    pub fn new(model: SharedModel) -> Self {
        Self { model }
    }

    /// Generate a reply for `intent`
    ///
    /// Never returns empty text: failures and empty output fall back to
    /// [`FALLBACK_GREETING`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RateLimited`] only
    pub async fn generate(&self, intent: IntentLabel, text: &str) -> Result<String> {
        debug_assert!(intent.is_concern(), "no reply is generated without a concern");

        let prompt = response_prompt(intent.display_name(), text);
        match self.model.generate_text(&prompt).await {
            Ok(raw) => {
                let reply = strip_label_artifacts(&raw, RESPONSE_LABELS);
                if reply.is_empty() {
                    tracing::warn!(%intent, "generator returned no text, using fallback");
                    Ok(FALLBACK_GREETING.to_string())
                } else {
                    Ok(reply)
                }
            }
            Err(e) if e.is_rate_limited() => Err(e),
            Err(e) => {
                tracing::warn!(%intent, error = %e, "generation failed, using fallback");
                Ok(FALLBACK_GREETING.to_string())
            }
        }
    }
}
