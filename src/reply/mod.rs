//! Reply pipeline
//!
//! Turns one transcribed utterance into the text Krishna speaks back:
//!
//! ```text
//! utterance ─► greeting filter ─► normalize ─► classify ─► generate ─► reply
//!                    │                             │
//!                    └──────── fallback greeting ◄─┘ (no intent)
//! ```
//!
//! Each request is independent; the only shared state is the model handle.

pub mod greetings;
mod intent;
mod normalize;
pub mod prompts;
mod respond;

use serde::Serialize;

pub use greetings::{FALLBACK_GREETING, TRIVIAL_GREETINGS, UNAVAILABLE_MESSAGE, is_trivial_greeting};
pub use intent::{IntentClassifier, IntentLabel};
pub use normalize::{DEVANAGARI_THRESHOLD, TextNormalizer, devanagari_ratio};
pub use respond::ResponseGenerator;

use crate::llm::SharedModel;
use crate::Result;

/// How a reply was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "intent", rename_all = "snake_case")]
pub enum ReplyOutcome {
    /// Empty input or trivial small talk, answered without the model
    Greeting,
    /// The classifier found no concern
    NoIntent,
    /// A persona reply was generated for this intent
    Generated(IntentLabel),
    /// Generation produced nothing usable; the greeting was substituted
    Fallback(IntentLabel),
    /// The model quota is exhausted
    Unavailable,
}

/// Final reply text plus how it was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub outcome: ReplyOutcome,
}

impl Reply {
    fn greeting(outcome: ReplyOutcome) -> Self {
        Self {
            text: FALLBACK_GREETING.to_string(),
            outcome,
        }
    }

    fn unavailable() -> Self {
        Self {
            text: UNAVAILABLE_MESSAGE.to_string(),
            outcome: ReplyOutcome::Unavailable,
        }
    }

    /// Whether the reply is a degraded answer rather than generated guidance
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        !matches!(self.outcome, ReplyOutcome::Generated(_))
    }
}

/// Public entry point of the pipeline
///
/// Cheap to clone; every stage shares the same model handle.
#[derive(Clone)]
pub struct ReplyService {
    normalizer: TextNormalizer,
    classifier: IntentClassifier,
    generator: ResponseGenerator,
}

impl ReplyService {
    /// Build all three stages on one shared model
    #[must_use]
    pub fn new(model: SharedModel) -> Self {
        Self::from_stages(
            TextNormalizer::new(model.clone()),
            IntentClassifier::new(model.clone()),
            ResponseGenerator::new(model),
        )
    }

    /// Assemble a service from individually configured stages
    #[must_use]
    pub const fn from_stages(
        normalizer: TextNormalizer,
        classifier: IntentClassifier,
        generator: ResponseGenerator,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            generator,
        }
    }

    /// Reply text for an utterance
    ///
    /// Total: always returns non-empty text, never an error.
    pub async fn reply(&self, utterance: &str) -> String {
        self.respond(utterance).await.text
    }

    /// Reply for an utterance, with the path taken to produce it
    pub async fn respond(&self, utterance: &str) -> Reply {
        if utterance.trim().is_empty() {
            tracing::debug!("empty utterance");
            return Reply::greeting(ReplyOutcome::Greeting);
        }

        if is_trivial_greeting(utterance) {
            tracing::debug!("trivial greeting, skipping model");
            return Reply::greeting(ReplyOutcome::Greeting);
        }

        match self.run_stages(utterance).await {
            Ok(reply) => {
                tracing::info!(outcome = ?reply.outcome, reply_chars = reply.text.len(), "reply ready");
                reply
            }
            Err(e) => {
                tracing::warn!(error = %e, "model unavailable, replying with quota notice");
                Reply::unavailable()
            }
        }
    }

    /// Normalize, classify and generate; errors are rate limits only
    async fn run_stages(&self, utterance: &str) -> Result<Reply> {
        let normalized = self.normalizer.normalize(utterance).await?;

        let intent = self.classifier.classify(&normalized).await?;
        if !intent.is_concern() {
            return Ok(Reply::greeting(ReplyOutcome::NoIntent));
        }

        let text = self.generator.generate(intent, &normalized).await?;
        let reply = if text.trim().is_empty() || text == FALLBACK_GREETING {
            Reply::greeting(ReplyOutcome::Fallback(intent))
        } else {
            Reply {
                text,
                outcome: ReplyOutcome::Generated(intent),
            }
        };

        Ok(reply)
    }
}

impl std::fmt::Debug for ReplyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm::fake::FakeModel;

    #[test]
    fn outcome_serializes_with_intent() {
        let json = serde_json::to_value(ReplyOutcome::Generated(IntentLabel::CareerPurpose)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "generated", "intent": "career_purpose"}));

        let json = serde_json::to_value(ReplyOutcome::Unavailable).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "unavailable"}));
    }

    #[test]
    fn only_generated_replies_are_not_degraded() {
        assert!(Reply::greeting(ReplyOutcome::NoIntent).is_degraded());
        assert!(Reply::unavailable().is_degraded());
        assert!(
            !Reply {
                text: "Karma karo.".to_string(),
                outcome: ReplyOutcome::Generated(IntentLabel::DailyStruggles),
            }
            .is_degraded()
        );
    }

    #[tokio::test]
    async fn whitespace_input_never_reaches_model() {
        let model = Arc::new(FakeModel::replying("Intent: Relationships"));
        let service = ReplyService::new(model.clone());

        assert_eq!(service.reply(" \t\n ").await, FALLBACK_GREETING);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn stages_run_in_order() {
        let model = Arc::new(FakeModel::new(|prompt| {
            if prompt.contains("intent classifier") {
                Ok("Intent: Life Transitions".to_string())
            } else {
                Ok("Parivartan hi niyam hai, beta.".to_string())
            }
        }));
        let service = ReplyService::new(model.clone());

        let reply = service.respond("We are moving to a new city").await;
        assert_eq!(reply.text, "Parivartan hi niyam hai, beta.");
        assert_eq!(reply.outcome, ReplyOutcome::Generated(IntentLabel::LifeTransitions));

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("intent classifier"));
        assert!(prompts[1].contains("classified as: Life Transitions"));
    }

    #[tokio::test]
    async fn generator_fallback_is_reported() {
        let model = Arc::new(FakeModel::new(|prompt| {
            if prompt.contains("intent classifier") {
                Ok("Intent: Inner Conflict".to_string())
            } else {
                Ok(String::new())
            }
        }));
        let reply = ReplyService::new(model).respond("I feel guilty all the time").await;

        assert_eq!(reply.text, FALLBACK_GREETING);
        assert_eq!(reply.outcome, ReplyOutcome::Fallback(IntentLabel::InnerConflict));
    }
}
