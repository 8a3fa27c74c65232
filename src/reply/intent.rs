//! Intent classification

use std::fmt;

use serde::{Deserialize, Serialize};

use super::prompts::{extract_intent_label, intent_prompt};
use crate::Result;
use crate::llm::SharedModel;

/// Category of personal concern behind an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    CareerPurpose,
    Relationships,
    InnerConflict,
    LifeTransitions,
    DailyStruggles,
    /// Greeting or small talk with no concern; ends the pipeline
    NoIntent,
}

impl IntentLabel {
    /// Every label, concerns first
    pub const ALL: [Self; 6] = [
        Self::CareerPurpose,
        Self::Relationships,
        Self::InnerConflict,
        Self::LifeTransitions,
        Self::DailyStruggles,
        Self::NoIntent,
    ];

    /// Name used in prompts and model output
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::CareerPurpose => "Career/Purpose",
            Self::Relationships => "Relationships",
            Self::InnerConflict => "Inner Conflict",
            Self::LifeTransitions => "Life Transitions",
            Self::DailyStruggles => "Daily Struggles",
            Self::NoIntent => "No-Intent / Casual Greeting",
        }
    }

    /// Map a model-produced label onto the closed set
    ///
    /// Matching ignores case, spacing and punctuation. Anything mentioning
    /// "no intent" (in any spelling) or "casual greeting" is [`Self::NoIntent`].
    /// `None` for labels outside the set.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        let key: String = lower.chars().filter(char::is_ascii_alphanumeric).collect();
        if key.contains("nointent") || key.contains("casualgreeting") {
            return Some(Self::NoIntent);
        }
        if key.is_empty() {
            return None;
        }

        Self::ALL.into_iter().find(|intent| {
            let name: String = intent
                .display_name()
                .to_lowercase()
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect();
            key == name || (*intent != Self::NoIntent && key.starts_with(&name))
        })
    }

    /// Whether the pipeline should go on to generate a reply
    #[must_use]
    pub fn is_concern(self) -> bool {
        self != Self::NoIntent
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Maps normalized text to an [`IntentLabel`]
#[derive(Clone)]
pub struct IntentClassifier {
    model: SharedModel,
}

impl IntentClassifier {
    /// Label used when classification fails for reasons other than quota
    pub const DEFAULT_INTENT: IntentLabel = IntentLabel::DailyStruggles;

    #[must_use]
    pub fn new(model: SharedModel) -> Self {
        Self { model }
    }

    /// Classify a normalized utterance
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RateLimited`] only; other failures yield
    /// [`Self::DEFAULT_INTENT`]
    pub async fn classify(&self, text: &str) -> Result<IntentLabel> {
        let raw = match self.model.generate_text(&intent_prompt(text)).await {
            Ok(raw) => raw,
            Err(e) if e.is_rate_limited() => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, default = %Self::DEFAULT_INTENT, "classification failed, using default intent");
                return Ok(Self::DEFAULT_INTENT);
            }
        };

        let Some(label) = extract_intent_label(&raw).filter(|l| !l.is_empty()) else {
            tracing::debug!("classifier output has no intent line");
            return Ok(IntentLabel::NoIntent);
        };

        let intent = IntentLabel::from_label(&label).unwrap_or_else(|| {
            tracing::warn!(label = %label, default = %Self::DEFAULT_INTENT, "unknown intent label");
            Self::DEFAULT_INTENT
        });

        tracing::debug!(%intent, "classified utterance");
        Ok(intent)
    }
}
