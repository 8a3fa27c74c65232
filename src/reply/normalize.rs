//! Hinglish to English normalization

use super::prompts::{NORMALIZER_LABELS, normalization_prompt, strip_label_artifacts};
use crate::Result;
use crate::llm::SharedModel;

/// Share of Devanagari characters below which text is left untouched
pub const DEVANAGARI_THRESHOLD: f64 = 0.2;

const fn is_devanagari(c: char) -> bool {
    matches!(c, '\u{0900}'..='\u{097F}')
}

/// Fraction of Devanagari among letters, Devanagari and whitespace
///
/// `None` when the text contains none of those characters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn devanagari_ratio(text: &str) -> Option<f64> {
    let (secondary, total) = text.chars().fold((0usize, 0usize), |(secondary, total), c| {
        if is_devanagari(c) {
            (secondary + 1, total + 1)
        } else if c.is_ascii_alphabetic() || c.is_whitespace() {
            (secondary, total + 1)
        } else {
            (secondary, total)
        }
    });

    (total > 0).then(|| secondary as f64 / total as f64)
}

/// Best-effort rewrite of mixed-script input into English
///
/// Normalization is an optimization: apart from an exhausted quota, every
/// failure returns the input unchanged.
#[derive(Clone)]
pub struct TextNormalizer {
    model: SharedModel,
}

impl TextNormalizer {
    #[must_use]
    pub fn new(model: SharedModel) -> Self {
        Self { model }
    }

    /// Whether `text` is mixed enough to be worth a model call
    #[must_use]
    pub fn needs_normalization(text: &str) -> bool {
        devanagari_ratio(text).is_some_and(|ratio| ratio >= DEVANAGARI_THRESHOLD)
    }

    /// Normalize `text` into the working language
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RateLimited`] only; other failures fall back
    /// to the trimmed input
    pub async fn normalize(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }

        if !Self::needs_normalization(text) {
            tracing::debug!("input mostly latin script, skipping normalization");
            return Ok(text.to_string());
        }

        match self.model.generate_text(&normalization_prompt(text)).await {
            Ok(raw) => {
                let normalized = strip_label_artifacts(&raw, NORMALIZER_LABELS);
                if normalized.is_empty() {
                    tracing::warn!("normalizer returned no text, keeping original");
                    Ok(text.to_string())
                } else {
                    tracing::debug!(normalized = %normalized, "normalized input");
                    Ok(normalized)
                }
            }
            Err(e) if e.is_rate_limited() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "normalization failed, keeping original");
                Ok(text.to_string())
            }
        }
    }
}
