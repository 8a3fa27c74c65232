//! Language model access
//!
//! Every pipeline stage talks to the model through [`LanguageModel`], a single
//! stateless request/response call. The handle is shared as
//! `Arc<dyn LanguageModel>` across stages and concurrent requests.

#[cfg(test)]
pub(crate) mod fake;
mod gemini;
pub mod retry;

use std::sync::Arc;

use async_trait::async_trait;

pub use gemini::{DEFAULT_GEMINI_URL, DEFAULT_MODEL, GeminiClient};
pub use retry::{RetryPolicy, RetryingModel};

use crate::Result;

/// A text-in, text-out language model
///
/// Implementations must not keep per-request state: one instance serves
/// many in-flight requests at once.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for a single prompt
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RateLimited`] when the provider quota is
    /// exhausted, and other variants for transport or provider failures
    async fn generate_text(&self, prompt: &str) -> Result<String>;
}

/// Shared handle to a language model
pub type SharedModel = Arc<dyn LanguageModel>;

#[async_trait]
impl<T: LanguageModel + ?Sized> LanguageModel for Arc<T> {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        (**self).generate_text(prompt).await
    }
}
