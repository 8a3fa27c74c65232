//! Retry with exponential backoff for language model calls

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::LanguageModel;
use crate::{Error, Result};

/// Default per-call time budget for a single model request
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry policy for language model calls
///
/// Controls how many attempts a call gets and how long to wait between
/// attempts using exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay between attempts (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Determine whether an HTTP status and response body indicate a recoverable error.
///
/// Recoverable errors are worth retrying: rate limits (429), server errors (5xx),
/// and certain transient network-level failures surfaced in the body text.
#[must_use]
pub fn is_recoverable(status: u16, body: &str) -> bool {
    if status == 429 {
        return true;
    }

    if (500..600).contains(&status) {
        return true;
    }

    let lower = body.to_lowercase();
    lower.contains("connection reset")
        || lower.contains("timed out")
        || lower.contains("dns error")
}

/// Determine whether a failed model call means the quota is exhausted
#[must_use]
pub fn is_quota_exhausted(status: u16, body: &str) -> bool {
    if status == 429 {
        return true;
    }

    let lower = body.to_lowercase();
    lower.contains("quota") || lower.contains("rate limit") || lower.contains("resource_exhausted")
}

/// Extract the suggested retry delay from a Gemini error body.
///
/// Gemini encodes it as a `google.rpc.RetryInfo` entry in `error.details`,
/// e.g. `{"retryDelay": "37s"}`. Returns `None` if absent or unparsable.
#[must_use]
pub fn parse_retry_after(body: &str) -> Option<Duration> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    let details = v.get("error")?.get("details")?.as_array()?;

    details
        .iter()
        .filter_map(|d| d.get("retryDelay").and_then(serde_json::Value::as_str))
        .find_map(|raw| {
            let secs: f64 = raw.trim().strip_suffix('s')?.parse().ok()?;
            (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
        })
}

/// Compute the delay before the next attempt.
///
/// When `retry_after` is provided (e.g. from a 429 response), that value is
/// used directly but capped at `policy.max_delay`. Otherwise the delay follows
/// exponential backoff: `min(base_delay * 2^attempt + jitter, max_delay)`,
/// with jitter drawn uniformly from 0-25% of the computed delay.
#[must_use]
pub fn delay_for_attempt(
    policy: &RetryPolicy,
    attempt: u32,
    retry_after: Option<Duration>,
) -> Duration {
    if let Some(ra) = retry_after {
        return ra.min(policy.max_delay);
    }

    let base = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt));
    let base = base.min(policy.max_delay);

    let jitter_fraction: f64 = rand::thread_rng().gen_range(0.0..=0.25);
    let jitter = base.mul_f64(jitter_fraction);

    (base + jitter).min(policy.max_delay)
}

/// A [`LanguageModel`] decorator adding a per-call timeout and bounded retries
///
/// Retryable failures (see [`Error::is_retryable`]) are repeated until the
/// policy's attempts are spent; the last error is then returned unchanged, so
/// an exhausted quota still surfaces as [`Error::RateLimited`].
pub struct RetryingModel<M> {
    inner: M,
    policy: RetryPolicy,
    call_timeout: Duration,
}

impl<M: LanguageModel> RetryingModel<M> {
    /// Wrap a model with the given retry policy
    #[must_use]
    pub const fn new(inner: M, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Override the per-call timeout
    #[must_use]
    pub const fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// The active retry policy
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn attempt(&self, prompt: &str) -> Result<String> {
        tokio::time::timeout(self.call_timeout, self.inner.generate_text(prompt))
            .await
            .map_err(|_| Error::Timeout(self.call_timeout))?
    }
}

#[async_trait]
impl<M: LanguageModel> LanguageModel for RetryingModel<M> {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.attempt(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = delay_for_attempt(&self.policy, attempt, e.retry_after());
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "model call failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!(attempts = max_attempts, error = %e, "model call retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}
