//! Retry with exponential back-off and jitter for pricing backend calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors. Everything else is returned on the first failure so the
//! controller can fall back to the local formula without extra latency.

use std::future::Future;
use std::time::Duration;

use crate::error::PricingError;

/// Upper bound on a single back-off sleep.
const MAX_DELAY_MS: u64 = 5_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`PricingError::RateLimited`]: HTTP 429.
/// - [`PricingError::Http`] timeouts and connection failures.
/// - [`PricingError::UnexpectedStatus`] with a 5xx status.
///
/// **Not retriable:** 404s, other 4xx statuses, malformed bodies, and bad
/// base URLs. Retrying would return the same result.
pub(crate) fn is_retriable(err: &PricingError) -> bool {
    match err {
        PricingError::RateLimited { .. } => true,
        PricingError::Http(e) => e.is_timeout() || e.is_connect(),
        PricingError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        PricingError::NotFound { .. }
        | PricingError::Deserialize { .. }
        | PricingError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 250`:
///
/// | Attempt | Sleep before next attempt    |
/// |---------|------------------------------|
/// | 1       | 250 ms × 2⁰ ± 25 % jitter    |
/// | 2       | 250 ms × 2¹ ± 25 % jitter    |
/// | 3       | 250 ms × 2² ± 25 % jitter    |
///
/// A 429 waits at least its `Retry-After`. Every sleep is capped at 5 s.
/// Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, PricingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PricingError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt >= max_retries || !is_retriable(&err) {
            return Err(err);
        }
        attempt += 1;

        let delay = backoff_delay(attempt, backoff_base_ms, &err);
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(MAX_DELAY_MS),
            error = %err,
            "transient pricing backend error, retrying after back-off"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Sleep before retry number `attempt` (1-based).
fn backoff_delay(attempt: u32, backoff_base_ms: u64, err: &PricingError) -> Duration {
    let exponential = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let floor_ms = match err {
        PricingError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1_000),
        _ => 0,
    };

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (exponential.min(MAX_DELAY_MS) as f64 * (0.75 + rand::random::<f64>() * 0.5))
        as u64;
    Duration::from_millis(jittered.max(floor_ms).min(MAX_DELAY_MS))
}
