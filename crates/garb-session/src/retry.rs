//! Bounded exponential backoff for read operations.
//!
//! Loads are idempotent, so wrapping them in a retry is always safe. Writes
//! go through the optimistic coordinator and are never auto-retried; the
//! user decides whether to resubmit.

use std::{future::Future, time::Duration};

/// Tunable parameters for the backoff sequence.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
  /// Total attempts, including the first one.
  pub max_attempts:  u32,
  /// Delay before the second attempt.
  pub initial_delay: Duration,
  /// Upper bound on the delay between attempts.
  pub max_delay:     Duration,
  /// Factor by which the delay grows after each failure.
  pub multiplier:    f64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts:  4,
      initial_delay: Duration::from_millis(250),
      max_delay:     Duration::from_secs(5),
      multiplier:    2.0,
    }
  }
}

impl RetryPolicy {
  /// A single-attempt policy that never sleeps. Handy in tests and for
  /// callers that do their own scheduling.
  pub fn none() -> Self {
    Self { max_attempts: 1, ..Self::default() }
  }

  /// The delay that follows `current`, clamped to `max_delay`.
  pub fn next_delay(&self, current: Duration) -> Duration {
    let next_ms = (current.as_millis() as f64 * self.multiplier) as u64;
    Duration::from_millis(next_ms).min(self.max_delay)
  }
}

/// Run `op` until it succeeds or the policy's attempts are exhausted,
/// sleeping between failures. The final error is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(
  policy: &RetryPolicy,
  mut op: F,
) -> Result<T, E>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: std::fmt::Display,
{
  let mut delay = policy.initial_delay;
  let mut attempt = 1u32;

  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(e) if attempt < policy.max_attempts => {
        tracing::warn!(
          attempt,
          delay_ms = delay.as_millis() as u64,
          error = %e,
          "read failed; backing off before retrying"
        );
        tokio::time::sleep(delay).await;
        delay = policy.next_delay(delay);
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}
