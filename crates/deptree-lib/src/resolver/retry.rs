use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{trace, warn};

use super::error::ResolveError;
use crate::registry::{PackageMetadata, RegistryClient, RegistryError};

/// Exponential backoff between attempts
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub initial: Duration,
    /// Upper bound on any single delay
    pub max: Duration,
    /// Growth factor per retry
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(200),
            max: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl BackoffConfig {
    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.initial.as_secs_f64() * self.multiplier.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(scaled.max(0.0))
        }
    }
}

/// How transient registry failures are retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per fetch, first one included
    pub max_attempts: u32,
    pub backoff: BackoffConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffConfig::default(),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Retry `retries` times on top of the first attempt
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::default()
        }
    }
}

/// Fetch `name`, holding a permit only while a request is outstanding
pub(crate) async fn fetch_with_retry<R: RegistryClient>(
    registry: &R,
    permits: &Semaphore,
    policy: &RetryPolicy,
    name: &str,
) -> Result<PackageMetadata, ResolveError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let result = {
            let _permit = permits.acquire().await?;
            trace!("Fetching {} (attempt {}/{})", name, attempt, max_attempts);
            registry.fetch(name).await
        };

        match result {
            Ok(metadata) => return Ok(metadata),
            Err(RegistryError::NotFound { name }) => {
                return Err(ResolveError::PackageNotFound { name });
            }
            Err(RegistryError::InvalidResponse { name, reason }) => {
                return Err(ResolveError::InvalidResponse { name, reason });
            }
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay = policy.backoff.delay_for(attempt);
                warn!(
                    "{}, backing off for {:?} (retry {}/{})",
                    error,
                    delay,
                    attempt,
                    max_attempts - 1
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                return Err(ResolveError::RegistryUnavailable {
                    name: name.to_string(),
                    attempts: attempt,
                    reason: error.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    include!("retry.test.rs");
}
