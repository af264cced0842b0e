//! Bounded retry with exponential backoff
//!
//! The observed service calls define no retry behavior, so the default
//! policy performs a single attempt. Callers opt in to retries explicitly
//! through configuration rather than relying on hidden client behavior.

use crate::errors::{RagError, Result};
use std::time::Duration;
use tokio::time::sleep;

/// Base delay for exponential backoff (1 second)
const BASE_DELAY_MS: u64 = 1000;

/// Maximum delay cap (16 seconds)
const MAX_DELAY_MS: u64 = 16000;

/// Retry policy with exponential backoff and jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    max_retries: u32,

    /// Base delay in milliseconds
    base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    max_delay_ms: u64,

    /// Enable jitter
    enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Retry up to `max_retries` times with default delays
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Fully custom policy
    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Execute an operation, retrying transient failures.
    ///
    /// The final error is returned unmodified so callers still see which
    /// dependency failed.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !self.is_retryable(&e) || attempt >= self.max_retries {
                        return Err(e);
                    }

                    attempt += 1;
                    sleep(self.calculate_delay(attempt)).await;
                }
            }
        }
    }

    /// Calculate delay for given attempt number
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponential_delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        // ±25% random variation
        let final_delay = if self.enable_jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((delay_ms as i64) + random_jitter as i64).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Check if an error is transient
    fn is_retryable(&self, error: &RagError) -> bool {
        match error {
            // Transient: the service may recover
            RagError::Timeout { .. } => true,
            RagError::HttpError(_) => true,
            RagError::EmbeddingService { .. } => true,
            RagError::GenerationService { .. } => true,

            // Permanent: retrying cannot help
            RagError::SourceUnavailable { .. } => false,
            RagError::EmptyIndex => false,
            RagError::InvalidTopK { .. } => false,
            RagError::DimensionMismatch { .. } => false,
            RagError::SerializationError(_) => false,
            RagError::ConfigError(_) => false,
            RagError::IoError(_) => false,
        }
    }

    /// Get max retries
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
