//! Synthesis options: aggregator call control.

use std::time::Duration;

/// Settings for the aggregator call.
///
/// Sampling is deliberately colder than individual provider calls.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
    /// Fixed wait between attempts.
    pub retry_backoff: Duration,
    /// Cleaned output shorter than this is treated as a soft failure.
    pub min_usable_chars: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            max_tokens: 2000,
            timeout: Duration::from_secs(90),
            max_retries: 1,
            retry_backoff: Duration::from_secs(2),
            min_usable_chars: 20,
        }
    }
}

impl SynthesisOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_min_usable_chars(mut self, chars: usize) -> Self {
        self.min_usable_chars = chars;
        self
    }
}
