//! Processing limits and failure policy

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::DomainError;

/// Files at or below this size are sent in one call
pub const DEFAULT_BYTES_THRESHOLD: usize = 4_300_000;
/// Upper bound for a single fragment payload
pub const DEFAULT_MAX_FRAGMENT_BYTES: usize = 4 * 1024 * 1024;
/// Character budget of the consolidated context
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 150_000;
pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_CALL_TIMEOUT_SECS: f64 = 300.0;

/// What to do when a fragment's remote call fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Cancel the remaining fragments and fail the run
    #[default]
    Abort,
    /// Substitute a placeholder text and keep going
    Placeholder,
}

/// Configuration for the map-reduce processor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Size above which a file takes the split path
    pub bytes_threshold: usize,
    /// Byte limit handed to the splitter
    pub max_fragment_bytes: usize,
    /// Character cap of the consolidated context, before the truncation marker
    pub max_context_chars: usize,
    /// Maximum concurrent fragment calls
    pub max_workers: usize,
    /// Timeout for each remote call in seconds; fractions are allowed
    pub call_timeout_secs: f64,
    pub failure_policy: FailurePolicy,
}

impl ProcessingConfig {
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_bytes_threshold(mut self, bytes_threshold: usize) -> Self {
        self.bytes_threshold = bytes_threshold;
        self
    }

    pub fn with_max_fragment_bytes(mut self, max_fragment_bytes: usize) -> Self {
        self.max_fragment_bytes = max_fragment_bytes;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_secs = timeout.as_secs_f64();
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Falls back to the default when the configured value is not a valid duration
    pub fn call_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.call_timeout_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS as u64))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.bytes_threshold == 0 {
            return Err(DomainError::validation(
                "bytes_threshold must be greater than 0",
            ));
        }

        if self.max_fragment_bytes == 0 {
            return Err(DomainError::validation(
                "max_fragment_bytes must be greater than 0",
            ));
        }

        if self.max_context_chars == 0 {
            return Err(DomainError::validation(
                "max_context_chars must be greater than 0",
            ));
        }

        if self.max_workers == 0 {
            return Err(DomainError::validation("max_workers must be greater than 0"));
        }

        if !self.call_timeout_secs.is_finite() || self.call_timeout_secs <= 0.0 {
            return Err(DomainError::validation(
                "call_timeout_secs must be a positive number of seconds",
            ));
        }

        Ok(())
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            bytes_threshold: DEFAULT_BYTES_THRESHOLD,
            max_fragment_bytes: DEFAULT_MAX_FRAGMENT_BYTES,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            max_workers: DEFAULT_MAX_WORKERS,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            failure_policy: FailurePolicy::default(),
        }
    }
}
