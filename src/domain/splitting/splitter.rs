//! Fragment splitter trait and errors

use bytes::Bytes;
use thiserror::Error;

use crate::domain::document::{DocumentFormat, Fragment};

#[cfg(test)]
use mockall::automock;

/// Soft target as a share of the fragment limit, leaving room for container overhead
pub const SOFT_TARGET_RATIO: f64 = 0.90;

/// Errors raised while splitting a document
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("No split strategy registered for format '{0}'")]
    Unsupported(DocumentFormat),

    #[error("Invalid {format} document: {message}")]
    Corrupt {
        format: DocumentFormat,
        message: String,
    },

    #[error("Failed to encode {format} fragment: {message}")]
    Encode {
        format: DocumentFormat,
        message: String,
    },

    #[error("Invalid split limit: {0}")]
    InvalidLimit(String),

    #[error("Splitter produced invalid fragments: {0}")]
    InvalidOutput(String),
}

impl SplitError {
    pub fn corrupt(format: DocumentFormat, message: impl Into<String>) -> Self {
        Self::Corrupt {
            format,
            message: message.into(),
        }
    }

    pub fn encode(format: DocumentFormat, message: impl Into<String>) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }
}

/// Splits raw document bytes into ordered, bounded fragments.
///
/// Implementations must return fragments numbered 1..=N in document order that
/// together cover the whole input without overlap. A fragment may exceed
/// `max_fragment_bytes` only when it holds one indivisible unit (a single page,
/// a single sheet).
#[cfg_attr(test, automock)]
pub trait FragmentSplitter: Send + Sync {
    /// Whether this splitter has a strategy for the format
    fn supports(&self, format: &DocumentFormat) -> bool;

    /// Split the bytes into fragments
    fn split(
        &self,
        bytes: &Bytes,
        format: &DocumentFormat,
        max_fragment_bytes: usize,
    ) -> Result<Vec<Fragment>, SplitError>;

    /// Get the splitter name
    fn name(&self) -> &'static str;
}

/// Reject a zero fragment limit
pub fn validate_limit(max_fragment_bytes: usize) -> Result<(), SplitError> {
    if max_fragment_bytes == 0 {
        return Err(SplitError::InvalidLimit(
            "max_fragment_bytes must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Soft size target for a hard limit
pub fn soft_target(max_fragment_bytes: usize) -> usize {
    ((max_fragment_bytes as f64) * SOFT_TARGET_RATIO) as usize
}
