//! Errors that end a processing run

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::splitting::SplitError;
use crate::domain::DomainError;

/// Fatal failure of a processing run, yielded as the last stream item
#[derive(Debug, Clone, Error)]
pub enum ProcessingError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("Fragment {ordinal} failed: {source}")]
    FragmentCall {
        ordinal: usize,
        #[source]
        source: DomainError,
    },

    /// The call producing the answer failed (synthesis or whole document)
    #[error("Answer call failed: {0}")]
    Synthesis(#[source] DomainError),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Invalid configuration: {0}")]
    Configuration(#[source] DomainError),
}

impl ProcessingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn fragment_call(ordinal: usize, source: DomainError) -> Self {
        Self::FragmentCall { ordinal, source }
    }

    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker(message.into())
    }
}

impl From<tokio::task::JoinError> for ProcessingError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::worker(e.to_string())
    }
}

impl From<tokio::sync::AcquireError> for ProcessingError {
    fn from(e: tokio::sync::AcquireError) -> Self {
        Self::worker(format!("concurrency limit closed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::DocumentFormat;

    #[test]
    fn test_error_messages() {
        let error = ProcessingError::fragment_call(3, DomainError::provider("bedrock", "throttled"));
        assert_eq!(
            error.to_string(),
            "Fragment 3 failed: Provider error: bedrock - throttled"
        );

        let error: ProcessingError = SplitError::Unsupported(DocumentFormat::Docx).into();
        assert!(matches!(error, ProcessingError::Split(_)));

        let error = ProcessingError::io(
            "/tmp/missing.pdf",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(error.to_string(), "Failed to read /tmp/missing.pdf: not found");
    }

    #[tokio::test]
    async fn test_closed_semaphore_is_a_worker_error() {
        let semaphore = tokio::sync::Semaphore::new(1);
        semaphore.close();

        let error: ProcessingError = semaphore.acquire().await.unwrap_err().into();
        assert!(matches!(
            &error,
            ProcessingError::Worker(message) if message.starts_with("concurrency limit closed")
        ));
    }
}
