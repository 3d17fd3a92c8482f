//! Progress sink that writes tracing events

use async_trait::async_trait;
use tracing::{error, info};

use crate::domain::progress::{ProgressSink, SinkError};

/// Reports progress through the logging pipeline
#[derive(Debug, Clone, Default)]
pub struct LoggingProgressSink {
    /// Include each fragment's text in the chunk-end event
    include_results: bool,
}

impl LoggingProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, include_results: bool) -> Self {
        self.include_results = include_results;
        self
    }
}

#[async_trait]
impl ProgressSink for LoggingProgressSink {
    async fn on_processing_start(
        &self,
        file_name: &str,
        total_fragments: usize,
    ) -> Result<(), SinkError> {
        info!(file = file_name, total_fragments, "Processing started");
        Ok(())
    }

    async fn on_chunk_start(&self, ordinal: usize, file_name: &str) -> Result<(), SinkError> {
        info!(file = file_name, ordinal, "Fragment started");
        Ok(())
    }

    async fn on_chunk_end(
        &self,
        ordinal: usize,
        file_name: &str,
        result: &str,
    ) -> Result<(), SinkError> {
        if self.include_results {
            info!(file = file_name, ordinal, result, "Fragment finished");
        } else {
            info!(file = file_name, ordinal, chars = result.chars().count(), "Fragment finished");
        }
        Ok(())
    }

    async fn on_processing_end(&self, file_name: &str) -> Result<(), SinkError> {
        info!(file = file_name, "Processing finished");
        Ok(())
    }

    async fn on_error(&self, message: &str) -> Result<(), SinkError> {
        error!(error = message, "Processing failed");
        Ok(())
    }

    async fn on_summary_start(&self) -> Result<(), SinkError> {
        info!("Combining answers");
        Ok(())
    }

    async fn on_summary_end(&self) -> Result<(), SinkError> {
        info!("Answers combined");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_never_fails() {
        let sink = LoggingProgressSink::new().with_results(true);

        assert!(sink.on_processing_start("report pdf", 3).await.is_ok());
        assert!(sink.on_chunk_start(1, "report pdf").await.is_ok());
        assert!(sink.on_chunk_end(1, "report pdf", "text").await.is_ok());
        assert!(sink.on_error("boom").await.is_ok());
    }
}
