//! Progress sink trait and events

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Error reported by a sink. Never propagated into the pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Progress sink error: {message}")]
pub struct SinkError {
    pub message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Observer for the lifecycle of a processing run.
///
/// Chunk callbacks are invoked from worker tasks and may run concurrently.
/// Every method has a no-op default; override only what you need.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// A file starts processing; `total_fragments` is 1 on the whole-file path
    async fn on_processing_start(
        &self,
        _file_name: &str,
        _total_fragments: usize,
    ) -> Result<(), SinkError> {
        Ok(())
    }

    /// A fragment task starts
    async fn on_chunk_start(&self, _ordinal: usize, _file_name: &str) -> Result<(), SinkError> {
        Ok(())
    }

    /// A fragment task finished with the given text
    async fn on_chunk_end(
        &self,
        _ordinal: usize,
        _file_name: &str,
        _result: &str,
    ) -> Result<(), SinkError> {
        Ok(())
    }

    /// A file finished its map phase (or its whole-file call)
    async fn on_processing_end(&self, _file_name: &str) -> Result<(), SinkError> {
        Ok(())
    }

    /// A failure occurred
    async fn on_error(&self, _message: &str) -> Result<(), SinkError> {
        Ok(())
    }

    /// The cross-file summary call starts
    async fn on_summary_start(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// The cross-file summary call finished
    async fn on_summary_end(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Owned form of a sink callback, for transports that forward events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    ProcessingStart {
        file_name: String,
        total_fragments: usize,
    },
    ChunkStart {
        ordinal: usize,
        file_name: String,
    },
    ChunkEnd {
        ordinal: usize,
        file_name: String,
        result: String,
    },
    ProcessingEnd {
        file_name: String,
    },
    Error {
        message: String,
    },
    SummaryStart,
    SummaryEnd,
}

/// Sink that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink_accepts_everything() {
        let sink = NoopSink;

        assert!(sink.on_processing_start("a", 3).await.is_ok());
        assert!(sink.on_chunk_start(1, "a").await.is_ok());
        assert!(sink.on_chunk_end(1, "a", "text").await.is_ok());
        assert!(sink.on_processing_end("a").await.is_ok());
        assert!(sink.on_error("boom").await.is_ok());
        assert!(sink.on_summary_start().await.is_ok());
        assert!(sink.on_summary_end().await.is_ok());
    }

    #[test]
    fn test_event_serialization() {
        let event = ProgressEvent::ChunkStart {
            ordinal: 2,
            file_name: "report".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"chunk_start\""));
        assert!(json.contains("\"ordinal\":2"));
    }
}
