//! Broadcast progress to several sinks

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::progress::{ProgressSink, SinkError};

/// Forwards every callback to each sink in turn.
///
/// All sinks are always called; the first error, if any, is returned.
#[derive(Clone, Default)]
pub struct FanOutSink {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl std::fmt::Debug for FanOutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

fn first_error(results: Vec<Result<(), SinkError>>) -> Result<(), SinkError> {
    results.into_iter().collect()
}

#[async_trait]
impl ProgressSink for FanOutSink {
    async fn on_processing_start(
        &self,
        file_name: &str,
        total_fragments: usize,
    ) -> Result<(), SinkError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_processing_start(file_name, total_fragments).await);
        }
        first_error(results)
    }

    async fn on_chunk_start(&self, ordinal: usize, file_name: &str) -> Result<(), SinkError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_chunk_start(ordinal, file_name).await);
        }
        first_error(results)
    }

    async fn on_chunk_end(
        &self,
        ordinal: usize,
        file_name: &str,
        result: &str,
    ) -> Result<(), SinkError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_chunk_end(ordinal, file_name, result).await);
        }
        first_error(results)
    }

    async fn on_processing_end(&self, file_name: &str) -> Result<(), SinkError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_processing_end(file_name).await);
        }
        first_error(results)
    }

    async fn on_error(&self, message: &str) -> Result<(), SinkError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_error(message).await);
        }
        first_error(results)
    }

    async fn on_summary_start(&self) -> Result<(), SinkError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_summary_start().await);
        }
        first_error(results)
    }

    async fn on_summary_end(&self) -> Result<(), SinkError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_summary_end().await);
        }
        first_error(results)
    }
}
