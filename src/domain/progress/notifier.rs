//! Best-effort delivery of progress notifications

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::warn;

use super::{ProgressSink, SinkError};

/// Wraps a sink so that its failures and panics never reach the pipeline
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn ProgressSink>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

impl Notifier {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }

    pub async fn processing_start(&self, file_name: &str, total_fragments: usize) {
        deliver(
            "processing_start",
            self.sink.on_processing_start(file_name, total_fragments),
        )
        .await
    }

    pub async fn chunk_start(&self, ordinal: usize, file_name: &str) {
        deliver("chunk_start", self.sink.on_chunk_start(ordinal, file_name)).await
    }

    pub async fn chunk_end(&self, ordinal: usize, file_name: &str, result: &str) {
        deliver(
            "chunk_end",
            self.sink.on_chunk_end(ordinal, file_name, result),
        )
        .await
    }

    pub async fn processing_end(&self, file_name: &str) {
        deliver("processing_end", self.sink.on_processing_end(file_name)).await
    }

    pub async fn error(&self, message: &str) {
        deliver("error", self.sink.on_error(message)).await
    }

    pub async fn summary_start(&self) {
        deliver("summary_start", self.sink.on_summary_start()).await
    }

    pub async fn summary_end(&self) {
        deliver("summary_end", self.sink.on_summary_end()).await
    }
}

async fn deliver<F>(event: &'static str, notification: F)
where
    F: Future<Output = Result<(), SinkError>>,
{
    match AssertUnwindSafe(notification).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(event, error = %e, "Progress sink failed, ignoring"),
        Err(_) => warn!(event, "Progress sink panicked, ignoring"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::progress::MockProgressSink;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct PanickingSink;

    #[async_trait]
    impl ProgressSink for PanickingSink {
        async fn on_chunk_start(&self, _ordinal: usize, _file_name: &str) -> Result<(), SinkError> {
            panic!("sink exploded");
        }
    }

    #[tokio::test]
    async fn test_sink_errors_are_swallowed() {
        let mut sink = MockProgressSink::new();
        sink.expect_on_chunk_end()
            .times(1)
            .returning(|_, _, _| Err(SinkError::new("socket closed")));

        let notifier = Notifier::new(Arc::new(sink));
        notifier.chunk_end(1, "report", "text").await;
    }

    #[tokio::test]
    async fn test_sink_panics_are_swallowed() {
        let notifier = Notifier::new(Arc::new(PanickingSink));
        notifier.chunk_start(1, "report").await;
        notifier.chunk_end(1, "report", "text").await;
    }

    #[tokio::test]
    async fn test_arguments_are_forwarded() {
        let mut sink = MockProgressSink::new();
        sink.expect_on_processing_start()
            .withf(|name, total| name == "report" && *total == 3)
            .times(1)
            .returning(|_, _| Ok(()));

        let notifier = Notifier::new(Arc::new(sink));
        notifier.processing_start("report", 3).await;
    }
}
