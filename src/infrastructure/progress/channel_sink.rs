//! Progress sink that forwards events over a channel

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::progress::{ProgressEvent, ProgressSink, SinkError};

/// Sends every callback as a [`ProgressEvent`] to a receiver, e.g. a UI task
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }

    /// Create a sink together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    fn send(&self, event: ProgressEvent) -> Result<(), SinkError> {
        self.sender
            .send(event)
            .map_err(|_| SinkError::new("progress receiver dropped"))
    }
}

#[async_trait]
impl ProgressSink for ChannelProgressSink {
    async fn on_processing_start(
        &self,
        file_name: &str,
        total_fragments: usize,
    ) -> Result<(), SinkError> {
        self.send(ProgressEvent::ProcessingStart {
            file_name: file_name.to_string(),
            total_fragments,
        })
    }

    async fn on_chunk_start(&self, ordinal: usize, file_name: &str) -> Result<(), SinkError> {
        self.send(ProgressEvent::ChunkStart {
            ordinal,
            file_name: file_name.to_string(),
        })
    }

    async fn on_chunk_end(
        &self,
        ordinal: usize,
        file_name: &str,
        result: &str,
    ) -> Result<(), SinkError> {
        self.send(ProgressEvent::ChunkEnd {
            ordinal,
            file_name: file_name.to_string(),
            result: result.to_string(),
        })
    }

    async fn on_processing_end(&self, file_name: &str) -> Result<(), SinkError> {
        self.send(ProgressEvent::ProcessingEnd {
            file_name: file_name.to_string(),
        })
    }

    async fn on_error(&self, message: &str) -> Result<(), SinkError> {
        self.send(ProgressEvent::Error {
            message: message.to_string(),
        })
    }

    async fn on_summary_start(&self) -> Result<(), SinkError> {
        self.send(ProgressEvent::SummaryStart)
    }

    async fn on_summary_end(&self) -> Result<(), SinkError> {
        self.send(ProgressEvent::SummaryEnd)
    }
}
