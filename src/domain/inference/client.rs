use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use super::InferenceRequest;
use crate::domain::DomainError;

/// Stream of generated text deltas
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// Trait for the remote large-context inference service
#[async_trait]
pub trait InferenceClient: Send + Sync + Debug {
    /// Run one call and return the full generated text
    async fn invoke(&self, request: InferenceRequest) -> Result<String, DomainError>;

    /// Run one call and stream the generated text.
    ///
    /// The default implementation yields the result of `invoke` as a single item.
    async fn invoke_stream(&self, request: InferenceRequest) -> Result<TextStream, DomainError> {
        let text = self.invoke(request).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
    }

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
