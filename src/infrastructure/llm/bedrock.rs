//! AWS Bedrock inference client built on the Converse API

use async_trait::async_trait;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ContentBlockDelta, ConversationRole, ConverseOutput, ConverseStreamOutput,
    DocumentBlock, DocumentFormat as BedrockDocumentFormat, DocumentSource,
    InferenceConfiguration, Message, SystemContentBlock,
};
use tracing::debug;

use crate::domain::document::DocumentFormat;
use crate::domain::inference::{DocumentPayload, InferenceClient, InferenceRequest, TextStream};
use crate::domain::DomainError;

/// One Converse call, independent of the SDK types
#[derive(Debug, Clone, PartialEq)]
pub struct ConverseCall {
    pub model_id: String,
    pub system: String,
    pub document: Option<DocumentPayload>,
    pub text: String,
    pub temperature: f32,
    pub max_tokens: i32,
}

/// Converse client trait for dependency injection
#[async_trait]
pub trait ConverseClientTrait: Send + Sync + std::fmt::Debug {
    async fn converse(&self, call: ConverseCall) -> Result<String, DomainError>;

    async fn converse_stream(&self, call: ConverseCall) -> Result<TextStream, DomainError>;
}

/// Inference client backed by Bedrock
#[derive(Debug)]
pub struct BedrockInferenceClient<C: ConverseClientTrait> {
    client: C,
    model_id: String,
    temperature: f32,
    max_tokens: i32,
}

impl<C: ConverseClientTrait> BedrockInferenceClient<C> {
    pub fn new(client: C, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            temperature: 0.3,
            max_tokens: 4096,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn build_call(&self, request: InferenceRequest) -> Result<ConverseCall, DomainError> {
        if let Some(document) = &request.document {
            bedrock_format(&document.format)?;
        }

        Ok(ConverseCall {
            model_id: self.model_id.clone(),
            system: request.system,
            document: request.document,
            text: request.text,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}

#[async_trait]
impl<C: ConverseClientTrait> InferenceClient for BedrockInferenceClient<C> {
    async fn invoke(&self, request: InferenceRequest) -> Result<String, DomainError> {
        let call = self.build_call(request)?;
        debug!(
            model = %call.model_id,
            document = call.document.as_ref().map(|d| d.name.as_str()),
            "Calling Bedrock"
        );

        self.client.converse(call).await
    }

    async fn invoke_stream(&self, request: InferenceRequest) -> Result<TextStream, DomainError> {
        let call = self.build_call(request)?;
        debug!(model = %call.model_id, "Streaming from Bedrock");

        self.client.converse_stream(call).await
    }

    fn provider_name(&self) -> &'static str {
        "bedrock"
    }
}

/// Document formats Bedrock accepts natively
fn bedrock_format(format: &DocumentFormat) -> Result<BedrockDocumentFormat, DomainError> {
    let mapped = match format {
        DocumentFormat::Pdf => BedrockDocumentFormat::Pdf,
        DocumentFormat::Xlsx => BedrockDocumentFormat::Xlsx,
        DocumentFormat::Xls => BedrockDocumentFormat::Xls,
        DocumentFormat::Csv => BedrockDocumentFormat::Csv,
        DocumentFormat::Doc => BedrockDocumentFormat::Doc,
        DocumentFormat::Docx => BedrockDocumentFormat::Docx,
        DocumentFormat::Html => BedrockDocumentFormat::Html,
        DocumentFormat::Txt => BedrockDocumentFormat::Txt,
        DocumentFormat::Md => BedrockDocumentFormat::Md,
        DocumentFormat::Other(ext) => {
            return Err(DomainError::validation(format!(
                "Bedrock does not accept '{}' documents",
                ext
            )));
        }
    };

    Ok(mapped)
}

fn build_message(call: &ConverseCall) -> Result<Message, DomainError> {
    let mut builder = Message::builder().role(ConversationRole::User);

    if let Some(document) = &call.document {
        let block = DocumentBlock::builder()
            .format(bedrock_format(&document.format)?)
            .name(&document.name)
            .source(DocumentSource::Bytes(Blob::new(document.bytes.to_vec())))
            .build()
            .map_err(|e| DomainError::provider("bedrock", format!("Invalid document: {}", e)))?;
        builder = builder.content(ContentBlock::Document(block));
    }

    builder
        .content(ContentBlock::Text(call.text.clone()))
        .build()
        .map_err(|e| DomainError::provider("bedrock", format!("Invalid message: {}", e)))
}

fn inference_configuration(call: &ConverseCall) -> InferenceConfiguration {
    InferenceConfiguration::builder()
        .temperature(call.temperature)
        .max_tokens(call.max_tokens)
        .build()
}

fn system_blocks(call: &ConverseCall) -> Option<Vec<SystemContentBlock>> {
    if call.system.is_empty() {
        None
    } else {
        Some(vec![SystemContentBlock::Text(call.system.clone())])
    }
}

/// Real Bedrock runtime client
#[derive(Debug, Clone)]
pub struct BedrockConverseClient {
    client: aws_sdk_bedrockruntime::Client,
}

impl BedrockConverseClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        let client = aws_sdk_bedrockruntime::Client::new(config);
        Self { client }
    }
}

#[async_trait]
impl ConverseClientTrait for BedrockConverseClient {
    async fn converse(&self, call: ConverseCall) -> Result<String, DomainError> {
        let response = self
            .client
            .converse()
            .model_id(&call.model_id)
            .set_system(system_blocks(&call))
            .messages(build_message(&call)?)
            .inference_config(inference_configuration(&call))
            .send()
            .await
            .map_err(|e| DomainError::provider("bedrock", format!("API error: {}", e)))?;

        match response.output() {
            Some(ConverseOutput::Message(message)) => Ok(message
                .content()
                .iter()
                .filter_map(|block| block.as_text().ok())
                .map(String::as_str)
                .collect()),
            _ => Err(DomainError::provider(
                "bedrock",
                "Response did not contain a message",
            )),
        }
    }

    async fn converse_stream(&self, call: ConverseCall) -> Result<TextStream, DomainError> {
        let response = self
            .client
            .converse_stream()
            .model_id(&call.model_id)
            .set_system(system_blocks(&call))
            .messages(build_message(&call)?)
            .inference_config(inference_configuration(&call))
            .send()
            .await
            .map_err(|e| DomainError::provider("bedrock", format!("API error: {}", e)))?;

        // Ends after the first receive error
        let deltas = futures::stream::unfold(Some(response.stream), |state| async move {
            let mut receiver = state?;
            loop {
                match receiver.recv().await {
                    Ok(Some(ConverseStreamOutput::ContentBlockDelta(event))) => {
                        if let Some(ContentBlockDelta::Text(text)) = event.delta() {
                            return Some((Ok(text.clone()), Some(receiver)));
                        }
                    }
                    Ok(Some(_)) => continue,
                    Ok(None) => return None,
                    Err(e) => {
                        let error =
                            DomainError::provider("bedrock", format!("Stream error: {}", e));
                        return Some((Err(error), None));
                    }
                }
            }
        });

        Ok(Box::pin(deltas))
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct MockConverseClient {
        calls: Mutex<Vec<ConverseCall>>,
        response: Mutex<Option<String>>,
        error: Mutex<Option<String>>,
    }

    impl MockConverseClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, text: &str) -> Self {
            *self.response.lock().unwrap() = Some(text.to_string());
            self
        }

        pub fn with_error(self, error: &str) -> Self {
            *self.error.lock().unwrap() = Some(error.to_string());
            self
        }

        pub fn calls(&self) -> Vec<ConverseCall> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, call: ConverseCall) -> Result<String, DomainError> {
            self.calls.lock().unwrap().push(call);

            if let Some(error) = self.error.lock().unwrap().as_ref() {
                return Err(DomainError::provider("bedrock", error.clone()));
            }

            self.response
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| DomainError::provider("bedrock", "No mock response"))
        }
    }

    #[async_trait]
    impl ConverseClientTrait for MockConverseClient {
        async fn converse(&self, call: ConverseCall) -> Result<String, DomainError> {
            self.answer(call)
        }

        async fn converse_stream(&self, call: ConverseCall) -> Result<TextStream, DomainError> {
            let text = self.answer(call)?;
            let deltas: Vec<Result<String, DomainError>> = text
                .split_inclusive(' ')
                .map(|part| Ok(part.to_string()))
                .collect();
            Ok(Box::pin(futures::stream::iter(deltas)))
        }
    }
}
