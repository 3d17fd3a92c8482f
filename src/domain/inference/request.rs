use bytes::Bytes;

use crate::domain::document::DocumentFormat;

/// A document attached to an inference call as raw bytes.
///
/// The service applies its own document understanding, so the payload keeps
/// format, name and bytes as separate fields instead of extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    pub format: DocumentFormat,
    pub name: String,
    pub bytes: Bytes,
}

impl DocumentPayload {
    pub fn new(format: DocumentFormat, name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            format,
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One call to the inference service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    /// System directive
    pub system: String,
    /// Optional attached document
    pub document: Option<DocumentPayload>,
    /// User text; carries the question
    pub text: String,
}

impl InferenceRequest {
    pub fn builder() -> InferenceRequestBuilder {
        InferenceRequestBuilder::new()
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Name of the attached document, if any
    pub fn document_name(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.name.as_str())
    }
}

/// Builder for InferenceRequest
#[derive(Debug, Default)]
pub struct InferenceRequestBuilder {
    system: String,
    document: Option<DocumentPayload>,
    text: String,
}

impl InferenceRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system(mut self, directive: impl Into<String>) -> Self {
        self.system = directive.into();
        self
    }

    pub fn document(mut self, payload: DocumentPayload) -> Self {
        self.document = Some(payload);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn build(self) -> InferenceRequest {
        InferenceRequest {
            system: self.system,
            document: self.document,
            text: self.text,
        }
    }
}
