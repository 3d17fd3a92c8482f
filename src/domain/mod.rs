//! Domain layer - documents, fragments and the map-reduce pipeline

pub mod document;
pub mod error;
pub mod inference;
pub mod processing;
pub mod progress;
pub mod splitting;

pub use document::{DocumentFile, DocumentFormat, Fragment, PartialResult, Question};
pub use error::DomainError;
pub use inference::{DocumentPayload, InferenceClient, InferenceRequest, TextStream};
pub use processing::{
    AnswerStream, DocumentProcessor, FailurePolicy, ProcessingConfig, ProcessingError,
};
pub use progress::{NoopSink, ProgressEvent, ProgressSink, SinkError};
pub use splitting::{FragmentSplitter, SplitError};
