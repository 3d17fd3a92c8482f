//! Map-reduce processing of large documents

mod config;
mod error;
mod processor;
pub mod prompts;
mod reducer;
mod worker_pool;

pub use config::{
    FailurePolicy, ProcessingConfig, DEFAULT_BYTES_THRESHOLD, DEFAULT_CALL_TIMEOUT_SECS,
    DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_MAX_FRAGMENT_BYTES, DEFAULT_MAX_WORKERS,
};
pub use error::ProcessingError;
pub use processor::{AnswerStream, DocumentProcessor};
pub use reducer::{reduce, ConsolidatedContext, TRUNCATION_MARKER};
pub use worker_pool::WorkerPool;
