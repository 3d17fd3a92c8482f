//! Infrastructure layer - External service implementations

pub mod llm;
pub mod logging;
pub mod progress;
pub mod splitters;
