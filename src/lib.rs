//! PMP Document Processor
//!
//! Answers questions about documents of any size with a remote model:
//! - Small files are sent whole in a single call
//! - Large files are split into fragments analyzed concurrently
//! - Partial analyses are merged in order and synthesized into one answer

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
