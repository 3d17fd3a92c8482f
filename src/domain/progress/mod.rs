//! Progress notification contract

mod notifier;
mod sink;

pub use notifier::Notifier;
pub use sink::{NoopSink, ProgressEvent, ProgressSink, SinkError};

#[cfg(test)]
pub use sink::MockProgressSink;
