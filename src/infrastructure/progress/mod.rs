//! Progress sink implementations

mod channel_sink;
mod fan_out;
mod logging_sink;

pub use channel_sink::ChannelProgressSink;
pub use fan_out::FanOutSink;
pub use logging_sink::LoggingProgressSink;
