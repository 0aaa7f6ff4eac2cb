//! Streaming engine and its background tasks

pub mod config;
pub mod engine;
pub mod notifier;
pub mod reader;
pub mod writer;

pub use config::StreamerConfig;
pub use engine::{GrblStreamer, StreamSummary};
pub use notifier::{spawn_notifier, EventSink};
pub use writer::LineWriter;
