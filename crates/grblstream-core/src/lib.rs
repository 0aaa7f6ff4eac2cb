//! # grblstream Core
//!
//! Core types shared by the grblstream crates:
//! - Error taxonomy for connection, streaming and I/O failures
//! - Streaming session and controller machine states
//! - Notification events and the listener trait they are delivered to

pub mod data;
pub mod error;
pub mod event;
pub mod listener;

pub use data::{MachineState, StreamState};
pub use error::{ConnectionError, Error, Result, StreamError};
pub use event::StreamEvent;
pub use listener::{NoOpListener, StreamListener};
