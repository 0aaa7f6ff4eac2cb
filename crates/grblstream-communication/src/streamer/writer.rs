//! Shared write handle
//!
//! The sender and the reader both write to the controller (the reader only
//! for the alarm unlock). A single mutex-guarded handle keeps their lines
//! from interleaving.

use super::notifier::EventSink;
use crate::communication::{BufferSide, Transport};
use grblstream_core::{ConnectionError, StreamEvent};
use parking_lot::Mutex;
use std::sync::Arc;

/// Line-oriented writer shared between tasks
#[derive(Clone)]
pub struct LineWriter {
    port: Arc<Mutex<Box<dyn Transport>>>,
    events: EventSink,
}

impl LineWriter {
    /// Wrap a transport handle
    pub fn new(port: Box<dyn Transport>, events: EventSink) -> Self {
        Self {
            port: Arc::new(Mutex::new(port)),
            events,
        }
    }

    /// Write `line` followed by a newline
    pub fn write_line(&self, line: &str) -> Result<(), ConnectionError> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.write(&data, line)
    }

    /// Write a single real-time byte with no newline
    pub fn write_realtime(&self, byte: u8) -> Result<(), ConnectionError> {
        self.write(&[byte], &char::from(byte).to_string())
    }

    fn write(&self, data: &[u8], text: &str) -> Result<(), ConnectionError> {
        self.port
            .lock()
            .write_all(data)
            .map_err(|e| ConnectionError::WriteFailed {
                reason: e.to_string(),
            })?;
        tracing::debug!("Sent: {:?}", text);
        self.events.emit(StreamEvent::Sent(text.to_string()));
        Ok(())
    }

    /// Discard buffered bytes on the link
    pub fn clear(&self, which: BufferSide) -> std::io::Result<()> {
        self.port.lock().clear(which)
    }
}
