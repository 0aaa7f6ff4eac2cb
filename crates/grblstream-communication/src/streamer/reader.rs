//! Receive loop
//!
//! Runs on a blocking thread with its own transport handle. Splits incoming
//! bytes into lines, classifies each line, reacts to alarms immediately and
//! forwards every response to the sender.

use super::notifier::EventSink;
use super::writer::LineWriter;
use crate::communication::Transport;
use crate::firmware::grbl::{parse_response, GrblResponse, UNLOCK_COMMAND};
use grblstream_core::{StreamEvent, StreamState};
use parking_lot::RwLock;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Pause after an empty or failed read
const READ_BACKOFF: Duration = Duration::from_millis(10);

/// A classified line handed to the sender
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    /// The classified response
    pub response: GrblResponse,
    /// An alarm unlock was written in reaction to this line
    pub unlock_sent: bool,
}

/// Everything the receive loop owns
pub struct Reader {
    /// Dedicated read handle
    pub port: Box<dyn Transport>,
    /// Shared write handle, for the alarm unlock
    pub writer: LineWriter,
    /// Classified responses for the sender
    pub responses: mpsc::UnboundedSender<Incoming>,
    /// Notification queue
    pub events: EventSink,
    /// Session state, set to `Faulted` on alarm
    pub state: Arc<RwLock<StreamState>>,
    /// Cleared by `close`
    pub active: watch::Receiver<bool>,
}

impl Reader {
    /// Start the loop on the blocking pool
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || self.run())
    }

    fn run(mut self) {
        let mut buf = [0u8; 256];
        let mut pending = String::new();

        while *self.active.borrow() {
            match self.port.read(&mut buf) {
                Ok(0) => std::thread::sleep(READ_BACKOFF),
                Ok(n) => {
                    pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                    while let Some(pos) = pending.find('\n') {
                        let line: String = pending.drain(..=pos).collect();
                        self.handle_line(line.trim());
                    }
                }
                Err(e) if is_timeout(&e) => {}
                Err(e) => {
                    tracing::error!("Read from {} failed: {}", self.port.name(), e);
                    std::thread::sleep(READ_BACKOFF);
                }
            }
        }

        tracing::debug!("Reader stopped");
    }

    fn handle_line(&mut self, line: &str) {
        let Some(response) = parse_response(line) else {
            return;
        };

        tracing::debug!("Received: {}", line);
        self.events.emit(StreamEvent::Received(line.to_string()));

        let mut unlock_sent = false;
        match &response {
            GrblResponse::Error { .. } => {
                tracing::warn!("Controller error: {}", response);
                self.events.emit(StreamEvent::Error(line.to_string()));
            }
            GrblResponse::Alarm { .. } => {
                tracing::warn!("Controller alarm: {}", response);
                match self.writer.write_line(UNLOCK_COMMAND) {
                    Ok(()) => unlock_sent = true,
                    Err(e) => tracing::error!("Failed to send unlock after alarm: {}", e),
                }
                self.events.emit(StreamEvent::Alarm(line.to_string()));
                *self.state.write() = StreamState::Faulted;
            }
            _ => {}
        }

        let incoming = Incoming {
            response,
            unlock_sent,
        };
        if self.responses.send(incoming).is_err() {
            tracing::trace!("Response dropped, sender gone: {}", line);
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}
