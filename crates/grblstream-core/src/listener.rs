//! Stream listener interface
//!
//! Defines the notification hooks an embedding application implements.

use async_trait::async_trait;

/// Listener trait for streaming notifications
///
/// Every method defaults to a no-op. Callbacks are only ever invoked from the
/// notifier task, never from the reader or the sender, so an implementation
/// may block or await without stalling the protocol.
#[async_trait]
pub trait StreamListener: Send + Sync {
    /// Called with job progress (100 only on completion)
    async fn on_progress(&self, _percent: u8, _command: &str) {}

    /// Called when the controller reports an alarm
    async fn on_alarm(&self, _line: &str) {}

    /// Called when the controller rejects a command
    async fn on_error(&self, _line: &str) {}

    /// Called for every write to the controller
    async fn on_send(&self, _line: &str) {}

    /// Called for every line received from the controller
    async fn on_receive(&self, _line: &str) {}
}

/// Listener that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpListener;

impl StreamListener for NoOpListener {}
