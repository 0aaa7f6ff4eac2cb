//! Notification events produced by a streaming session
//!
//! Events are produced by the reader and the sender, queued on a bounded
//! channel, and consumed exactly once by the notifier, which hands each one
//! to a single [`StreamListener`](crate::StreamListener) callback.

use crate::listener::StreamListener;

/// Streaming session event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Job progress; 100 is only ever sent on completion
    Progress {
        /// Percent of commands transmitted
        percent: u8,
        /// Last command transmitted (or `"completed"`)
        command: String,
    },
    /// Controller reported an alarm
    Alarm(String),
    /// Controller rejected a command, or the link failed
    Error(String),
    /// Data written to the controller
    Sent(String),
    /// Line received from the controller
    Received(String),
}

impl StreamEvent {
    /// Short name of the event kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::Alarm(_) => "alarm",
            StreamEvent::Error(_) => "error",
            StreamEvent::Sent(_) => "send",
            StreamEvent::Received(_) => "receive",
        }
    }

    /// Deliver this event to the matching listener callback
    pub async fn dispatch(&self, listener: &dyn StreamListener) {
        match self {
            StreamEvent::Progress { percent, command } => {
                listener.on_progress(*percent, command).await
            }
            StreamEvent::Alarm(line) => listener.on_alarm(line).await,
            StreamEvent::Error(line) => listener.on_error(line).await,
            StreamEvent::Sent(line) => listener.on_send(line).await,
            StreamEvent::Received(line) => listener.on_receive(line).await,
        }
    }
}

impl std::fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamEvent::Progress { percent, command } => {
                write!(f, "Progress {}% ({})", percent, command)
            }
            StreamEvent::Alarm(line) => write!(f, "Alarm: {}", line),
            StreamEvent::Error(line) => write!(f, "Error: {}", line),
            StreamEvent::Sent(line) => write!(f, "Sent: {}", line),
            StreamEvent::Received(line) => write!(f, "Received: {}", line),
        }
    }
}
