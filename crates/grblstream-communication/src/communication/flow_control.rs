//! Receive-buffer accounting
//!
//! Implements character-counting flow control for GRBL-class controllers:
//! every line written occupies its length plus the newline in the
//! controller's serial receive buffer until the matching `ok` or `error`
//! comes back. Responses are matched to commands in FIFO order.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Receive-buffer size and safety margin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowControlConfig {
    /// Controller receive buffer size in bytes
    pub capacity: usize,
    /// Bytes kept free below the capacity
    pub margin: usize,
}

impl Default for FlowControlConfig {
    fn default() -> Self {
        Self {
            capacity: 127,
            margin: 5,
        }
    }
}

impl FlowControlConfig {
    /// Bytes that may be outstanding at once
    pub fn usable(&self) -> usize {
        self.capacity.saturating_sub(self.margin)
    }
}

/// A command written but not yet answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutstandingCommand {
    /// Command text, without the newline
    pub text: String,
    /// Length of the text in bytes
    pub byte_len: usize,
}

impl OutstandingCommand {
    /// Buffer space the command occupies, newline included
    pub fn footprint(&self) -> usize {
        self.byte_len + 1
    }
}

/// Tracks bytes outstanding in the controller's receive buffer
#[derive(Debug, Clone, Default)]
pub struct FlowControlTracker {
    config: FlowControlConfig,
    outstanding: VecDeque<OutstandingCommand>,
    used: usize,
}

impl FlowControlTracker {
    /// Create an empty tracker
    pub fn new(config: FlowControlConfig) -> Self {
        Self {
            config,
            outstanding: VecDeque::new(),
            used: 0,
        }
    }

    /// Buffer configuration
    pub fn config(&self) -> &FlowControlConfig {
        &self.config
    }

    /// Check whether `command` may be written now
    ///
    /// An empty tracker always admits, so a command that can never fit is
    /// still sent once everything before it has been answered.
    pub fn can_send(&self, command: &str) -> bool {
        self.outstanding.is_empty() || self.used + command.len() + 1 <= self.config.usable()
    }

    /// Check whether `command` fits the buffer at all
    pub fn fits(&self, command: &str) -> bool {
        command.len() + 1 <= self.config.usable()
    }

    /// Record a command as written
    pub fn record_sent(&mut self, command: &str) {
        let entry = OutstandingCommand {
            text: command.to_string(),
            byte_len: command.len(),
        };
        self.used += entry.footprint();
        self.outstanding.push_back(entry);
    }

    /// Release the oldest command after an `ok`
    pub fn on_acknowledge(&mut self) -> Option<OutstandingCommand> {
        self.release_oldest()
    }

    /// Release the oldest command after an `error`
    ///
    /// The controller does not say which line failed; the oldest outstanding
    /// command is assumed.
    pub fn on_fault(&mut self) -> Option<OutstandingCommand> {
        self.release_oldest()
    }

    fn release_oldest(&mut self) -> Option<OutstandingCommand> {
        let entry = self.outstanding.pop_front()?;
        self.used = self.used.saturating_sub(entry.footprint());
        Some(entry)
    }

    /// Bytes currently outstanding
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    /// Number of commands awaiting a response
    pub fn outstanding_len(&self) -> usize {
        self.outstanding.len()
    }

    /// Check whether nothing is outstanding
    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Bytes that can still be written
    pub fn available(&self) -> usize {
        self.config.usable().saturating_sub(self.used)
    }

    /// Buffer usage as a percentage of the usable space
    pub fn usage_percent(&self) -> f64 {
        let usable = self.config.usable();
        if usable == 0 {
            return 100.0;
        }
        (self.used as f64 / usable as f64) * 100.0
    }

    /// Forget every outstanding command
    pub fn clear(&mut self) {
        self.outstanding.clear();
        self.used = 0;
    }
}
