//! Session and controller state types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Streaming session state
///
/// Tracks the lifecycle of one streaming session from connection through
/// completion. `Faulted` is entered from any state when the controller
/// reports an alarm; the sender restores its own phase once it has reacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StreamState {
    /// No stream running (closed, or open and waiting for a job)
    #[default]
    Idle,
    /// Soft reset and unlock in progress
    Initializing,
    /// Commands are being paced into the controller
    Streaming,
    /// All commands sent, waiting for the machine to go idle
    Draining,
    /// Last job finished (confirmed or timed out)
    Completed,
    /// Controller raised an alarm
    Faulted,
}

impl StreamState {
    /// Check if a job is currently being transmitted or drained
    pub fn is_active(&self) -> bool {
        matches!(self, StreamState::Streaming | StreamState::Draining)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Draining => write!(f, "Draining"),
            Self::Completed => write!(f, "Completed"),
            Self::Faulted => write!(f, "Faulted"),
        }
    }
}

/// Machine state as reported in a controller status report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    /// Ready, planner empty
    Idle,
    /// Executing motion
    Run,
    /// Feed hold
    Hold,
    /// Jogging
    Jog,
    /// Alarm lock
    Alarm,
    /// Safety door open
    Door,
    /// Check (dry-run) mode
    Check,
    /// Homing cycle
    Home,
    /// Sleep mode
    Sleep,
    /// Anything the parser does not recognise
    Unknown,
}

impl MachineState {
    /// Parse the state field of a status report (`Hold:0`, `Door:1` keep their prefix)
    pub fn from_status_field(field: &str) -> Self {
        match field.trim() {
            s if s.starts_with("Idle") => MachineState::Idle,
            s if s.starts_with("Run") => MachineState::Run,
            s if s.starts_with("Hold") => MachineState::Hold,
            s if s.starts_with("Jog") => MachineState::Jog,
            s if s.starts_with("Alarm") => MachineState::Alarm,
            s if s.starts_with("Door") => MachineState::Door,
            s if s.starts_with("Check") => MachineState::Check,
            s if s.starts_with("Home") => MachineState::Home,
            s if s.starts_with("Sleep") => MachineState::Sleep,
            _ => MachineState::Unknown,
        }
    }

    /// Check if the machine has finished all motion
    pub fn is_idle(&self) -> bool {
        matches!(self, MachineState::Idle)
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Run => "Run",
            Self::Hold => "Hold",
            Self::Jog => "Jog",
            Self::Alarm => "Alarm",
            Self::Door => "Door",
            Self::Check => "Check",
            Self::Home => "Home",
            Self::Sleep => "Sleep",
            Self::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}
