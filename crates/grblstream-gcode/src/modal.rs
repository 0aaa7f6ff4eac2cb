//! Modal state tracking
//!
//! Holds the running XY position together with the distance mode
//! (`G90`/`G91`), the arc-center mode (`G90.1`/`G91.1`) and the active motion
//! mode. State advances once per processed command, in document order, and
//! is only ever reset explicitly.

use crate::geometry::Point;
use crate::parser::Token;
use serde::{Deserialize, Serialize};

/// Active motion mode (G-code modal group 1, the subset we convert)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Motion {
    /// `G0` rapid
    Rapid,
    /// `G1` linear feed
    Linear,
    /// `G2` clockwise arc
    ArcClockwise,
    /// `G3` counter-clockwise arc
    ArcCounterClockwise,
}

impl Motion {
    /// Map a scaled G code (see [`Token::code`]) to a motion mode
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Motion::Rapid),
            10 => Some(Motion::Linear),
            20 => Some(Motion::ArcClockwise),
            30 => Some(Motion::ArcCounterClockwise),
            _ => None,
        }
    }

    /// Check if this is an arc mode
    pub fn is_arc(&self) -> bool {
        matches!(self, Motion::ArcClockwise | Motion::ArcCounterClockwise)
    }
}

/// Snapshot of the tracked modal state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    /// Current XY position
    pub position: Point,
    /// `G90` (true) or `G91` (false)
    pub absolute: bool,
    /// `G91.1` (true) or `G90.1` (false)
    pub center_incremental: bool,
    /// Last motion mode seen, cleared by `G80`
    pub motion: Option<Motion>,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            position: Point::default(),
            absolute: true,
            center_incremental: true,
            motion: None,
        }
    }
}

/// Tracks position and interpretation modes across a program
#[derive(Debug, Clone, Default)]
pub struct ModalTracker {
    state: ModalState,
}

impl ModalTracker {
    /// Create a tracker in the reset state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current modal state
    pub fn state(&self) -> &ModalState {
        &self.state
    }

    /// Current position
    pub fn position(&self) -> Point {
        self.state.position
    }

    /// Reset all modes and move the position to the origin
    pub fn reset(&mut self) {
        self.state = ModalState::default();
    }

    /// Set the position without touching the modes
    pub fn reset_position(&mut self, x: f64, y: f64) {
        self.state.position = Point::new(x, y);
    }

    /// Apply the mode-changing `G` words of a line
    ///
    /// Returns the motion mode named explicitly on the line, if any. The last
    /// motion word wins, as it would on a controller that accepted the block.
    pub fn update_modes(&mut self, tokens: &[Token]) -> Option<Motion> {
        let mut explicit = None;

        for token in tokens.iter().filter(|t| t.letter == 'G') {
            let Some(code) = token.code() else {
                continue;
            };
            match code {
                900 => self.state.absolute = true,
                910 => self.state.absolute = false,
                901 => self.state.center_incremental = false,
                911 => self.state.center_incremental = true,
                800 => self.state.motion = None,
                _ => {
                    if let Some(motion) = Motion::from_code(code) {
                        self.state.motion = Some(motion);
                        explicit = Some(motion);
                    }
                }
            }
        }

        explicit
    }

    /// Resolve the `X`/`Y` words of a line into a target point
    ///
    /// Missing axes keep the current coordinate. Returns `None` when the line
    /// carries no usable `X` or `Y` value.
    pub fn target(&self, x: Option<f64>, y: Option<f64>) -> Option<Point> {
        if x.is_none() && y.is_none() {
            return None;
        }

        let current = self.state.position;
        let target = if self.state.absolute {
            Point::new(x.unwrap_or(current.x), y.unwrap_or(current.y))
        } else {
            Point::new(current.x + x.unwrap_or(0.0), current.y + y.unwrap_or(0.0))
        };
        Some(target)
    }

    /// Advance the position by the `X`/`Y` words of a line
    pub fn update_position(&mut self, x: Option<f64>, y: Option<f64>) {
        if let Some(target) = self.target(x, y) {
            self.state.position = target;
        }
    }

    /// Move directly to a known end point (used after an arc)
    pub fn move_to(&mut self, point: Point) {
        self.state.position = point;
    }
}
