//! Arc-to-linear conversion
//!
//! Rewrites `G2`/`G3` commands into sequences of `G1` moves so controllers
//! without arc support (or with coarse arc handling) can run the program.
//! Every other line passes through unchanged while the modal state follows
//! along.

use crate::geometry::{resolve_arc, ArcForm, ArcSpec};
use crate::modal::{ModalState, ModalTracker, Motion};
use crate::parser::{strip_comments, tokenize, Token};
use crate::segmenter::ArcSegmenter;
use serde::{Deserialize, Serialize};

/// Letters re-emitted ahead of the chords of a converted arc
const CARRIED_WORDS: [char; 4] = ['F', 'S', 'M', 'T'];

/// Arc conversion parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcConverterConfig {
    /// Maximum distance between a chord and the true arc (mm)
    pub chord_tolerance: f64,
    /// Maximum angle swept by one chord (degrees)
    pub max_segment_degrees: f64,
    /// Decimal places of emitted coordinates
    pub decimals: usize,
}

impl Default for ArcConverterConfig {
    fn default() -> Self {
        Self {
            chord_tolerance: 0.01,
            max_segment_degrees: 5.0,
            decimals: 4,
        }
    }
}

impl ArcConverterConfig {
    /// Check the parameters are usable
    pub fn validate(&self) -> Result<(), String> {
        if !self.chord_tolerance.is_finite() || self.chord_tolerance <= 0.0 {
            return Err("Chord tolerance must be a positive number".to_string());
        }
        if !self.max_segment_degrees.is_finite()
            || self.max_segment_degrees <= 0.0
            || self.max_segment_degrees > 360.0
        {
            return Err("Maximum segment angle must be in (0, 360] degrees".to_string());
        }
        if self.decimals > 10 {
            return Err("Decimal places must be at most 10".to_string());
        }
        Ok(())
    }

    fn segmenter(&self) -> ArcSegmenter {
        ArcSegmenter::new(self.chord_tolerance, self.max_segment_degrees, self.decimals)
    }
}

/// Line-by-line arc rewriter with its own modal state
#[derive(Debug, Clone)]
pub struct ArcToLinearConverter {
    config: ArcConverterConfig,
    segmenter: ArcSegmenter,
    modal: ModalTracker,
}

impl Default for ArcToLinearConverter {
    fn default() -> Self {
        Self::new(ArcConverterConfig::default())
    }
}

impl ArcToLinearConverter {
    /// Create a converter starting at the origin in absolute mode
    pub fn new(config: ArcConverterConfig) -> Self {
        Self {
            config,
            segmenter: config.segmenter(),
            modal: ModalTracker::new(),
        }
    }

    /// Conversion parameters
    pub fn config(&self) -> &ArcConverterConfig {
        &self.config
    }

    /// Current modal state
    pub fn state(&self) -> &ModalState {
        self.modal.state()
    }

    /// Reset position and modes
    pub fn reset(&mut self) {
        self.modal.reset();
    }

    /// Set the current position, keeping the modes
    pub fn reset_position(&mut self, x: f64, y: f64) {
        self.modal.reset_position(x, y);
    }

    /// Convert one line into the lines to transmit in its place
    ///
    /// Non-arc lines come back unchanged (one element). Converted arcs come
    /// back as any `F`/`S`/`M`/`T` words of the line, one per line, followed
    /// by the `G1` chords. Chords are absolute; in `G91` they are wrapped in
    /// `G90` ... `G91`.
    pub fn convert_line(&mut self, line: &str) -> Vec<String> {
        let command = strip_comments(line);
        if command.is_empty() {
            return vec![line.to_string()];
        }

        let tokens = tokenize(&command);
        let explicit = self.modal.update_modes(&tokens);
        let x = word_value(&tokens, 'X');
        let y = word_value(&tokens, 'Y');
        let has_target = x.is_some() || y.is_some();

        // Axis words alone continue the active motion mode.
        let motion = explicit.or_else(|| {
            if has_target {
                self.modal.state().motion
            } else {
                None
            }
        });

        match motion {
            Some(Motion::Rapid) | Some(Motion::Linear) => {
                self.modal.update_position(x, y);
                vec![line.to_string()]
            }
            Some(arc @ (Motion::ArcClockwise | Motion::ArcCounterClockwise)) => {
                self.convert_arc(line, command, &tokens, arc, explicit.is_some(), x, y)
            }
            None => vec![line.to_string()],
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_arc(
        &mut self,
        line: &str,
        command: String,
        tokens: &[Token],
        motion: Motion,
        explicit: bool,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Vec<String> {
        let Some(end) = self.modal.target(x, y) else {
            return vec![command];
        };

        let i = word_value(tokens, 'I');
        let j = word_value(tokens, 'J');
        let form = if i.is_some() || j.is_some() {
            ArcForm::CenterOffset {
                i: i.unwrap_or(0.0),
                j: j.unwrap_or(0.0),
                incremental: self.modal.state().center_incremental,
            }
        } else if let Some(r) = word_value(tokens, 'R') {
            ArcForm::Radius(r)
        } else if explicit {
            tracing::debug!("Arc without center or radius passed through: {}", command);
            return vec![line.to_string()];
        } else {
            // Earlier chords left the controller in G1, so this runs as a linear move.
            self.modal.update_position(x, y);
            return vec![line.to_string()];
        };

        let spec = ArcSpec {
            start: self.modal.position(),
            end,
            clockwise: motion == Motion::ArcClockwise,
            form,
        };

        let mut output: Vec<String> = tokens
            .iter()
            .filter(|t| CARRIED_WORDS.contains(&t.letter))
            .map(|t| t.to_string())
            .collect();

        let incremental = !self.modal.state().absolute;
        if incremental {
            output.push("G90".to_string());
        }

        match resolve_arc(&spec) {
            Some(arc) => {
                let segments = self.segmenter.segment(&arc, end);
                tracing::debug!(
                    "Converted arc '{}' into {} segments (r={:.4}, sweep={:.4})",
                    command,
                    segments.len(),
                    arc.radius,
                    arc.sweep
                );
                output.extend(segments);
            }
            None => {
                tracing::debug!("Degenerate arc '{}' replaced by a linear move", command);
                output.push(self.segmenter.format_linear(end));
            }
        }

        if incremental {
            output.push("G91".to_string());
        }

        self.modal.move_to(end);
        output
    }

    /// Convert a sequence of lines
    pub fn convert_lines<I, S>(&mut self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .flat_map(|line| self.convert_line(line.as_ref()))
            .collect()
    }

    /// Convert a whole program
    pub fn convert_program(&mut self, program: &str) -> Vec<String> {
        self.convert_lines(program.lines())
    }
}

/// Numeric value of the last well-formed word with `letter`
fn word_value(tokens: &[Token], letter: char) -> Option<f64> {
    tokens
        .iter()
        .rev()
        .filter(|t| t.letter == letter)
        .find_map(Token::number)
}
