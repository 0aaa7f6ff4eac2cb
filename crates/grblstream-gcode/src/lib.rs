//! # grblstream G-code
//!
//! The subset of G-code handling the streamer needs:
//! - Comment stripping and word tokenizing
//! - Modal tracking of position, distance mode and arc-center mode
//! - Arc geometry (center-offset and radius forms)
//! - Arc subdivision into chords bounded by tolerance and angular step
//! - Line-by-line rewriting of `G2`/`G3` into `G1` sequences
//!
//! This is not a full interpreter: only the state needed for arc math and
//! absolute/incremental positioning is tracked.

pub mod converter;
pub mod geometry;
pub mod modal;
pub mod parser;
pub mod segmenter;

pub use converter::{ArcConverterConfig, ArcToLinearConverter};
pub use geometry::{normalize_angle, resolve_arc, ArcForm, ArcSpec, Point, ResolvedArc};
pub use modal::{ModalState, ModalTracker, Motion};
pub use parser::{parse_number, sanitize_lines, strip_comments, tokenize, Token};
pub use segmenter::ArcSegmenter;
