//! GRBL protocol: response classification and code descriptions

pub mod error_decoder;
pub mod response_parser;

pub use error_decoder::{decode_alarm, decode_error, format_alarm, format_error};
pub use response_parser::{
    parse_response, parse_status_report, GrblResponse, Position3, StatusReport,
};

/// Soft-reset real-time byte (Ctrl-X)
pub const SOFT_RESET: u8 = 0x18;

/// Status query real-time byte
pub const STATUS_QUERY: u8 = b'?';

/// Alarm unlock command
pub const UNLOCK_COMMAND: &str = "$X";
