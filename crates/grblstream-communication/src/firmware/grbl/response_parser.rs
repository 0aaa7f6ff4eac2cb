//! GRBL response classification
//!
//! Every line received from the controller is classified exactly once.
//! Status reports are recognised before anything else so that a report can
//! never be mistaken for an acknowledgement.

use super::error_decoder::{format_alarm, format_error};
use grblstream_core::MachineState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-axis position from a status report
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3 {
    /// X axis
    pub x: f64,
    /// Y axis
    pub y: f64,
    /// Z axis
    pub z: f64,
}

/// Parsed `<State|MPos:...|WPos:...>` report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Machine state
    pub state: MachineState,
    /// Machine position, when reported
    pub machine_pos: Option<Position3>,
    /// Work position, when reported
    pub work_pos: Option<Position3>,
}

/// A classified controller response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GrblResponse {
    /// Command accepted
    Ok,
    /// Command rejected
    Error {
        /// Numeric code, if the line carried one
        code: Option<u8>,
        /// Raw line
        line: String,
    },
    /// Controller entered alarm state
    Alarm {
        /// Numeric code, if the line carried one
        code: Option<u8>,
        /// Raw line
        line: String,
    },
    /// Real-time status report
    Status(StatusReport),
    /// Banner, feedback message, setting or anything else
    Message(String),
}

impl GrblResponse {
    /// Check if this response releases a receive-buffer slot
    pub fn completes_command(&self) -> bool {
        matches!(self, GrblResponse::Ok | GrblResponse::Error { .. })
    }
}

impl fmt::Display for GrblResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error {
                code: Some(code), ..
            } => write!(f, "{}", format_error(*code)),
            Self::Error { line, .. } => write!(f, "{}", line),
            Self::Alarm {
                code: Some(code), ..
            } => write!(f, "{}", format_alarm(*code)),
            Self::Alarm { line, .. } => write!(f, "{}", line),
            Self::Status(report) => write!(f, "status:{}", report.state),
            Self::Message(msg) => write!(f, "message:{}", msg),
        }
    }
}

/// Classify one received line; `None` for blank lines
pub fn parse_response(line: &str) -> Option<GrblResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(body) = line.strip_prefix('<') {
        let body = body.strip_suffix('>').unwrap_or(body);
        return Some(GrblResponse::Status(parse_status_report(body)));
    }

    if line.eq_ignore_ascii_case("ok") {
        return Some(GrblResponse::Ok);
    }

    if let Some(rest) = strip_prefix_ignore_case(line, "error") {
        return Some(GrblResponse::Error {
            code: parse_code(rest),
            line: line.to_string(),
        });
    }

    if let Some(rest) = strip_prefix_ignore_case(line, "alarm") {
        return Some(GrblResponse::Alarm {
            code: parse_code(rest),
            line: line.to_string(),
        });
    }

    Some(GrblResponse::Message(line.to_string()))
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

fn parse_code(rest: &str) -> Option<u8> {
    rest.trim_start_matches(':').trim().parse::<u8>().ok()
}

/// Parse the body of a status report (without the angle brackets)
///
/// Accepts GRBL 1.1 `|` separated fields. For the older comma form only the
/// state is extracted.
pub fn parse_status_report(body: &str) -> StatusReport {
    let mut fields = body.split('|');
    let state_field = fields.next().unwrap_or_default();
    let state_field = state_field.split(',').next().unwrap_or_default();

    let mut report = StatusReport {
        state: MachineState::from_status_field(state_field),
        machine_pos: None,
        work_pos: None,
    };

    for field in fields {
        let field = field.trim();
        if let Some(pos) = field.strip_prefix("MPos:") {
            report.machine_pos = parse_position(pos);
        } else if let Some(pos) = field.strip_prefix("WPos:") {
            report.work_pos = parse_position(pos);
        }
    }

    report
}

fn parse_position(text: &str) -> Option<Position3> {
    let coords: Vec<f64> = text
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    Some(Position3 {
        x: *coords.first()?,
        y: coords.get(1).copied().unwrap_or(0.0),
        z: coords.get(2).copied().unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok() {
        assert_eq!(parse_response("ok"), Some(GrblResponse::Ok));
        assert_eq!(parse_response(" OK\r"), Some(GrblResponse::Ok));
        assert_eq!(parse_response(""), None);
        assert_eq!(parse_response("\r\n"), None);
    }

    #[test]
    fn test_error_and_alarm() {
        assert_eq!(
            parse_response("error:9"),
            Some(GrblResponse::Error {
                code: Some(9),
                line: "error:9".to_string()
            })
        );
        assert_eq!(
            parse_response("ALARM:2"),
            Some(GrblResponse::Alarm {
                code: Some(2),
                line: "ALARM:2".to_string()
            })
        );
        match parse_response("error: Bad number format") {
            Some(GrblResponse::Error { code: None, line }) => {
                assert_eq!(line, "error: Bad number format")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_status_report() {
        let response = parse_response("<Idle|MPos:1.000,2.000,3.000|FS:0,0>").unwrap();
        let GrblResponse::Status(report) = response else {
            panic!("expected status");
        };
        assert_eq!(report.state, MachineState::Idle);
        assert_eq!(
            report.machine_pos,
            Some(Position3 {
                x: 1.0,
                y: 2.0,
                z: 3.0
            })
        );
        assert_eq!(report.work_pos, None);
    }

    #[test]
    fn test_status_is_never_an_ack() {
        // A report whose fields happen to contain "ok" stays a status report.
        let response = parse_response("<Hold:0|WPos:0,0,0|Pn:ok>").unwrap();
        assert!(!response.completes_command());
        assert!(matches!(response, GrblResponse::Status(_)));
        assert!(parse_response("ok").unwrap().completes_command());
        assert!(parse_response("error:1").unwrap().completes_command());
    }

    #[test]
    fn test_legacy_status_state() {
        let GrblResponse::Status(report) =
            parse_response("<Run,MPos:0.000,0.000,0.000,WPos:0.000,0.000,0.000>").unwrap()
        else {
            panic!("expected status");
        };
        assert_eq!(report.state, MachineState::Run);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            parse_response("Grbl 1.1h ['$' for help]"),
            Some(GrblResponse::Message("Grbl 1.1h ['$' for help]".to_string()))
        );
        assert!(matches!(
            parse_response("[MSG:Caution: Unlocked]"),
            Some(GrblResponse::Message(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(GrblResponse::Ok.to_string(), "ok");
        assert_eq!(
            parse_response("error:22").unwrap().to_string(),
            "error:22 - Feed rate undefined"
        );
    }
}
