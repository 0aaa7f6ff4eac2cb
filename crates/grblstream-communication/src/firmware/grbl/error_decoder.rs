//! GRBL error and alarm code descriptions
//!
//! Covers the GRBL 1.1 code tables. Unknown codes (including grblHAL
//! extensions) decode to `None` and are reported by number only.

/// Describe a GRBL `error:N` code
pub fn decode_error(code: u8) -> Option<&'static str> {
    let description = match code {
        1 => "Expected command letter",
        2 => "Bad number format",
        3 => "Invalid '$' system command",
        4 => "Negative value for an expected positive value",
        5 => "Homing cycle not enabled",
        6 => "Step pulse time below 3us",
        7 => "EEPROM read failed, defaults restored",
        8 => "'$' command requires the machine to be idle",
        9 => "G-code locked out during alarm or jog state",
        10 => "Soft limits require homing to be enabled",
        11 => "Line exceeds maximum length",
        12 => "Setting exceeds the maximum step rate",
        13 => "Safety door opened",
        14 => "Build info or startup line too long",
        15 => "Jog target exceeds machine travel",
        16 => "Invalid jog command",
        17 => "Laser mode requires PWM output",
        20 => "Unsupported or invalid G-code command",
        21 => "More than one command from the same modal group",
        22 => "Feed rate undefined",
        23 => "Command requires an integer value",
        24 => "More than one command requiring axis words",
        25 => "Repeated G-code word",
        26 => "Command requires axis words but none were given",
        27 => "Line number out of range",
        28 => "Missing required P or L value",
        29 => "Unsupported work coordinate system",
        30 => "G53 requires G0 or G1 motion mode",
        31 => "Unused axis words with G80 active",
        32 => "Arc has no axis words in the selected plane",
        33 => "Invalid motion target",
        34 => "Arc radius definition cannot be traced",
        35 => "Arc offset definition is missing its plane offsets",
        36 => "Unused G-code words in block",
        37 => "Tool length offset applied to an unsupported axis",
        38 => "Tool number exceeds the maximum",
        _ => return None,
    };
    Some(description)
}

/// Describe a GRBL `ALARM:N` code
pub fn decode_alarm(code: u8) -> Option<&'static str> {
    let description = match code {
        1 => "Hard limit triggered, position likely lost",
        2 => "Soft limit: target exceeds machine travel",
        3 => "Reset while in motion, position likely lost",
        4 => "Probe not in the expected initial state",
        5 => "Probe did not contact the workpiece",
        6 => "Homing failed: reset during cycle",
        7 => "Homing failed: safety door opened",
        8 => "Homing failed: could not clear limit switch on pull-off",
        9 => "Homing failed: limit switch not found",
        10 => "Homing failed: second switch not found on dual axis",
        _ => return None,
    };
    Some(description)
}

/// Format an error code with its description
pub fn format_error(code: u8) -> String {
    match decode_error(code) {
        Some(description) => format!("error:{} - {}", code, description),
        None => format!("error:{} - Unknown error code", code),
    }
}

/// Format an alarm code with its description
pub fn format_alarm(code: u8) -> String {
    match decode_alarm(code) {
        Some(description) => format!("ALARM:{} - {}", code, description),
        None => format!("ALARM:{} - Unknown alarm code", code),
    }
}
