//! Streaming session configuration

use crate::communication::{FlowControlConfig, SerialSettings};
use grblstream_core::{Result, StreamError};
use grblstream_gcode::ArcConverterConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Streamer configuration
///
/// Every field has a default, so partial configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Serial port name
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Write timeout in milliseconds
    pub write_timeout_ms: u64,
    /// Reader poll timeout in milliseconds
    pub read_poll_ms: u64,
    /// Assert DTR after opening
    pub dtr: bool,
    /// Assert RTS after opening
    pub rts: bool,
    /// Controller receive-buffer accounting
    pub flow_control: FlowControlConfig,
    /// How long the sender waits for one response before re-checking
    pub response_timeout_ms: u64,
    /// Interval between status queries while draining
    pub status_poll_interval_ms: u64,
    /// Upper bound on the wait for the machine to go idle
    pub completion_timeout_secs: u64,
    /// Pause after the soft reset
    pub reset_settle_ms: u64,
    /// Pause after the unlock command
    pub unlock_settle_ms: u64,
    /// Emit a progress event every this many commands
    pub progress_interval: usize,
    /// Capacity of the notification queue
    pub event_queue_capacity: usize,
    /// Rewrite arcs into linear moves before streaming
    pub convert_arcs: bool,
    /// Arc conversion parameters
    pub arc: ArcConverterConfig,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
            write_timeout_ms: 1000,
            read_poll_ms: 100,
            dtr: false,
            rts: false,
            flow_control: FlowControlConfig::default(),
            response_timeout_ms: 5000,
            status_poll_interval_ms: 2000,
            completion_timeout_secs: 300,
            reset_settle_ms: 2000,
            unlock_settle_ms: 500,
            progress_interval: 10,
            event_queue_capacity: 100,
            convert_arcs: false,
            arc: ArcConverterConfig {
                max_segment_degrees: 10.0,
                ..ArcConverterConfig::default()
            },
        }
    }
}

impl StreamerConfig {
    /// Create a configuration for `port` with defaults elsewhere
    pub fn for_port(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Serial parameters for opening the port
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            timeout: self.write_timeout(),
            dtr: self.dtr,
            rts: self.rts,
        }
    }

    /// Write timeout
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Reader poll timeout
    pub fn read_poll(&self) -> Duration {
        Duration::from_millis(self.read_poll_ms)
    }

    /// Per-response wait while streaming
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Status query interval while draining
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    /// Drain time limit
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    /// Pause after the soft reset
    pub fn reset_settle(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms)
    }

    /// Pause after the unlock command
    pub fn unlock_settle(&self) -> Duration {
        Duration::from_millis(self.unlock_settle_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| -> Result<()> {
            Err(StreamError::InvalidConfig {
                reason: reason.to_string(),
            }
            .into())
        };

        if self.port.trim().is_empty() {
            return invalid("Port name must not be empty");
        }
        if self.baud_rate == 0 {
            return invalid("Baud rate must be > 0");
        }
        if self.write_timeout_ms == 0 || self.read_poll_ms == 0 || self.response_timeout_ms == 0 {
            return invalid("Timeouts must be > 0");
        }
        if self.status_poll_interval_ms == 0 {
            return invalid("Status poll interval must be > 0");
        }
        if self.progress_interval == 0 {
            return invalid("Progress interval must be > 0");
        }
        if self.event_queue_capacity == 0 {
            return invalid("Event queue capacity must be > 0");
        }
        if self.flow_control.capacity == 0 {
            return invalid("Receive buffer capacity must be > 0");
        }
        if self.flow_control.margin >= self.flow_control.capacity {
            return invalid("Receive buffer margin must be smaller than its capacity");
        }
        if let Err(reason) = self.arc.validate() {
            return invalid(&reason);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StreamerConfig::default();
        assert_eq!(config.port, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.flow_control.usable(), 122);
        assert_eq!(config.response_timeout(), Duration::from_secs(5));
        assert_eq!(config.completion_timeout(), Duration::from_secs(300));
        assert_eq!(config.arc.max_segment_degrees, 10.0);
        assert!(!config.convert_arcs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = StreamerConfig::default();
        config.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = StreamerConfig::default();
        config.flow_control.margin = 127;
        assert!(config.validate().is_err());

        let mut config = StreamerConfig::default();
        config.arc.chord_tolerance = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.is_stream_error());
        assert!(err.to_string().contains("Chord tolerance"));
    }

    #[test]
    fn test_serial_settings() {
        let config = StreamerConfig {
            dtr: true,
            ..StreamerConfig::for_port("COM4")
        };
        let settings = config.serial_settings();
        assert_eq!(settings.port, "COM4");
        assert_eq!(settings.timeout, Duration::from_millis(1000));
        assert!(settings.dtr);
        assert!(!settings.rts);
    }
}
