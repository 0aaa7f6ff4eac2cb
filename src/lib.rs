//! # grblstream
//!
//! Streams G-code to GRBL-class CNC controllers over a serial port:
//! - Character-counting flow control against the controller's receive buffer
//! - Soft reset and unlock on connect, automatic unlock after alarms
//! - Drain phase that waits for the machine to report idle
//! - Optional rewriting of `G2`/`G3` arcs into `G1` chords
//!
//! ## Architecture
//!
//! 1. **grblstream-core** - Errors, session states, events, listener trait
//! 2. **grblstream-gcode** - Tokenizing, modal tracking, arc conversion
//! 3. **grblstream-communication** - Serial transport, GRBL responses, streaming engine
//! 4. **grblstream-settings** - JSON/TOML configuration files
//! 5. **grblstream** - Re-exports and logging setup

pub use grblstream_communication::{
    list_ports, FlowControlConfig, FlowControlTracker, GrblResponse, GrblStreamer,
    RealSerialPort, SerialPortInfo, StreamSummary, StreamerConfig, Transport,
};
pub use grblstream_core::{
    ConnectionError, Error, MachineState, NoOpListener, Result, StreamError, StreamEvent,
    StreamListener, StreamState,
};
pub use grblstream_gcode::{ArcConverterConfig, ArcToLinearConverter};
pub use grblstream_settings::{default_config_path, Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support (`info` when unset)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(())
}

/// Initialize logging as one JSON object per line
///
/// Same filtering as [`init_logging`], for log collectors.
pub fn init_json_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_current_span(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(())
}
