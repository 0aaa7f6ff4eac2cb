//! Error handling for grblstream
//!
//! Provides error types for the layers of the streamer:
//! - Connection errors (serial transport)
//! - Stream errors (session lifecycle, configuration, command source)
//!
//! Controller-reported faults (`error:N`, `ALARM:N`) are not errors in this
//! sense: they are absorbed by the streaming engine and surfaced as events.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Connection error type
///
/// Represents errors related to the serial link to the controller.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// Failed to open port (after any fallback name was tried)
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// No session is open
    #[error("Not connected")]
    NotConnected,

    /// Writing to the transport failed
    #[error("Write failed: {reason}")]
    WriteFailed {
        /// The reason the write failed.
        reason: String,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },

    /// Serial port error
    #[error("Serial port error: {reason}")]
    SerialError {
        /// The reason for the serial port error.
        reason: String,
    },
}

/// Stream error type
///
/// Represents errors in the lifecycle of a streaming session.
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// A stream is already running on this session
    #[error("A stream is already in progress")]
    AlreadyStreaming,

    /// Streamer configuration rejected by validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// The command source could not be read
    #[error("Failed to read {path}: {reason}")]
    ReadSource {
        /// Path of the command source.
        path: String,
        /// The reason the read failed.
        reason: String,
    },
}

/// Main error type for grblstream
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Stream error
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a stream error
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Error::Stream(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
