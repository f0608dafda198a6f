//! Error handling for printkit
//!
//! Provides error types for the two layers of the toolkit:
//! - G-Code errors (command construction, serialization, raw-line parsing)
//! - Connection errors (transports that carry the emitted lines)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Represents errors raised while building a command, serializing it to wire
/// text, or tokenizing a raw console line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcodeError {
    /// Parameter key is not a single ASCII letter A-Z
    #[error("Invalid parameter key '{key}': must be a single letter A-Z")]
    InvalidParameterKey {
        /// The offending key as given by the caller.
        key: String,
    },

    /// Checksum framing was requested without a line number to frame with
    #[error("Cannot checksum a line without a line number")]
    MissingLineNumber,

    /// Raw command line does not match `OPCODE (KEY VALUE)*`
    #[error("Invalid command syntax: {reason}")]
    InvalidSyntax {
        /// Why the line failed to tokenize.
        reason: String,
    },

    /// Line numbers start at 1
    #[error("Cannot set line number below 1 (got {number})")]
    LineNumberOutOfRange {
        /// The rejected line number.
        number: u32,
    },

    /// A move was requested with no axis, feed rate or filament argument
    #[error("Move requires at least one argument")]
    EmptyMove,
}

/// Connection error type
///
/// Represents errors from the transports that deliver emitted lines to a
/// printer: serial ports and remote shell sessions.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Connection lost
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// Remote shell prompt did not appear in time
    #[error("Timed out after {timeout_ms}ms waiting for the shell prompt")]
    PromptTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Serial port error
    #[error("Serial port error: {reason}")]
    SerialError {
        /// The reason for the serial port error.
        reason: String,
    },

    /// Remote process error
    #[error("Remote shell error: {reason}")]
    RemoteError {
        /// The reason for the remote shell error.
        reason: String,
    },

    /// Generic connection error
    #[error("Connection error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Main error type for printkit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

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

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Io(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
