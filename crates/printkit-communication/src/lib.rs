//! # printkit Communication
//!
//! The streaming engine and transports for printkit.
//! Streams generated commands to a printer over Serial/USB or a remote
//! Griffin shell, assigning protocol line numbers and XOR checksums along
//! the way and keeping an audit history of everything sent.

pub mod communication;
pub mod streaming;

pub use communication::{
    remote::{GriffinParams, GriffinShell},
    serial::SerialConnection,
    ConnectionParams, ConsoleSink, LineSink,
};

pub use streaming::{CommandStreamer, StreamerConfig};
