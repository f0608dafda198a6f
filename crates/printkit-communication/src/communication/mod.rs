//! Transports for emitted command lines
//!
//! The streaming engine writes through the [`LineSink`] capability: one
//! `accept` call per serialized line, in send order. Sinks own their
//! channel; the engine never opens or closes them, and sink errors
//! propagate to the caller of `execute` unchanged.

pub mod remote;
pub mod serial;

use printkit_core::Result;
use serde::{Deserialize, Serialize};

/// The capability that physically delivers one serialized line.
pub trait LineSink: Send {
    /// Deliver one line to the device.
    fn accept(&mut self, line: &str) -> Result<()>;
}

/// Any sendable closure over a line is a sink.
impl<F> LineSink for F
where
    F: FnMut(&str) -> Result<()> + Send,
{
    fn accept(&mut self, line: &str) -> Result<()> {
        self(line)
    }
}

/// Connection parameters for the serial transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g. "/dev/ttyUSB0", "COM3").
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Data bits (5-8).
    pub data_bits: u8,
    /// Stop bits (1 or 2).
    pub stop_bits: u8,
}

impl ConnectionParams {
    /// Parameters for a port at the given baud rate, 8N1.
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Default::default()
        }
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115_200,
            data_bits: 8,
            stop_bits: 1,
        }
    }
}

/// Sink that echoes every line to stdout; the dry-run transport.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LineSink for ConsoleSink {
    fn accept(&mut self, line: &str) -> Result<()> {
        println!(">> {}", line);
        Ok(())
    }
}
