//! Serial port transport
//!
//! Writes emitted lines to a USB/RS-232 serial port and, once listening,
//! runs a read-side thread that logs firmware responses. The reader shares
//! nothing with the streaming engine: responses are observed, not consumed.

use crate::communication::{ConnectionParams, LineSink};
use parking_lot::Mutex;
use printkit_core::{ConnectionError, Result};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Trait for serial port I/O operations
pub trait ReadWrite: std::io::Read + std::io::Write + Send {}
impl<T: std::io::Read + std::io::Write + Send> ReadWrite for T {}

/// A serial port connection that can carry a command stream.
pub struct SerialConnection {
    params: ConnectionParams,
    port: Arc<Mutex<Box<dyn ReadWrite>>>,
    listening: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl SerialConnection {
    /// Open a serial port with the given parameters.
    pub fn open(params: ConnectionParams) -> Result<Self> {
        let builder = serialport::new(&params.port, params.baud_rate)
            // Short timeout so the reader thread never holds the port long
            .timeout(Duration::from_millis(100))
            .data_bits(match params.data_bits {
                5 => serialport::DataBits::Five,
                6 => serialport::DataBits::Six,
                7 => serialport::DataBits::Seven,
                8 => serialport::DataBits::Eight,
                other => {
                    return Err(ConnectionError::FailedToOpen {
                        port: params.port.clone(),
                        reason: format!("invalid data bits: {}", other),
                    }
                    .into())
                }
            })
            .stop_bits(match params.stop_bits {
                1 => serialport::StopBits::One,
                2 => serialport::StopBits::Two,
                other => {
                    return Err(ConnectionError::FailedToOpen {
                        port: params.port.clone(),
                        reason: format!("invalid stop bits: {}", other),
                    }
                    .into())
                }
            });

        match builder.open_native() {
            Ok(port) => Ok(Self {
                params,
                port: Arc::new(Mutex::new(Box::new(port))),
                listening: Arc::new(AtomicBool::new(false)),
                reader: None,
            }),
            Err(e) => {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                Err(ConnectionError::FailedToOpen {
                    port: params.port.clone(),
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }

    /// The parameters the port was opened with.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Start the read-side listener thread.
    ///
    /// Firmware responses are logged line by line at info level. Calling
    /// this twice is a no-op.
    pub fn listen(&mut self) {
        if self.reader.is_some() {
            return;
        }
        self.listening.store(true, Ordering::SeqCst);
        let port = Arc::clone(&self.port);
        let listening = Arc::clone(&self.listening);
        self.reader = Some(std::thread::spawn(move || read_loop(port, listening)));
    }

    /// Stop the listener and release the port.
    pub fn close(&mut self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SerialConnection {
    fn drop(&mut self) {
        self.close();
    }
}

impl LineSink for SerialConnection {
    fn accept(&mut self, line: &str) -> Result<()> {
        tracing::debug!(">> {}", line);
        let mut port = self.port.lock();
        port.write_all(line.as_bytes())?;
        port.write_all(b"\n")?;
        port.flush()?;
        Ok(())
    }
}

fn read_loop(port: Arc<Mutex<Box<dyn ReadWrite>>>, listening: Arc<AtomicBool>) {
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 256];
    while listening.load(Ordering::SeqCst) {
        let read = {
            let mut port = port.lock();
            port.read(&mut buf)
        };
        match read {
            Ok(0) => std::thread::sleep(Duration::from_millis(10)),
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    let text = String::from_utf8_lossy(&line);
                    let text = text.trim_end();
                    if !text.is_empty() {
                        tracing::info!("<< {}", text);
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                tracing::warn!("Serial read failed: {}", e);
                return;
            }
        }
    }
}
