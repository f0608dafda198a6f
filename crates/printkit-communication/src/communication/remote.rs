//! Remote Griffin shell transport
//!
//! Drives the maintenance shell of an Ultimaker-style printer over an SSH
//! child process. The shell prompts with `(Cmd)` when it is ready for the
//! next command; each emitted line is wrapped in the shell's `sendgcode`
//! form and the sink blocks until the prompt returns.

use crate::communication::LineSink;
use printkit_core::{ConnectionError, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// The Griffin shell ready prompt.
const PROMPT: &str = "(Cmd)";

/// Connection parameters for a Griffin shell session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GriffinParams {
    /// Network name or address of the printer.
    pub host: String,
    /// Login user on the printer.
    pub user: String,
    /// Identity file handed to ssh, if any.
    pub identity: Option<String>,
    /// The ssh command to run.
    pub ssh_cmd: String,
    /// How long to wait for the first prompt.
    pub connect_timeout_ms: u64,
    /// How long to wait for the prompt after each line.
    pub prompt_timeout_ms: u64,
}

impl GriffinParams {
    /// Parameters for the given printer with the stock Ultimaker login.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }
}

impl Default for GriffinParams {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: "ultimaker".to_string(),
            identity: None,
            ssh_cmd: "ssh".to_string(),
            connect_timeout_ms: 20_000,
            prompt_timeout_ms: 300_000,
        }
    }
}

/// An open Griffin shell session.
pub struct GriffinShell {
    child: Child,
    stdin: ChildStdin,
    responses: Receiver<String>,
    prompt_timeout: Duration,
}

impl GriffinShell {
    /// Open the connection to the printer and wait for the initial prompt.
    pub fn connect(params: &GriffinParams) -> Result<Self> {
        let mut command = std::process::Command::new(&params.ssh_cmd);
        command.arg(format!("{}@{}", params.user, params.host));
        if let Some(identity) = &params.identity {
            command.arg("-i").arg(identity);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = command.spawn().map_err(|e| ConnectionError::RemoteError {
            reason: format!("failed to spawn {}: {}", params.ssh_cmd, e),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| ConnectionError::RemoteError {
            reason: "child has no stdout".to_string(),
        })?;
        let stdin = child.stdin.take().ok_or_else(|| ConnectionError::RemoteError {
            reason: "child has no stdin".to_string(),
        })?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_output(stdout, tx));

        let mut shell = Self {
            child,
            stdin,
            responses: rx,
            prompt_timeout: Duration::from_millis(params.prompt_timeout_ms),
        };
        if let Err(e) = shell.await_prompt(Duration::from_millis(params.connect_timeout_ms)) {
            let _ = shell.child.kill();
            return Err(e);
        }
        tracing::info!("Connected to {}@{}", params.user, params.host);
        Ok(shell)
    }

    /// Wait for the shell prompt, logging whatever the printer says in the
    /// meantime.
    fn await_prompt(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ConnectionError::PromptTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                }
                .into());
            }
            match self.responses.recv_timeout(remaining) {
                Ok(line) if line.starts_with(PROMPT) => return Ok(()),
                Ok(line) => {
                    if !line.is_empty() {
                        tracing::info!("<< {}", line);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(ConnectionError::PromptTimeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }
                    .into())
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ConnectionError::ConnectionLost {
                        reason: "shell output closed".to_string(),
                    }
                    .into())
                }
            }
        }
    }

    /// Shut the session down.
    pub fn close(mut self) {
        let _ = self.child.kill();
    }
}

impl Drop for GriffinShell {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

impl LineSink for GriffinShell {
    fn accept(&mut self, line: &str) -> Result<()> {
        let wrapped = format!("sendgcode {}", line);
        tracing::debug!(">> {}", wrapped);
        self.stdin.write_all(wrapped.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;
        self.await_prompt(self.prompt_timeout)
    }
}

/// Forward child output to the channel, splitting on newlines. The prompt
/// arrives without a trailing newline, so a pending fragment that starts
/// with it is forwarded as a line of its own.
fn forward_output(mut stdout: ChildStdout, tx: Sender<String>) {
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 512];
    loop {
        match stdout.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    let text = String::from_utf8_lossy(&line).trim_end().to_string();
                    if tx.send(text).is_err() {
                        return;
                    }
                }
                if pending.starts_with(PROMPT.as_bytes()) {
                    let text = String::from_utf8_lossy(&pending).trim_end().to_string();
                    pending.clear();
                    if tx.send(text).is_err() {
                        return;
                    }
                }
            }
            Err(_) => return,
        }
    }
}
