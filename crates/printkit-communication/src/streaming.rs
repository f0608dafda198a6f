//! Queued command streaming with line numbers and checksum framing
//!
//! [`CommandStreamer`] owns the pending queue, the append-only history of
//! everything sent, and the line-number cursor. `execute` drains the queue
//! in FIFO order: each command is serialized, framed with a line number and
//! checksum when enabled, and handed to the injected [`LineSink`]. The
//! cursor advances only on framed sends (and on `M110` setters, which carry
//! their own origin).

use crate::communication::LineSink;
use printkit_core::gcode::{ops, tokenizer};
use printkit_core::{Command, Result, LINE_NUMBER_OPCODE};
use serde::{Deserialize, Serialize};

/// Engine-wide streaming configuration, fixed at construction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StreamerConfig {
    /// Frame every eligible command with `N<line>` and `*<checksum>`.
    pub with_checksum: bool,
    /// Strip comments from the emitted text.
    pub without_comments: bool,
}

/// The queued-execution engine for one printer connection.
///
/// Single-threaded and synchronous: every `execute` runs its whole batch to
/// completion (or fails) before returning, and the sink sees lines in strict
/// send order.
pub struct CommandStreamer {
    config: StreamerConfig,
    sink: Box<dyn LineSink>,
    queue: Vec<Command>,
    history: Vec<Command>,
    line_no: Option<u32>,
}

impl CommandStreamer {
    /// Create an empty engine writing through `sink`.
    pub fn new(sink: Box<dyn LineSink>, config: StreamerConfig) -> Self {
        Self {
            config,
            sink,
            queue: Vec::new(),
            history: Vec::new(),
            line_no: None,
        }
    }

    /// Clear the queue and history and reset the line cursor.
    ///
    /// Configuration and sink are kept.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.history.clear();
        self.line_no = None;
    }

    /// Append one command to the pending queue. No sends, no line numbers.
    pub fn queue(&mut self, command: Command) {
        self.queue.push(command);
    }

    /// Append a sequence of commands to the pending queue.
    pub fn queue_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.queue.extend(commands);
    }

    /// Tokenize a raw console line and queue the resulting command.
    ///
    /// A line that fails to parse leaves the queue untouched.
    pub fn queue_raw(&mut self, line: &str) -> Result<()> {
        let command = tokenizer::parse_line(line)?;
        self.queue.push(command);
        Ok(())
    }

    /// The commands waiting to be sent, in send order.
    pub fn pending(&self) -> &[Command] {
        &self.queue
    }

    /// Everything sent so far, in send order, with assigned line numbers
    /// recorded.
    pub fn history(&self) -> &[Command] {
        &self.history
    }

    /// The next line number to assign, or `None` before the first
    /// checksummed send.
    pub fn next_line_no(&self) -> Option<u32> {
        self.line_no
    }

    /// The engine configuration.
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// Send the queued commands in FIFO order.
    ///
    /// The queue is swapped out before sending; an empty queue is a no-op.
    pub fn execute(&mut self) -> Result<()> {
        let batch = std::mem::take(&mut self.queue);
        self.send_batch(batch)
    }

    /// Drain the queue, then the extra commands, as one batch.
    pub fn execute_with(&mut self, extra: impl IntoIterator<Item = Command>) -> Result<()> {
        let mut batch = std::mem::take(&mut self.queue);
        batch.extend(extra);
        self.send_batch(batch)
    }

    /// Send the given commands right away, without consulting the queue.
    pub fn execute_immediate(&mut self, commands: impl IntoIterator<Item = Command>) -> Result<()> {
        self.send_batch(commands.into_iter().collect())
    }

    fn send_batch(&mut self, batch: Vec<Command>) -> Result<()> {
        for command in batch {
            self.send(command)?;
        }
        Ok(())
    }

    fn send(&mut self, command: Command) -> Result<()> {
        // A fresh engine numbers its stream from line 1: the first command
        // that needs framing gets an M110 setter injected ahead of it.
        if self.line_no.is_none()
            && self.config.with_checksum
            && command.checksummable()
            && command.opcode() != LINE_NUMBER_OPCODE
        {
            tracing::debug!("injecting line-number reset ahead of {}", command.opcode());
            let setter = ops::set_lineno(1)?;
            self.send(setter)?;
        }

        // A command that pre-assigned its own number (an M110 setter) is
        // framed one past it; everything else takes the cursor.
        let wire_no = match command.line_no() {
            Some(n) => Some(n + 1),
            None => self.line_no,
        };
        let line = command.emit(wire_no, self.config.with_checksum, self.config.without_comments)?;
        self.sink.accept(&line.text)?;

        // History keeps a setter's declared origin; framed commands record
        // the wire number. The cursor advances past whichever was recorded.
        let sent_no = command.line_no().or(line.line_no);
        if let Some(n) = sent_no {
            self.line_no = Some(n + 1);
        }
        self.history.push(match sent_no {
            Some(n) => command.with_line_no(n),
            None => command,
        });
        Ok(())
    }
}
