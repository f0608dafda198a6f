//! # printkit Core
//!
//! Command model and error types for printkit.
//! Provides the G/M-code command representation, the human-friendly command
//! builders, and the raw-line tokenizer. Nothing in this crate performs I/O;
//! delivering commands to a printer is the communication crate's job.

pub mod error;
pub mod gcode;

pub use error::{ConnectionError, Error, GcodeError, Result};

pub use gcode::{
    line_checksum, parse_line, Command, EmittedLine, ExtrusionMode, ParamValue, Positioning,
    Travel, Units, LINE_NUMBER_OPCODE,
};
