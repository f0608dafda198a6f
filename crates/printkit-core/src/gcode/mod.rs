//! G/M-code command model and builders

pub mod command;
pub mod ops;
pub mod tokenizer;

pub use command::{line_checksum, Command, EmittedLine, ParamValue};
pub use ops::{ExtrusionMode, Positioning, Travel, Units, LINE_NUMBER_OPCODE};
pub use tokenizer::parse_line;
