//! Raw command line tokenizer
//!
//! Turns a line typed at the console into a [`Command`]. The grammar is
//! deliberately small:
//!
//! ```text
//! OPCODE (SPACE KEY VALUE)* (SEMI COMMENT)?
//! ```
//!
//! A trailing `;`-delimited comment is split off first and attached to the
//! command. Each parameter token is one key letter followed by the rest of
//! the token as its value; a bare key is a flag. Values parse as integer,
//! then float, and fall back to free text.

use crate::error::{GcodeError, Result};
use crate::gcode::command::{Command, ParamValue};

/// Tokenize one raw command line.
pub fn parse_line(line: &str) -> Result<Command> {
    let (body, comment) = match line.split_once(';') {
        Some((body, comment)) => (body, Some(comment.trim())),
        None => (line, None),
    };

    let mut tokens = body.split_whitespace();
    let opcode = tokens.next().ok_or_else(|| GcodeError::InvalidSyntax {
        reason: "empty command line".to_string(),
    })?;

    let mut cmd = Command::new(opcode.to_ascii_uppercase());
    for token in tokens {
        let mut chars = token.chars();
        let key = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => c,
            _ => {
                return Err(GcodeError::InvalidSyntax {
                    reason: format!("parameter token '{}' does not start with a letter", token),
                }
                .into())
            }
        };
        cmd = cmd.arg(key, parse_value(chars.as_str()))?;
    }

    if let Some(comment) = comment {
        if !comment.is_empty() {
            cmd = cmd.with_comment(comment);
        }
    }
    Ok(cmd)
}

fn parse_value(text: &str) -> ParamValue {
    if text.is_empty() {
        return ParamValue::Flag;
    }
    if let Ok(v) = text.parse::<i64>() {
        return ParamValue::Int(v);
    }
    if let Ok(v) = text.parse::<f64>() {
        return ParamValue::Float(v);
    }
    ParamValue::Text(text.to_string())
}
