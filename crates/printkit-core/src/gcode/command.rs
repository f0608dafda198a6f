//! Marlin command model
//!
//! A [`Command`] holds one line of the wire protocol: an opcode, its
//! single-letter parameters, an optional human comment, and the bookkeeping
//! needed for checksum framing (whether the command may be framed, and the
//! line number it was framed with).
//!
//! Serialization is pure: [`Command::emit`] produces the wire text and
//! reports the line number it framed with, it never mutates the command.
//! The streaming engine records assigned numbers on the copies it keeps.

use crate::error::{GcodeError, Result};
use std::fmt;

/// Compute the 8-bit XOR checksum of a wire line.
///
/// Marlin's line checksum is the XOR of every byte up to (but excluding) the
/// `*` marker, including the `N<line>` prefix and all separating spaces.
pub fn line_checksum(text: &str) -> u8 {
    text.bytes().fold(0, |cs, b| cs ^ b)
}

/// Scalar value carried by a single command parameter.
///
/// Boolean parameters use a presence convention: "true" is encoded as
/// [`ParamValue::Flag`] so the parameter renders as its bare key, and
/// "false" is encoded by omitting the parameter entirely.
///
/// Equality between `Int` and `Float` is by numeric value, so a command
/// re-tokenized from its own wire text compares equal to the original even
/// when an integral float rendered without its fraction.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// Integer value, rendered in decimal.
    Int(i64),
    /// Floating point value, rendered in its shortest decimal form.
    Float(f64),
    /// Free-text value (e.g. the `<`/`>` detail markers of `M114`).
    Text(String),
    /// Present-but-valueless marker; renders as the bare key.
    Flag,
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
            (ParamValue::Float(a), ParamValue::Float(b)) => a == b,
            (ParamValue::Int(a), ParamValue::Float(b))
            | (ParamValue::Float(b), ParamValue::Int(a)) => *b == *a as f64,
            (ParamValue::Text(a), ParamValue::Text(b)) => a == b,
            (ParamValue::Flag, ParamValue::Flag) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
            ParamValue::Flag => Ok(()),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// The result of serializing a command to wire text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedLine {
    /// The full line, ready for the transport.
    pub text: String,
    /// The line number the line was framed with; `None` when the line was
    /// not checksum-framed.
    pub line_no: Option<u32>,
}

/// One G/M-code command.
///
/// Two commands compare equal when their opcode and parameter mapping match;
/// comment, checksum eligibility and line number are excluded, so generated
/// commands can be checked against expectations regardless of bookkeeping
/// state.
#[derive(Debug, Clone)]
pub struct Command {
    opcode: String,
    params: Vec<(char, ParamValue)>,
    comment: Option<String>,
    checksummable: bool,
    line_no: Option<u32>,
}

impl Command {
    /// Create a command with no parameters.
    pub fn new(opcode: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
            params: Vec::new(),
            comment: None,
            checksummable: true,
            line_no: None,
        }
    }

    /// Add or replace a parameter.
    ///
    /// The key is normalized to uppercase; anything but an ASCII letter is
    /// [`GcodeError::InvalidParameterKey`].
    pub fn arg(mut self, key: char, value: impl Into<ParamValue>) -> Result<Self> {
        let key = normalize_key_char(key)?;
        self.put(key, value.into());
        Ok(self)
    }

    /// Add a parameter when a value is present; `None` is dropped entirely.
    pub fn arg_opt<V: Into<ParamValue>>(self, key: char, value: Option<V>) -> Result<Self> {
        match value {
            Some(v) => self.arg(key, v),
            None => {
                normalize_key_char(key)?;
                Ok(self)
            }
        }
    }

    /// Add a bare-key flag parameter when `present` is true.
    ///
    /// A flag built with `false` and a flag never added serialize
    /// identically.
    pub fn flag(self, key: char, present: bool) -> Result<Self> {
        if present {
            self.arg(key, ParamValue::Flag)
        } else {
            normalize_key_char(key)?;
            Ok(self)
        }
    }

    /// Attach a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Exempt this command from checksum framing.
    ///
    /// An exempt command is never prefixed with a line number or suffixed
    /// with a checksum, even when the engine has checksums enabled.
    pub fn without_checksum(mut self) -> Self {
        self.checksummable = false;
        self
    }

    /// Record a line number on the command.
    pub fn with_line_no(mut self, line_no: u32) -> Self {
        self.line_no = Some(line_no);
        self
    }

    /// Set or replace one parameter by name, for dynamic callers that hold
    /// the key as a string.
    ///
    /// Fails with [`GcodeError::InvalidParameterKey`] unless the name
    /// reduces to exactly one letter A-Z. Returns `self` for chaining.
    pub fn set_arg(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<&mut Self> {
        let key = normalize_key_str(name)?;
        self.put(key, value.into());
        Ok(self)
    }

    /// The opcode token.
    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    /// The parameters in insertion order.
    pub fn params(&self) -> impl Iterator<Item = (char, &ParamValue)> {
        self.params.iter().map(|(k, v)| (*k, v))
    }

    /// Look up one parameter by key.
    pub fn param(&self, key: char) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// The attached comment, if any.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Whether this command participates in checksum framing.
    pub fn checksummable(&self) -> bool {
        self.checksummable
    }

    /// The recorded line number, if one was ever assigned.
    pub fn line_no(&self) -> Option<u32> {
        self.line_no
    }

    /// Serialize to wire text.
    ///
    /// When `checksum` is requested and the command is not exempt, the line
    /// is prefixed with `N<line_no>` and suffixed with `*<checksum>`; a
    /// missing `line_no` is [`GcodeError::MissingLineNumber`]. The comment
    /// is appended last, after the checksum, and is never covered by it.
    pub fn emit(
        &self,
        line_no: Option<u32>,
        checksum: bool,
        without_comments: bool,
    ) -> Result<EmittedLine> {
        let framed = checksum && self.checksummable;

        let mut atoms: Vec<String> = Vec::with_capacity(self.params.len() + 2);
        if framed {
            let n = line_no.ok_or(GcodeError::MissingLineNumber)?;
            atoms.push(format!("N{}", n));
        }
        atoms.push(self.opcode.clone());
        atoms.extend(self.params.iter().map(|(k, v)| format!("{}{}", k, v)));

        let mut text = atoms.join(" ");
        let mut assigned = None;
        if framed {
            let cs = line_checksum(&text);
            text.push('*');
            text.push_str(&cs.to_string());
            assigned = line_no;
        }

        if !without_comments {
            if let Some(comment) = self.comment.as_deref() {
                if !comment.is_empty() {
                    text.push_str(" ;");
                    text.push_str(comment);
                }
            }
        }

        Ok(EmittedLine {
            text,
            line_no: assigned,
        })
    }

    fn put(&mut self, key: char, value: ParamValue) {
        if let Some(slot) = self.params.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.params.push((key, value));
        }
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.opcode == other.opcode
            && self.params.len() == other.params.len()
            && self.params.iter().all(|(k, v)| other.param(*k) == Some(v))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Unframed emit cannot fail.
        match self.emit(None, false, false) {
            Ok(line) => f.write_str(&line.text),
            Err(_) => Err(fmt::Error),
        }
    }
}

fn normalize_key_char(key: char) -> Result<char> {
    if key.is_ascii_alphabetic() {
        Ok(key.to_ascii_uppercase())
    } else {
        Err(GcodeError::InvalidParameterKey {
            key: key.to_string(),
        }
        .into())
    }
}

fn normalize_key_str(name: &str) -> Result<char> {
    let mut chars = name.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_uppercase()),
        _ => Err(GcodeError::InvalidParameterKey {
            key: name.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use proptest::prelude::*;

    #[test]
    fn test_command_defaults() {
        let cmd = Command::new("M1");
        assert_eq!(cmd.opcode(), "M1");
        assert_eq!(cmd.params().count(), 0);
        assert_eq!(cmd.comment(), None);
        assert!(cmd.checksummable());
        assert_eq!(cmd.line_no(), None);
    }

    #[test]
    fn test_command_populous() {
        let cmd = Command::new("M999")
            .arg('S', 1)
            .unwrap()
            .arg('T', 2)
            .unwrap()
            .arg('U', 111)
            .unwrap()
            .with_comment("Test code")
            .without_checksum()
            .with_line_no(3);
        assert_eq!(cmd.opcode(), "M999");
        assert_eq!(cmd.comment(), Some("Test code"));
        assert_eq!(cmd.param('S'), Some(&ParamValue::Int(1)));
        assert_eq!(cmd.param('T'), Some(&ParamValue::Int(2)));
        assert_eq!(cmd.param('U'), Some(&ParamValue::Int(111)));
        assert!(!cmd.checksummable());
        assert_eq!(cmd.line_no(), Some(3));
    }

    #[test]
    fn test_keys_normalize_to_uppercase() {
        let cmd = Command::new("G1").arg('x', 10).unwrap();
        assert_eq!(cmd.param('X'), Some(&ParamValue::Int(10)));
    }

    #[test]
    fn test_equality_ignores_bookkeeping() {
        let plain = Command::new("M189").arg('A', 1).unwrap();
        let decorated = Command::new("M189")
            .arg('A', 1)
            .unwrap()
            .with_comment("ignored")
            .without_checksum()
            .with_line_no(192);
        assert_eq!(plain, decorated);

        assert_ne!(
            Command::new("M189").arg('A', 1).unwrap(),
            Command::new("M189").arg('A', 2).unwrap()
        );
        assert_ne!(
            Command::new("M189").arg('A', 1).unwrap(),
            Command::new("M189")
        );
        assert_ne!(Command::new("M189"), Command::new("G189"));
        // An absent-valued parameter never makes it into the mapping.
        assert_eq!(
            Command::new("M189"),
            Command::new("M189").arg_opt::<i64>('S', None).unwrap()
        );
    }

    #[test]
    fn test_equality_is_order_insensitive() {
        let ab = Command::new("G1")
            .arg('A', 1)
            .unwrap()
            .arg('B', 2)
            .unwrap();
        let ba = Command::new("G1")
            .arg('B', 2)
            .unwrap()
            .arg('A', 1)
            .unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_set_arg_overrides() {
        let mut cmd = Command::new("A123").arg('T', 1).unwrap();
        cmd.set_arg("T", 2).unwrap();
        assert_eq!(cmd.param('T'), Some(&ParamValue::Int(2)));
        assert_eq!(cmd.params().count(), 1);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let mut cmd = Command::new("G1");
        for bad in ["XY", "1", "", "*", " "] {
            let err = cmd.set_arg(bad, 1).unwrap_err();
            assert!(matches!(
                err,
                Error::Gcode(GcodeError::InvalidParameterKey { .. })
            ));
        }
        assert!(Command::new("G1").arg('1', 1).is_err());
        assert!(Command::new("G1").flag('*', true).is_err());
    }

    #[test]
    fn test_emit_plain() {
        let line = Command::new("A101").emit(None, false, false).unwrap();
        assert_eq!(line.text, "A101");
        assert_eq!(line.line_no, None);
    }

    #[test]
    fn test_emit_never_prefixes_without_checksum() {
        let cmd = Command::new("G28").flag('X', true).unwrap();
        let line = cmd.emit(None, false, false).unwrap();
        assert!(!line.text.starts_with('N'));
        let line = cmd.emit(Some(55), false, false).unwrap();
        assert!(!line.text.starts_with('N'));
        assert_eq!(line.line_no, None);
    }

    #[test]
    fn test_emit_comment() {
        let cmd = Command::new("A101").with_comment("cmt");
        assert_eq!(cmd.emit(None, false, false).unwrap().text, "A101 ;cmt");
        assert_eq!(cmd.emit(None, false, true).unwrap().text, "A101");
    }

    #[test]
    fn test_empty_comment_never_renders() {
        let cmd = Command::new("A101").with_comment("");
        assert_eq!(cmd.emit(None, false, false).unwrap().text, "A101");
    }

    #[test]
    fn test_emit_checksummed() {
        let cmd = Command::new("A123")
            .arg('F', 9)
            .unwrap()
            .flag('T', true)
            .unwrap()
            .arg_opt::<i64>('S', None)
            .unwrap()
            .with_comment("cmt");
        let line = cmd.emit(Some(7), true, true).unwrap();
        assert_eq!(line.text, "N7 A123 F9 T*3");
        assert_eq!(line.line_no, Some(7));
    }

    #[test]
    fn test_comment_follows_checksum() {
        let cmd = Command::new("M105").with_comment("report temps");
        let line = cmd.emit(Some(2), true, false).unwrap();
        let (framed, comment) = line.text.split_once(" ;").unwrap();
        assert_eq!(comment, "report temps");
        let (base, cs) = framed.split_once('*').unwrap();
        assert_eq!(cs.parse::<u8>().unwrap(), line_checksum(base));
    }

    #[test]
    fn test_checksum_exempt_command() {
        let cmd = Command::new("A1").without_checksum();
        let line = cmd.emit(Some(7), true, false).unwrap();
        assert_eq!(line.text, "A1");
        assert_eq!(line.line_no, None);
    }

    #[test]
    fn test_missing_line_number() {
        let err = Command::new("G28").emit(None, true, false).unwrap_err();
        assert!(matches!(err, Error::Gcode(GcodeError::MissingLineNumber)));
    }

    #[test]
    fn test_flag_false_is_omitted() {
        let with_false = Command::new("G28").flag('X', false).unwrap();
        let without = Command::new("G28");
        assert_eq!(with_false, without);
        assert_eq!(
            with_false.emit(None, false, false).unwrap(),
            without.emit(None, false, false).unwrap()
        );
    }

    #[test]
    fn test_value_rendering() {
        let cmd = Command::new("G1")
            .arg('X', 10.5)
            .unwrap()
            .arg('Y', 3_i64)
            .unwrap()
            .arg('D', "<")
            .unwrap();
        assert_eq!(cmd.emit(None, false, false).unwrap().text, "G1 X10.5 Y3 D<");
    }

    #[test]
    fn test_line_checksum_reference() {
        // XOR of the bytes of "N7 A123 F9 T".
        assert_eq!(line_checksum("N7 A123 F9 T"), 3);
        assert_eq!(line_checksum(""), 0);
    }

    fn param_value_strategy() -> impl Strategy<Value = ParamValue> {
        prop_oneof![
            (-10_000_i64..10_000).prop_map(ParamValue::Int),
            (-1000.0..1000.0_f64).prop_map(ParamValue::Float),
            Just(ParamValue::Flag),
        ]
    }

    proptest! {
        #[test]
        fn prop_checksum_emit_is_reproducible(
            opcode in "[GMT][0-9]{1,3}",
            keys in proptest::sample::subsequence(
                ('A'..='Z').collect::<Vec<_>>(), 0..6),
            values in proptest::collection::vec(param_value_strategy(), 26),
            line_no in 0u32..100_000,
        ) {
            let mut cmd = Command::new(opcode);
            for (key, value) in keys.iter().zip(values) {
                cmd = cmd.arg(*key, value).unwrap();
            }
            let first = cmd.emit(Some(line_no), true, true).unwrap();
            let second = cmd.emit(Some(line_no), true, true).unwrap();
            prop_assert_eq!(&first, &second);

            let (base, cs) = first.text.rsplit_once('*').unwrap();
            prop_assert_eq!(cs.parse::<u8>().unwrap(), line_checksum(base));
            prop_assert!(
                first.text.starts_with(&format!("N{} ", line_no)),
                "line does not start with expected line number prefix"
            );
        }
    }
}
