//! Parsed form of a protocol line.
//!
//! # Wire Format
//!
//! ```text
//! [<code> ]<payload>\n
//! ```
//!
//! The code is a run of ASCII digits followed by exactly one space. A line
//! without that prefix is a bare payload (chat lines are usually bare).

use std::fmt;

/// One protocol line with its optional status code split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub code: Option<u32>,
    pub payload: String,
}

impl Frame {
    pub fn coded(code: u32, payload: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            payload: payload.into(),
        }
    }

    pub fn bare(payload: impl Into<String>) -> Self {
        Self {
            code: None,
            payload: payload.into(),
        }
    }

    /// Split a line (already stripped of its terminator) into code and payload.
    ///
    /// Digits that do not fit in a `u32`, or that are not followed by a space,
    /// are treated as part of a bare payload.
    pub fn parse(line: &str) -> Self {
        let digits = line.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && line.as_bytes().get(digits) == Some(&b' ') {
            if let Ok(code) = line[..digits].parse::<u32>() {
                return Self::coded(code, &line[digits + 1..]);
            }
        }
        Self::bare(line)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} {}", code, self.payload),
            None => f.write_str(&self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_coded_line() {
        assert_eq!(Frame::parse("220 ready"), Frame::coded(220, "ready"));
    }

    #[test]
    fn test_parse_bare_chat_line() {
        assert_eq!(Frame::parse("(PM) hi"), Frame::bare("(PM) hi"));
    }

    #[test]
    fn test_parse_keeps_extra_spaces_in_payload() {
        assert_eq!(Frame::parse("250  two  spaces"), Frame::coded(250, " two  spaces"));
    }

    #[test]
    fn test_parse_code_with_empty_payload() {
        assert_eq!(Frame::parse("421 "), Frame::coded(421, ""));
    }

    #[test]
    fn test_parse_digits_without_space_are_payload() {
        assert_eq!(Frame::parse("2024"), Frame::bare("2024"));
        assert_eq!(Frame::parse("42nd street"), Frame::bare("42nd street"));
    }

    #[test]
    fn test_parse_overflowing_code_is_payload() {
        assert_eq!(
            Frame::parse("99999999999 huge"),
            Frame::bare("99999999999 huge")
        );
    }

    #[test]
    fn test_display_matches_wire_form() {
        assert_eq!(Frame::coded(220, "ready").to_string(), "220 ready");
        assert_eq!(Frame::bare("(PM) hi").to_string(), "(PM) hi");
    }
}
