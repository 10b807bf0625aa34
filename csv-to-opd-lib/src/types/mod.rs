use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConverterError;

/// Field delimiters a source file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Delimiter {
    Tab,
    Comma,
    Semicolon,
    Colon,
    Space,
    Pipe,
}

impl Delimiter {
    pub const ALL: [Delimiter; 6] = [
        Delimiter::Tab,
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Colon,
        Delimiter::Space,
        Delimiter::Pipe,
    ];

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Colon => ':',
            Delimiter::Space => ' ',
            Delimiter::Pipe => '|',
        }
    }

    pub fn as_byte(self) -> u8 {
        self.as_char() as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Tab => "tab",
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Colon => "colon",
            Delimiter::Space => "space",
            Delimiter::Pipe => "pipe",
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_char() == c)
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => f.write_str("\\t"),
            other => write!(f, "{}", other.as_char()),
        }
    }
}

impl FromStr for Delimiter {
    type Err = ConverterError;

    /// Accepts either the delimiter's name (`semicolon`) or the literal
    /// character (`;`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(delimiter) = Self::from_char(c) {
                return Ok(delimiter);
            }
        }
        if s == "\\t" {
            return Ok(Delimiter::Tab);
        }
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ConverterError::InvalidDelimiter(format!(
                    "'{}' [Expected: tab, comma, semicolon, colon, space, pipe]",
                    s
                ))
            })
    }
}

impl TryFrom<String> for Delimiter {
    type Error = ConverterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Delimiter> for String {
    fn from(delimiter: Delimiter) -> Self {
        delimiter.name().to_string()
    }
}

/// What the emitter should do after a row failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowDecision {
    Continue,
    Abort,
}

/// Aggregate outcome of a single conversion run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Data rows attempted, including the row that triggered an abort.
    pub rows_processed: usize,
    pub documents_written: usize,
    pub rows_failed: usize,
    pub aborted_at_row: Option<usize>,
    /// Successful rows that replaced a document written earlier in the same run.
    pub documents_overwritten: usize,
}

impl ConversionResult {
    pub fn is_aborted(&self) -> bool {
        self.aborted_at_row.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter_names_and_chars() {
        assert_eq!("semicolon".parse::<Delimiter>().unwrap(), Delimiter::Semicolon);
        assert_eq!("Pipe".parse::<Delimiter>().unwrap(), Delimiter::Pipe);
        assert_eq!(";".parse::<Delimiter>().unwrap(), Delimiter::Semicolon);
        assert_eq!("\t".parse::<Delimiter>().unwrap(), Delimiter::Tab);
        assert_eq!("\\t".parse::<Delimiter>().unwrap(), Delimiter::Tab);
        assert_eq!(" ".parse::<Delimiter>().unwrap(), Delimiter::Space);
        assert!("#".parse::<Delimiter>().is_err());
        assert!("dash".parse::<Delimiter>().is_err());
    }

    #[test]
    fn test_delimiter_serde_uses_names() {
        let json = serde_json::to_string(&Delimiter::Colon).unwrap();
        assert_eq!(json, "\"colon\"");
        let parsed: Delimiter = serde_json::from_str("\"tab\"").unwrap();
        assert_eq!(parsed, Delimiter::Tab);
        let parsed: Delimiter = serde_json::from_str("\";\"").unwrap();
        assert_eq!(parsed, Delimiter::Semicolon);
        assert!(serde_json::from_str::<Delimiter>("\"dash\"").is_err());
    }

    #[test]
    fn test_display_escapes_tab() {
        assert_eq!(Delimiter::Tab.to_string(), "\\t");
        assert_eq!(Delimiter::Comma.to_string(), ",");
    }
}
