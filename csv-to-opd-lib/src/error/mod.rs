use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::Delimiter;

#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("Source file is empty: no header line found")]
    EmptySource,
    #[error("Separator \"{expected}\" expected, got \"{got}\"")]
    DelimiterMismatch { expected: Delimiter, got: Delimiter },
    #[error("Failed to read source file {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write to output directory {}: {source}", path.display())]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Header has no 'Name' column; output files cannot be named")]
    MissingNameColumn,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(String),
    #[error("Invalid job: {0}")]
    InvalidJob(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowErrorKind {
    /// The row ended before the header did.
    MissingFields { expected: usize, found: usize },
    /// The `Name` value cannot be used as a file name inside the output directory.
    InvalidName { value: String },
}

/// A data row that could not be turned into a document. Recoverable: the
/// caller decides whether the run goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowStructureError {
    /// 1-based data row index; the header is row 0.
    pub row: usize,
    pub kind: RowErrorKind,
}

impl RowStructureError {
    pub fn missing_fields(row: usize, expected: usize, found: usize) -> Self {
        Self {
            row,
            kind: RowErrorKind::MissingFields { expected, found },
        }
    }

    pub fn invalid_name(row: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            kind: RowErrorKind::InvalidName {
                value: value.into(),
            },
        }
    }
}

impl fmt::Display for RowStructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RowErrorKind::MissingFields { expected, found } => write!(
                f,
                "row {} has {} field(s), header has {}",
                self.row, found, expected
            ),
            RowErrorKind::InvalidName { value } => {
                write!(f, "row {} has an unusable Name value: {:?}", self.row, value)
            }
        }
    }
}

impl std::error::Error for RowStructureError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_names_both_delimiters() {
        let err = ConverterError::DelimiterMismatch {
            expected: Delimiter::Semicolon,
            got: Delimiter::Comma,
        };
        assert_eq!(err.to_string(), "Separator \";\" expected, got \",\"");
    }

    #[test]
    fn test_row_error_display() {
        let err = RowStructureError::missing_fields(2, 5, 3);
        assert_eq!(err.to_string(), "row 2 has 3 field(s), header has 5");
    }
}
