use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ConverterError;
use crate::types::Delimiter;

const UTF8_BOM: char = '\u{feff}';

/// Check that `requested` is the delimiter the source actually uses.
///
/// Only the first line is read. This must succeed before any row is parsed.
pub fn resolve(source: &Path, requested: Delimiter) -> Result<Delimiter, ConverterError> {
    let file = File::open(source).map_err(|e| ConverterError::SourceUnreadable {
        path: source.to_path_buf(),
        source: e,
    })?;
    let first_line = read_first_line(BufReader::new(file), source)?;
    confirm(&first_line, requested)
}

/// Same as [`resolve`], over an already loaded header line.
pub fn confirm(first_line: &str, requested: Delimiter) -> Result<Delimiter, ConverterError> {
    let sniffed = match sniff(first_line)? {
        Some(delimiter) => delimiter,
        None => {
            tracing::debug!(
                "No candidate delimiter in header line, accepting requested '{}'",
                requested
            );
            return Ok(requested);
        }
    };

    if sniffed != requested {
        tracing::error!(
            "Delimiter mismatch: source uses '{}', caller requested '{}'",
            sniffed,
            requested
        );
        return Err(ConverterError::DelimiterMismatch {
            expected: sniffed,
            got: requested,
        });
    }

    tracing::debug!("Confirmed delimiter '{}'", sniffed);
    Ok(sniffed)
}

/// Candidates in order of preference. Space comes last and only wins when no
/// other candidate appears in the line, since multi-word column names are
/// common.
const SNIFF_ORDER: [Delimiter; 6] = [
    Delimiter::Comma,
    Delimiter::Tab,
    Delimiter::Semicolon,
    Delimiter::Pipe,
    Delimiter::Colon,
    Delimiter::Space,
];

/// Infer the delimiter of a header line.
///
/// Counts each candidate outside double-quoted sections. The most frequent
/// non-space candidate wins, ties going to the earlier entry of the
/// preference order. Returns `Ok(None)` when the line contains no candidate
/// at all.
pub fn sniff(line: &str) -> Result<Option<Delimiter>, ConverterError> {
    let line = line
        .trim_start_matches(UTF8_BOM)
        .trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(ConverterError::EmptySource);
    }

    let mut counts = [0usize; SNIFF_ORDER.len()];
    let mut in_quotes = false;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(pos) = SNIFF_ORDER.iter().position(|d| d.as_char() == c) {
            counts[pos] += 1;
        }
    }

    let mut best: Option<(Delimiter, usize)> = None;
    for (delimiter, count) in SNIFF_ORDER.into_iter().zip(counts) {
        if count == 0 {
            continue;
        }
        if delimiter == Delimiter::Space && best.is_some() {
            break;
        }
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((delimiter, count)),
        }
    }

    Ok(best.map(|(delimiter, _)| delimiter))
}

pub(crate) fn read_first_line<R: BufRead>(
    mut reader: R,
    source: &Path,
) -> Result<String, ConverterError> {
    let mut line = Vec::new();
    let read = reader
        .read_until(b'\n', &mut line)
        .map_err(|e| ConverterError::SourceUnreadable {
            path: source.to_path_buf(),
            source: e,
        })?;
    if read == 0 {
        return Err(ConverterError::EmptySource);
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}
