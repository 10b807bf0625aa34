use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::document::{OpdWriter, OUTPUT_EXTENSION};
use crate::error::{ConverterError, RowStructureError};
use crate::reader::{Header, Record, RESERVED_TYPE_FIELD};
use crate::types::{ConversionResult, RowDecision};

/// Decides whether a run goes on after a bad row. Called synchronously, so
/// an interactive implementation may block while it asks.
pub trait RowErrorHandler {
    fn on_row_error(&mut self, error: &RowStructureError) -> RowDecision;
}

impl<F> RowErrorHandler for F
where
    F: FnMut(&RowStructureError) -> RowDecision,
{
    fn on_row_error(&mut self, error: &RowStructureError) -> RowDecision {
        self(error)
    }
}

/// Fixed answer for non-interactive runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    Continue,
    Abort,
}

impl RowErrorHandler for RowPolicy {
    fn on_row_error(&mut self, _error: &RowStructureError) -> RowDecision {
        match self {
            RowPolicy::Continue => RowDecision::Continue,
            RowPolicy::Abort => RowDecision::Abort,
        }
    }
}

/// Writes one OPD document per data row into `output_dir`.
pub struct DocumentEmitter {
    output_dir: PathBuf,
}

impl DocumentEmitter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Final location of the document named `name`.
    pub fn target_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", name, OUTPUT_EXTENSION))
    }

    pub(crate) fn check_header(header: &Header) -> Result<(), ConverterError> {
        if !header.has_name_field() {
            tracing::error!("Header has no Name column: {:?}", header.fields());
            return Err(ConverterError::MissingNameColumn);
        }
        Ok(())
    }

    pub fn emit<I, H>(
        &self,
        header: &Header,
        records: I,
        handler: &mut H,
    ) -> Result<ConversionResult, ConverterError>
    where
        I: IntoIterator<Item = Result<Record, ConverterError>>,
        H: RowErrorHandler + ?Sized,
    {
        Self::check_header(header)?;

        let mut result = ConversionResult::default();
        let mut written_names: HashSet<String> = HashSet::new();

        for record in records {
            let record = record?;
            result.rows_processed += 1;

            match self.emit_row(header, &record)? {
                Ok(name) => {
                    result.documents_written += 1;
                    if !written_names.insert(name.clone()) {
                        result.documents_overwritten += 1;
                        tracing::warn!(
                            "Row {} replaced {} written earlier in this run",
                            record.index(),
                            self.target_path(&name).display()
                        );
                    }
                }
                Err(row_error) => {
                    result.rows_failed += 1;
                    tracing::warn!("Skipping row: {}", row_error);
                    if handler.on_row_error(&row_error) == RowDecision::Abort {
                        tracing::info!("Conversion aborted at row {}", row_error.row);
                        result.aborted_at_row = Some(row_error.row);
                        return Ok(result);
                    }
                }
            }
        }

        tracing::info!(
            "Wrote {} document(s) from {} row(s), {} failed",
            result.documents_written,
            result.rows_processed,
            result.rows_failed
        );
        Ok(result)
    }

    /// The outer `Result` is a fatal I/O failure; the inner one is a row the
    /// caller may skip. A failed row's temp file is dropped, which deletes it.
    fn emit_row(
        &self,
        header: &Header,
        record: &Record,
    ) -> Result<Result<String, RowStructureError>, ConverterError> {
        let mut temp = tempfile::Builder::new()
            .prefix(".csv-to-opd-")
            .suffix(".tmp")
            .tempfile_in(&self.output_dir)
            .map_err(|e| self.unwritable(e))?;

        let name = match Self::write_document(header, record, temp.as_file_mut())
            .map_err(|e| self.unwritable(e))?
        {
            Ok(name) => name,
            Err(row_error) => return Ok(Err(row_error)),
        };

        if !is_usable_name(&name) {
            return Ok(Err(RowStructureError::invalid_name(record.index(), name)));
        }

        let target = self.target_path(&name);
        self.persist(temp, &target)?;
        tracing::debug!("Row {} -> {}", record.index(), target.display());
        Ok(Ok(name))
    }

    fn write_document(
        header: &Header,
        record: &Record,
        file: &mut File,
    ) -> io::Result<Result<String, RowStructureError>> {
        let mut document = OpdWriter::begin(BufWriter::new(file))?;

        // Driven by the header: fields past its width are never looked at.
        for (position, field) in header.fields().iter().enumerate() {
            if field == RESERVED_TYPE_FIELD {
                continue;
            }
            match record.get(position) {
                Some(value) => document.push(field, value)?,
                None => {
                    return Ok(Err(RowStructureError::missing_fields(
                        record.index(),
                        header.len(),
                        record.len(),
                    )))
                }
            }
        }

        let name = document.pending_name().unwrap_or_default().to_string();
        document.finish()?;
        Ok(Ok(name))
    }

    fn persist(&self, temp: NamedTempFile, target: &Path) -> Result<(), ConverterError> {
        temp.persist(target).map_err(|e| self.unwritable(e.error))?;
        Ok(())
    }

    fn unwritable(&self, source: io::Error) -> ConverterError {
        ConverterError::DestinationUnwritable {
            path: self.output_dir.clone(),
            source,
        }
    }
}

/// A `Name` value must resolve to a plain file directly inside the output
/// directory.
fn is_usable_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
