use std::fs;
use std::path::{Path, PathBuf};

use crate::delimiter;
use crate::emitter::{DocumentEmitter, RowErrorHandler};
use crate::error::ConverterError;
use crate::reader::RecordReader;
use crate::types::{ConversionResult, Delimiter};

/// One source file, one output directory, one run.
pub struct Converter {
    source: PathBuf,
    output_dir: PathBuf,
    delimiter: Delimiter,
}

impl Converter {
    pub fn new<S: Into<PathBuf>, O: Into<PathBuf>>(
        source: S,
        output_dir: O,
        delimiter: Delimiter,
    ) -> Self {
        let source = source.into();
        let output_dir = output_dir.into();
        tracing::info!(
            "Creating converter for {} -> {}",
            source.display(),
            output_dir.display()
        );
        Self {
            source,
            output_dir,
            delimiter,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn convert<H>(&self, handler: &mut H) -> Result<ConversionResult, ConverterError>
    where
        H: RowErrorHandler + ?Sized,
    {
        tracing::info!("Resolving delimiter of {}", self.source.display());
        let delimiter = delimiter::resolve(&self.source, self.delimiter)?;

        let (header, records) = RecordReader::open(&self.source, delimiter)?;
        DocumentEmitter::check_header(&header)?;

        self.prepare_output_dir()?;

        tracing::info!("Converting rows into {}", self.output_dir.display());
        let emitter = DocumentEmitter::new(&self.output_dir);
        let result = emitter.emit(&header, records, handler)?;

        tracing::info!("Conversion finished: {:?}", result);
        Ok(result)
    }

    fn prepare_output_dir(&self) -> Result<(), ConverterError> {
        let unwritable = |source: std::io::Error| ConverterError::DestinationUnwritable {
            path: self.output_dir.clone(),
            source,
        };

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(unwritable(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "output path exists and is not a directory",
            )));
        }
        fs::create_dir_all(&self.output_dir).map_err(unwritable)?;
        Ok(())
    }
}

/// Convert every data row of `source` into an OPD document in `output_dir`.
pub fn convert<S, O, H>(
    source: S,
    output_dir: O,
    requested: Delimiter,
    handler: &mut H,
) -> Result<ConversionResult, ConverterError>
where
    S: Into<PathBuf>,
    O: Into<PathBuf>,
    H: RowErrorHandler + ?Sized,
{
    Converter::new(source, output_dir, requested).convert(handler)
}
