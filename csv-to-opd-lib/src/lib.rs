//! CSV to OPD Converter Library
//!
//! This library turns each data row of a delimited text file into its own
//! OPD document (the XML import format of OpenProdoc), named after the row's
//! `Name` column.

mod converter;
mod delimiter;
mod document;
mod emitter;
mod error;
mod job;
mod reader;
mod types;

pub use converter::{convert, Converter};
pub use delimiter::{confirm, resolve, sniff};
pub use document::{render, OpdWriter, DOCUMENT_CLOSE, DOCUMENT_OPEN, OUTPUT_EXTENSION};
pub use emitter::{DocumentEmitter, RowErrorHandler, RowPolicy};
pub use error::{ConverterError, RowErrorKind, RowStructureError};
pub use job::{ConversionJob, OnRowError, JOB_TEMPLATE};
pub use reader::{Header, Record, RecordReader, Records, NAME_FIELD, RESERVED_TYPE_FIELD};
pub use types::{ConversionResult, Delimiter, RowDecision};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;
    use tracing::info;

    static INIT: Once = Once::new();

    /// Initialize logging exactly once for all tests
    fn init_logging() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::DEBUG)
                .init();
        });
    }

    #[test]
    fn test_pipeline_over_in_memory_source() {
        init_logging();

        info!("Testing reader and emitter without a source file");
        let source = "OPDObject type|Name|Title\nPD_DOCS|doc-1|First\nPD_DOCS|doc-2|Second\n";
        let delimiter = confirm(source.lines().next().unwrap(), Delimiter::Pipe).unwrap();
        let (header, records) = RecordReader::from_reader(source.as_bytes(), delimiter).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let result = DocumentEmitter::new(dir.path())
            .emit(&header, records, &mut RowPolicy::Abort)
            .unwrap();
        info!("Result: {:?}", result);

        assert_eq!(result.documents_written, 2);
        let content = std::fs::read_to_string(dir.path().join("doc-2.opd")).unwrap();
        assert_eq!(
            content,
            render([("Name", "doc-2"), ("Title", "Second")]).unwrap()
        );
    }
}
