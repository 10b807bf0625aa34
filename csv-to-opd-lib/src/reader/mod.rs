use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ConverterError;
use crate::types::Delimiter;

mod blank;

use blank::BlankLineTracker;

/// Column whose value names the output document.
pub const NAME_FIELD: &str = "Name";
/// Optional column that lets the source double as an OPD typed import file.
/// Never emitted as an attribute.
pub const RESERVED_TYPE_FIELD: &str = "OPDObject type";

/// Field names from the first row of the source, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    fields: Vec<String>,
}

impl Header {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    fn from_record(record: &StringRecord) -> Self {
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        if let Some(first) = fields.first_mut() {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    pub fn has_name_field(&self) -> bool {
        self.position(NAME_FIELD).is_some()
    }
}

/// One data row, positionally aligned with the [`Header`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    index: usize,
    fields: StringRecord,
}

impl Record {
    pub fn new<I, S>(index: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            index,
            fields: fields.into_iter().collect(),
        }
    }

    /// A blank source line. It has no fields at all.
    pub fn blank(index: usize) -> Self {
        Self {
            index,
            fields: StringRecord::new(),
        }
    }

    /// Field bytes that are not valid UTF-8 are replaced with U+FFFD.
    fn from_bytes(index: usize, record: ByteRecord) -> Self {
        Self {
            index,
            fields: StringRecord::from_byte_record_lossy(record),
        }
    }

    /// 1-based data row index; the header is row 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.fields.get(position)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Single-pass sequence of data rows in file order.
///
/// A blank line in the middle of the source comes out as a [`Record`] with
/// no fields, so row numbers follow the source lines. Blank lines after the
/// last row are dropped.
pub struct Records<R: Read> {
    inner: ByteRecordsIntoIter<BlankLineTracker<R>>,
    pending: Option<ByteRecord>,
    ordinal: usize,
    next_index: usize,
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<Record, ConverterError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.pending.take() {
            Some(record) => record,
            None => match self.inner.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            },
        };

        let index = self.next_index;
        self.next_index += 1;

        // Blank lines ahead of this record were seen while its bytes were read.
        let tracker = self.inner.reader_mut().get_mut();
        if tracker.take_blank_before(self.ordinal) {
            self.pending = Some(record);
            return Some(Ok(Record::blank(index)));
        }

        self.ordinal += 1;
        Some(Ok(Record::from_bytes(index, record)))
    }
}

pub struct RecordReader;

impl RecordReader {
    /// Open `path` and split off its header. The returned records are lazy;
    /// nothing past the header has been read yet.
    pub fn open(
        path: &Path,
        delimiter: Delimiter,
    ) -> Result<(Header, Records<File>), ConverterError> {
        tracing::debug!("Opening source {}", path.display());
        let file = File::open(path).map_err(|e| ConverterError::SourceUnreadable {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_reader(file, delimiter)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        delimiter: Delimiter,
    ) -> Result<(Header, Records<R>), ConverterError> {
        let mut inner = ReaderBuilder::new()
            .delimiter(delimiter.as_byte())
            .has_headers(false)
            .flexible(true)
            .from_reader(BlankLineTracker::new(reader, delimiter.as_byte()))
            .into_byte_records();

        let header = match inner.next() {
            Some(record) => Header::from_record(&StringRecord::from_byte_record_lossy(record?)),
            None => return Err(ConverterError::EmptySource),
        };
        tracing::debug!("Header fields: {:?}", header.fields());

        Ok((
            header,
            Records {
                inner,
                pending: None,
                ordinal: 1,
                next_index: 1,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(content: &str, delimiter: Delimiter) -> (Header, Vec<Record>) {
        let (header, records) = RecordReader::from_reader(content.as_bytes(), delimiter).unwrap();
        let records = records.collect::<Result<Vec<_>, _>>().unwrap();
        (header, records)
    }

    #[test]
    fn test_header_is_first_row() {
        let (header, records) =
            read_all("Name;City\nAlice;Paris\nBob;Rome\n", Delimiter::Semicolon);
        assert_eq!(header.fields(), ["Name", "City"]);
        assert!(header.has_name_field());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index(), 1);
        assert_eq!(records[0].get(0), Some("Alice"));
        assert_eq!(records[1].index(), 2);
        assert_eq!(records[1].get(1), Some("Rome"));
    }

    #[test]
    fn test_short_and_long_rows_are_passed_through() {
        let (header, records) = read_all("A,B,C\n1,2\n1,2,3,4\n", Delimiter::Comma);
        assert_eq!(header.len(), 3);
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[1].len(), 4);
    }

    #[test]
    fn test_quoted_fields_keep_embedded_delimiters() {
        let (_, records) = read_all("Name,Note\n\"Smith, J\",\"a,b\"\n", Delimiter::Comma);
        assert_eq!(records[0].get(0), Some("Smith, J"));
        assert_eq!(records[0].get(1), Some("a,b"));
    }

    #[test]
    fn test_bom_removed_from_first_header_field() {
        let (header, _) = read_all("\u{feff}Name;City\nA;B\n", Delimiter::Semicolon);
        assert_eq!(header.fields()[0], "Name");
    }

    #[test]
    fn test_empty_input_has_no_header() {
        let result = RecordReader::from_reader("".as_bytes(), Delimiter::Comma);
        assert!(matches!(result, Err(ConverterError::EmptySource)));
    }

    #[test]
    fn test_blank_line_keeps_its_row_number() {
        let (_, records) = read_all(
            "Name;City\nAlice;Paris\n\nBob;Rome\nshort\n",
            Delimiter::Semicolon,
        );
        let indices: Vec<usize> = records.iter().map(Record::index).collect();
        assert_eq!(indices, [1, 2, 3, 4]);
        assert!(records[1].is_empty());
        assert_eq!(records[2].get(0), Some("Bob"));
        assert_eq!(records[3].get(0), Some("short"));
    }

    #[test]
    fn test_consecutive_and_trailing_blank_lines() {
        let (_, records) = read_all("Name\r\nA\r\n\r\n\r\nB\r\n\r\n\n", Delimiter::Comma);
        let lens: Vec<usize> = records.iter().map(Record::len).collect();
        assert_eq!(lens, [1, 0, 0, 1]);
        assert_eq!(records[3].index(), 4);
    }

    #[test]
    fn test_invalid_utf8_field_is_decoded_lossily() {
        let content: &[u8] = b"Name;City\nBob;M\xfcnchen\n";
        let (_, records) = RecordReader::from_reader(content, Delimiter::Semicolon).unwrap();
        let records = records.collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(records[0].get(0), Some("Bob"));
        assert_eq!(records[0].get(1), Some("M\u{fffd}nchen"));
    }

    #[test]
    fn test_header_only_yields_no_records() {
        let (header, records) = read_all("Name,City\n", Delimiter::Comma);
        assert_eq!(header.len(), 2);
        assert!(records.is_empty());
    }
}
