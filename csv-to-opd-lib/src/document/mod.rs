//! OPD document template.
//!
//! OPD is the XML import format of the OpenProdoc document management
//! system. Every document has the same fixed wrapper and one `Attr` element
//! per column.

use quick_xml::escape::escape;
use std::io::{self, Write};

use crate::reader::NAME_FIELD;

pub const OUTPUT_EXTENSION: &str = "opd";

pub const DOCUMENT_OPEN: &str = "<OPDObject type=\"PD_DOCS\">\n<ListAttr>\n";
pub const DOCUMENT_CLOSE: &str = "</ListAttr></OPDObject>\n";

/// Streams one document into `W`, remembering the `Name` value on the way.
pub struct OpdWriter<W: Write> {
    inner: W,
    name: Option<String>,
    attributes: usize,
}

impl<W: Write> OpdWriter<W> {
    pub fn begin(mut inner: W) -> io::Result<Self> {
        inner.write_all(DOCUMENT_OPEN.as_bytes())?;
        Ok(Self {
            inner,
            name: None,
            attributes: 0,
        })
    }

    pub fn push(&mut self, name: &str, value: &str) -> io::Result<()> {
        writeln!(
            self.inner,
            "<Attr Name=\"{}\">{}</Attr>",
            escape(name),
            escape(value)
        )?;
        if name == NAME_FIELD {
            self.name = Some(value.to_string());
        }
        self.attributes += 1;
        Ok(())
    }

    /// Base name for the output file: the raw, unescaped `Name` value.
    pub fn pending_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.inner.write_all(DOCUMENT_CLOSE.as_bytes())?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Render a whole document in memory.
pub fn render<'a, I>(attributes: I) -> io::Result<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut writer = OpdWriter::begin(Vec::new())?;
    for (name, value) in attributes {
        writer.push(name, value)?;
    }
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
