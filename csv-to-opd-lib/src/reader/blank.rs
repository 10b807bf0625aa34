use std::collections::VecDeque;
use std::io::{self, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartRecord,
    AfterCr,
    StartField,
    InField,
    InQuoted,
    QuoteInQuoted,
}

/// Passes bytes through unchanged while noting where blank lines sit.
///
/// The csv parser drops empty lines silently. This follows the same record
/// grammar (double quotes, CR, LF and CRLF terminators) so that each blank
/// line can later be handed out as an empty row in its original position.
pub(crate) struct BlankLineTracker<R> {
    inner: R,
    delimiter: u8,
    state: State,
    records: usize,
    blanks: VecDeque<usize>,
}

impl<R> BlankLineTracker<R> {
    pub(crate) fn new(inner: R, delimiter: u8) -> Self {
        Self {
            inner,
            delimiter,
            state: State::StartRecord,
            records: 0,
            blanks: VecDeque::new(),
        }
    }

    /// Consume one blank line seen before the record at `ordinal`
    /// (0-based, counting only non-blank records).
    pub(crate) fn take_blank_before(&mut self, ordinal: usize) -> bool {
        match self.blanks.front() {
            Some(&before) if before <= ordinal => {
                self.blanks.pop_front();
                true
            }
            _ => false,
        }
    }

    fn end_record(&mut self, byte: u8) {
        self.records += 1;
        self.state = if byte == b'\r' {
            State::AfterCr
        } else {
            State::StartRecord
        };
    }

    fn scan(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.step(byte);
        }
    }

    fn step(&mut self, byte: u8) {
        let is_terminator = byte == b'\r' || byte == b'\n';
        match self.state {
            State::AfterCr if byte == b'\n' => self.state = State::StartRecord,
            State::StartRecord | State::AfterCr if is_terminator => {
                self.blanks.push_back(self.records);
                self.state = if byte == b'\r' {
                    State::AfterCr
                } else {
                    State::StartRecord
                };
            }
            State::StartRecord | State::AfterCr | State::StartField => {
                if byte == b'"' {
                    self.state = State::InQuoted;
                } else {
                    self.field_byte(byte);
                }
            }
            State::InQuoted => {
                if byte == b'"' {
                    self.state = State::QuoteInQuoted;
                }
            }
            State::QuoteInQuoted => {
                if byte == b'"' {
                    self.state = State::InQuoted;
                } else {
                    self.field_byte(byte);
                }
            }
            State::InField => self.field_byte(byte),
        }
    }

    fn field_byte(&mut self, byte: u8) {
        if byte == self.delimiter {
            self.state = State::StartField;
        } else if byte == b'\r' || byte == b'\n' {
            self.end_record(byte);
        } else {
            self.state = State::InField;
        }
    }
}

impl<R: Read> Read for BlankLineTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.scan(&buf[..read]);
        Ok(read)
    }
}
