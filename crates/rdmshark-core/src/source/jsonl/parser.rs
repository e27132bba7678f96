use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::source::{ByteEvent, ByteEventSource, SourceError};

use super::error::JsonlSourceError;
use super::reader::parse_event_line;

pub struct JsonlFileSource {
    reader: BufReader<File>,
    line: usize,
    buf: String,
}

impl JsonlFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            line: 0,
            buf: String::new(),
        })
    }

    fn next_line_event(&mut self) -> Result<Option<ByteEvent>, JsonlSourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return parse_event_line(text, self.line).map(Some);
        }
    }
}

impl ByteEventSource for JsonlFileSource {
    fn next_event(&mut self) -> Result<Option<ByteEvent>, SourceError> {
        self.next_line_event().map_err(SourceError::from)
    }
}
