mod jsonl;

pub use jsonl::JsonlFileSource;

use thiserror::Error;

/// Error annotation attached to a byte by the capture front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameErrorTag {
    /// UART framing error, which on a DMX line marks a break.
    Framing,
    Other(String),
}

impl FrameErrorTag {
    pub fn parse(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("framing") {
            FrameErrorTag::Framing
        } else {
            FrameErrorTag::Other(tag.to_string())
        }
    }
}

/// One decoded UART byte (or short run of bytes) with its timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteEvent {
    /// Capture time of the first bit, in seconds.
    pub start: f64,
    /// Capture time of the last bit, in seconds.
    pub end: f64,
    pub data: Vec<u8>,
    pub error: Option<FrameErrorTag>,
}

impl ByteEvent {
    pub fn new(start: f64, end: f64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            start,
            end,
            data: data.into(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: FrameErrorTag) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_framing_error(&self) -> bool {
        matches!(self.error, Some(FrameErrorTag::Framing))
    }
}

pub trait ByteEventSource {
    fn next_event(&mut self) -> Result<Option<ByteEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: invalid JSON: {message}")]
    Json { line: usize, message: String },
    #[error("line {line}: invalid event: {message}")]
    InvalidEvent { line: usize, message: String },
}

impl From<jsonl::error::JsonlSourceError> for SourceError {
    fn from(value: jsonl::error::JsonlSourceError) -> Self {
        match value {
            jsonl::error::JsonlSourceError::Io(err) => SourceError::Io(err),
            jsonl::error::JsonlSourceError::Json { line, message } => {
                SourceError::Json { line, message }
            }
            jsonl::error::JsonlSourceError::Hex { line, message }
            | jsonl::error::JsonlSourceError::Timestamp { line, message } => {
                SourceError::InvalidEvent { line, message }
            }
        }
    }
}

/// Source over events already held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    events: std::vec::IntoIter<ByteEvent>,
}

impl MemorySource {
    pub fn new(events: Vec<ByteEvent>) -> Self {
        Self {
            events: events.into_iter(),
        }
    }
}

impl ByteEventSource for MemorySource {
    fn next_event(&mut self) -> Result<Option<ByteEvent>, SourceError> {
        Ok(self.events.next())
    }
}
