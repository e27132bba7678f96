//! JSON-lines byte-event source.
//!
//! Each non-blank line holds one event exported from a UART analyzer:
//! `{"start": 1.25, "end": 1.25004, "data": "cc", "error": "framing"}`.
//! `data` is a hex string (optional `0x` prefix, may be empty) and `error`
//! is optional. File access lives in `parser`; field conventions in `reader`.

pub mod error;
pub mod parser;
pub mod reader;

pub use parser::JsonlFileSource;
