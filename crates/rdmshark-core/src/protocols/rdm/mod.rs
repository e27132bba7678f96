//! RDM (ANSI E1.20) packet decoding from a UART byte stream.
//!
//! - `layout`: field schema and wire constants (source of truth)
//! - `tables`: command-class and parameter-ID display names
//! - `decoder`: incremental field state machine for one packet
//! - `format`: rendering of decoded fields into display strings
//! - `assembler`: start-code detection, break timing, record emission
//!
//! Decoding never fails: malformed traffic shows up as `unknown` packets,
//! empty fields, or discarded partial packets. Checksums are reported but
//! not verified.

pub mod assembler;
pub mod decoder;
pub mod format;
pub mod layout;
pub mod tables;

pub use assembler::{
    AssemblerEvent, DiscardReason, DiscardedPacket, PacketAssembler, PacketKind, PacketRecord,
};
pub use decoder::{DecodedPacket, PacketDecoder, Progress};
pub use format::{FieldMap, format_named};
