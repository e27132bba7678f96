//! RDMShark core library for offline RDM capture decoding.
//!
//! This crate implements the decoding pipeline used by the CLI: byte-event
//! sources feed a packet assembler, which drives the RDM field state machine
//! and renders completed packets into a deterministic report. Decoding is
//! byte-oriented and side-effect free; all I/O is isolated in `source`
//! modules.
//!
//! Invariants:
//! - At most one packet is assembled at a time; records come out in wire order.
//! - Field buffers are filled strictly in schema order, whatever the chunking.
//! - Partial packets are never dropped silently: they are reported as discarded.
//!
//! Version française (résumé):
//! Cette crate décode des trames RDM à partir d'événements d'octets horodatés :
//! sources -> assembleur (détection du start code, durée du break) -> machine
//! à états des champs -> rapport déterministe. Les E/S restent dans `source`.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use rdmshark_core::{DecoderConfig, analyze_jsonl_file};
//!
//! let report = analyze_jsonl_file(Path::new("capture.jsonl"), DecoderConfig::default())?;
//! println!("packets: {}", report.decode_summary.packets_total);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
mod config;
pub mod protocols;
mod source;

pub use analysis::{AnalysisError, analyze_jsonl_file, analyze_source};
pub use config::{ConfigError, DecoderConfig, Verbosity};
pub use protocols::rdm::{
    AssemblerEvent, DecodedPacket, DiscardReason, DiscardedPacket, FieldMap, PacketAssembler,
    PacketDecoder, PacketKind, PacketRecord,
};
pub use source::{
    ByteEvent, ByteEventSource, FrameErrorTag, JsonlFileSource, MemorySource, SourceError,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Decoding report with packets in wire order.
///
/// # Examples
/// ```
/// use rdmshark_core::make_stub_report;
///
/// let report = make_stub_report("capture.jsonl", 123);
/// assert_eq!(report.report_version, rdmshark_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,

    /// Input capture metadata.
    pub input: InputInfo,
    /// Decoder settings used to render packet fields.
    pub config: DecoderConfig,

    /// Optional capture summary (may be empty when unavailable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Packet counts by classification and parameter.
    pub decode_summary: DecodeSummary,
    /// Completed packets in wire order.
    pub packets: Vec<PacketRecord>,
    /// Partial packets that were abandoned, in wire order.
    pub discarded: Vec<DiscardedPacket>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "rdmshark").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
///
/// # Examples
/// ```
/// use rdmshark_core::InputInfo;
///
/// let input = InputInfo {
///     path: "capture.jsonl".to_string(),
///     bytes: 1024,
/// };
/// assert_eq!(input.bytes, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Basic capture summary (timestamps may be absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Byte events read from the input.
    pub events_total: u64,
    /// Payload bytes across all events.
    pub bytes_total: u64,
    /// Events flagged with a framing error (breaks).
    pub framing_errors: u64,
    /// RFC3339 timestamp of the first event (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last event (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Packet counts for a decoding run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodeSummary {
    pub packets_total: u64,
    pub commands: u64,
    pub responses: u64,
    pub unknown: u64,
    /// Partial packets replaced by a new start code or cut by end of input.
    pub discarded: u64,
    /// Completed packets per parameter ID, sorted by PID.
    pub parameters: Vec<ParameterCount>,
}

/// Number of completed packets addressing one parameter ID.
///
/// # Examples
/// ```
/// use rdmshark_core::ParameterCount;
///
/// let count = ParameterCount {
///     pid: "0x0082".to_string(),
///     name: Some("DEV_LABEL".to_string()),
///     count: 2,
/// };
/// assert_eq!(count.count, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterCount {
    /// Parameter ID as `0x` followed by four hex digits.
    pub pid: String,
    /// Registry mnemonic, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub count: u64,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use rdmshark_core::make_stub_report;
///
/// let report = make_stub_report("capture.jsonl", 123);
/// assert_eq!(report.report_version, rdmshark_core::REPORT_VERSION);
/// assert!(report.packets.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "rdmshark".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        config: DecoderConfig::default(),
        capture_summary: None,
        decode_summary: DecodeSummary::default(),
        packets: vec![],
        discarded: vec![],
    }
}
