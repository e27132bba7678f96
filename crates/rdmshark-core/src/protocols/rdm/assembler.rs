//! Packet boundary detection.
//!
//! The assembler owns at most one in-flight [`PacketDecoder`]. Idle bytes are
//! scanned for the start code, framing errors mark break starts, and a
//! completed decoder is turned into a [`PacketRecord`].
//!
//! A start code that follows a framing error while a packet is still being
//! filled replaces that packet; the loss is reported as a
//! [`DiscardedPacket`] instead of being dropped silently. Without a preceding
//! break, `0xCC` is ordinary data (it shows up in UIDs and checksums).

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::DecoderConfig;
use crate::source::ByteEvent;

use super::decoder::{DecodedPacket, PacketDecoder};
use super::format::{FieldMap, console_line, render_fields};
use super::layout::START_CODE;
use super::tables::{REQUEST_COMMAND_CLASSES, RESPONSE_COMMAND_CLASSES};

/// Request/response classification derived from the command class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketKind {
    Command,
    Response,
    Unknown,
}

impl PacketKind {
    pub fn from_command_class(cc: Option<u8>) -> Self {
        match cc {
            Some(cc) if REQUEST_COMMAND_CLASSES.contains(&cc) => PacketKind::Command,
            Some(cc) if RESPONSE_COMMAND_CLASSES.contains(&cc) => PacketKind::Response,
            _ => PacketKind::Unknown,
        }
    }

    /// Short tag used in console lines.
    pub fn tag(self) -> &'static str {
        match self {
            PacketKind::Command => "CMD",
            PacketKind::Response => "RSP",
            PacketKind::Unknown => "UNK",
        }
    }
}

/// A completed packet ready for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub kind: PacketKind,
    /// Time of the start code, in seconds.
    pub start: f64,
    /// End of the event that completed the packet, in seconds.
    pub end: f64,
    /// Seconds between the preceding framing error and the start code.
    pub break_duration: f64,
    pub fields: FieldMap,
    #[serde(skip)]
    packet: DecodedPacket,
}

impl PacketRecord {
    pub fn packet(&self) -> &DecodedPacket {
        &self.packet
    }

    pub fn console_line(&self) -> String {
        console_line(self.kind.tag(), &self.packet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// A new start code after a break took over.
    Replaced,
    /// The input ended first.
    EndOfStream,
}

impl DiscardReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscardReason::Replaced => "replaced",
            DiscardReason::EndOfStream => "end_of_stream",
        }
    }
}

/// A partial packet that was abandoned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscardedPacket {
    pub start: f64,
    pub discarded_at: f64,
    /// Schema field that was waiting for bytes.
    pub stalled_field: String,
    pub bytes_buffered: usize,
    pub reason: DiscardReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssemblerEvent {
    Packet(PacketRecord),
    Discarded(DiscardedPacket),
}

#[derive(Debug)]
struct ActivePacket {
    decoder: PacketDecoder,
    start: f64,
    break_duration: f64,
    /// A framing error arrived after this packet's start code.
    break_seen: bool,
}

impl ActivePacket {
    fn discard(self, at: f64, reason: DiscardReason) -> DiscardedPacket {
        let stalled_field = self
            .decoder
            .current_field()
            .map(|field| field.spec().name)
            .unwrap_or_default();
        DiscardedPacket {
            start: self.start,
            discarded_at: at,
            stalled_field: stalled_field.to_string(),
            bytes_buffered: self.decoder.buffered(),
            reason,
        }
    }
}

/// Push-driven RDM packet assembler for one byte stream.
///
/// # Examples
/// ```
/// use rdmshark_core::{AssemblerEvent, ByteEvent, DecoderConfig, PacketAssembler, PacketKind};
///
/// let mut assembler = PacketAssembler::new(DecoderConfig::default());
/// let mut bytes = vec![0xCC, 0x01, 24];
/// bytes.extend_from_slice(&[0u8; 17]);
/// bytes.extend_from_slice(&[0x20, 0x00, 0x60, 0x00, 0x01, 0x2C]);
///
/// let events = assembler.on_byte_event(&ByteEvent::new(0.0, 0.001, bytes));
/// assert_eq!(events.len(), 1);
/// match &events[0] {
///     AssemblerEvent::Packet(record) => assert_eq!(record.kind, PacketKind::Command),
///     other => panic!("unexpected event: {other:?}"),
/// }
/// ```
#[derive(Debug, Default)]
pub struct PacketAssembler {
    config: DecoderConfig,
    active: Option<ActivePacket>,
    break_start: Option<f64>,
}

impl PacketAssembler {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            active: None,
            break_start: None,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Process one byte event and return what it completed or abandoned.
    pub fn on_byte_event(&mut self, event: &ByteEvent) -> Vec<AssemblerEvent> {
        let mut emitted = Vec::new();
        let framing = event.is_framing_error();
        let mut rest = event.data.as_slice();
        if framing {
            self.break_start = Some(event.start);
            if let Some(mut active) = self.active.take() {
                match start_code_after_break(rest) {
                    Some(offset) => {
                        emitted.push(AssemblerEvent::Discarded(Self::replace(active, event.start)));
                        self.begin(event.start);
                        rest = &rest[offset + 1..];
                    }
                    None => {
                        active.break_seen = true;
                        self.active = Some(active);
                    }
                }
            }
        }

        while !rest.is_empty() {
            let Some(mut active) = self.active.take() else {
                match rest.iter().position(|&b| b == START_CODE) {
                    Some(index) => {
                        if index > 0 {
                            trace!(dropped = index, "bytes outside a packet ignored");
                        }
                        self.begin(event.start);
                        rest = &rest[index + 1..];
                    }
                    None => {
                        trace!(dropped = rest.len(), "bytes outside a packet ignored");
                        break;
                    }
                }
                continue;
            };

            if active.break_seen && !framing && rest[0] == START_CODE {
                emitted.push(AssemblerEvent::Discarded(Self::replace(active, event.start)));
                self.begin(event.start);
                rest = &rest[1..];
                continue;
            }

            let progress = active.decoder.consume(rest);
            rest = &rest[progress.consumed..];
            if progress.complete {
                emitted.push(AssemblerEvent::Packet(self.finalize(active, event.end)));
            } else {
                self.active = Some(active);
            }
        }

        emitted
    }

    /// Abandon the in-flight packet at end of input, if any.
    pub fn finish(&mut self, end: f64) -> Option<DiscardedPacket> {
        let active = self.active.take()?;
        let discarded = active.discard(end, DiscardReason::EndOfStream);
        warn!(
            start = discarded.start,
            stalled_field = %discarded.stalled_field,
            "input ended inside an rdm packet"
        );
        Some(discarded)
    }

    fn replace(active: ActivePacket, at: f64) -> DiscardedPacket {
        let discarded = active.discard(at, DiscardReason::Replaced);
        warn!(
            start = discarded.start,
            stalled_field = %discarded.stalled_field,
            bytes_buffered = discarded.bytes_buffered,
            "partial rdm packet replaced by a new start code"
        );
        discarded
    }

    fn begin(&mut self, start: f64) {
        let break_duration = self
            .break_start
            .take()
            .map_or(0.0, |break_start| (start - break_start).max(0.0));
        debug!(start, break_duration, "rdm packet start");
        self.active = Some(ActivePacket {
            decoder: PacketDecoder::new(),
            start,
            break_duration,
            break_seen: false,
        });
    }

    fn finalize(&self, active: ActivePacket, end: f64) -> PacketRecord {
        let ActivePacket {
            decoder,
            start,
            break_duration,
            ..
        } = active;
        let packet = decoder.into_packet().unwrap_or_default();
        let kind = PacketKind::from_command_class(packet.command_class());
        let fields = render_fields(&packet, self.config.verbosity, break_duration);
        debug!(?kind, start, end, "rdm packet complete");
        PacketRecord {
            kind,
            start,
            end,
            break_duration,
            fields,
            packet,
        }
    }
}

/// Offset of a start code that directly follows the break bytes (`0x00`)
/// at the head of a framing-error event.
fn start_code_after_break(data: &[u8]) -> Option<usize> {
    let zeros = data.iter().take_while(|&&b| b == 0x00).count();
    (zeros > 0 && data.get(zeros) == Some(&START_CODE)).then_some(zeros)
}

#[cfg(test)]
mod tests {
    use super::{AssemblerEvent, DiscardReason, PacketAssembler, PacketKind, PacketRecord};
    use crate::config::{DecoderConfig, Verbosity};
    use crate::protocols::rdm::decoder::tests::packet_bytes;
    use crate::source::{ByteEvent, FrameErrorTag};

    const BYTE_TIME: f64 = 0.000_044;

    /// One event per byte starting at `t0`, start code included.
    fn byte_events(t0: f64, bytes: &[u8]) -> Vec<ByteEvent> {
        bytes
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let start = t0 + i as f64 * BYTE_TIME;
                ByteEvent::new(start, start + BYTE_TIME, [*b])
            })
            .collect()
    }

    fn framed(cc: u8, pid: u16, pd: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xCC];
        bytes.extend(packet_bytes(cc, pid, pd));
        bytes
    }

    fn run(assembler: &mut PacketAssembler, events: &[ByteEvent]) -> Vec<AssemblerEvent> {
        events
            .iter()
            .flat_map(|event| assembler.on_byte_event(event))
            .collect()
    }

    fn packets(events: Vec<AssemblerEvent>) -> Vec<PacketRecord> {
        events
            .into_iter()
            .filter_map(|event| match event {
                AssemblerEvent::Packet(record) => Some(record),
                AssemblerEvent::Discarded(_) => None,
            })
            .collect()
    }

    #[test]
    fn classify_command_classes() {
        assert_eq!(PacketKind::from_command_class(Some(0x10)), PacketKind::Command);
        assert_eq!(PacketKind::from_command_class(Some(0x20)), PacketKind::Command);
        assert_eq!(PacketKind::from_command_class(Some(0x30)), PacketKind::Command);
        assert_eq!(PacketKind::from_command_class(Some(0x11)), PacketKind::Response);
        assert_eq!(PacketKind::from_command_class(Some(0x21)), PacketKind::Response);
        assert_eq!(PacketKind::from_command_class(Some(0x31)), PacketKind::Response);
        assert_eq!(PacketKind::from_command_class(Some(0x99)), PacketKind::Unknown);
        assert_eq!(PacketKind::from_command_class(None), PacketKind::Unknown);
    }

    #[test]
    fn end_to_end_zero_length_payload() {
        let mut assembler = PacketAssembler::default();
        let bytes = framed(0x20, 0x0060, &[]);
        assert_eq!(bytes.len(), 1 + 23 + 2);
        let events = byte_events(1.0, &bytes);

        let mut emitted = Vec::new();
        for (i, event) in events.iter().enumerate() {
            let out = assembler.on_byte_event(event);
            if i + 1 < events.len() {
                assert!(out.is_empty(), "record emitted early at byte {i}");
            }
            emitted.extend(out);
        }

        let records = packets(emitted);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.kind, PacketKind::Command);
        assert_eq!(record.fields.get("pd"), Some(""));
        assert_eq!(record.start, events[0].start);
        assert_eq!(record.end, events[events.len() - 1].end);
        assert_eq!(record.break_duration, 0.0);
        assert!(!assembler.is_active());
    }

    #[test]
    fn response_and_unknown_kinds() {
        let mut assembler = PacketAssembler::default();
        let mut events = byte_events(0.0, &framed(0x21, 0x0060, &[0x01, 0x02]));
        events.extend(byte_events(1.0, &framed(0x99, 0x0060, &[])));

        let records = packets(run(&mut assembler, &events));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, PacketKind::Response);
        assert_eq!(records[0].fields.get("pd"), Some("0x0102"));
        assert_eq!(records[1].kind, PacketKind::Unknown);
        assert_eq!(records[1].fields.get("cc"), Some("0x99"));
    }

    #[test]
    fn idle_bytes_are_dropped() {
        let mut assembler = PacketAssembler::default();
        let noise = byte_events(0.0, &[0x00, 0xFF, 0x55]);
        assert!(run(&mut assembler, &noise).is_empty());
        assert!(!assembler.is_active());

        assert!(assembler.on_byte_event(&ByteEvent::new(0.5, 0.5, [0xCC])).is_empty());
        assert!(assembler.is_active());
    }

    #[test]
    fn break_duration_measured_from_framing_error() {
        let mut assembler = PacketAssembler::new(DecoderConfig::with_verbosity(Verbosity::On));
        let mut events = byte_events(0.0, &framed(0x20, 0x0060, &[]));
        events.push(ByteEvent::new(0.25, 0.375, [0x00]).with_error(FrameErrorTag::Framing));
        events.extend(byte_events(0.5, &framed(0x21, 0x0060, &[])));

        let records = packets(run(&mut assembler, &events));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].break_duration, 0.0);
        assert_eq!(records[0].fields.get("breaktime"), Some("0.0 ms"));
        assert_eq!(records[1].break_duration, 0.25);
        assert_eq!(records[1].fields.get("breaktime"), Some("250.0 ms"));
    }

    #[test]
    fn break_is_consumed_by_one_packet() {
        let mut assembler = PacketAssembler::default();
        let mut events = vec![ByteEvent::new(0.0, 0.125, [0x00]).with_error(FrameErrorTag::Framing)];
        events.extend(byte_events(0.25, &framed(0x20, 0x0060, &[])));
        events.extend(byte_events(1.0, &framed(0x21, 0x0060, &[])));

        let records = packets(run(&mut assembler, &events));
        assert_eq!(records[0].break_duration, 0.25);
        assert_eq!(records[1].break_duration, 0.0);
    }

    #[test]
    fn other_error_tags_do_not_mark_breaks() {
        let mut assembler = PacketAssembler::default();
        let mut events =
            vec![ByteEvent::new(0.0, 0.1, [0x00]).with_error(FrameErrorTag::Other("parity".into()))];
        events.extend(byte_events(0.5, &framed(0x20, 0x0060, &[])));

        let records = packets(run(&mut assembler, &events));
        assert_eq!(records[0].break_duration, 0.0);
    }

    #[test]
    fn start_code_inside_packet_is_data() {
        let mut assembler = PacketAssembler::default();
        let events = byte_events(0.0, &framed(0x21, 0x0060, &[0xCC, 0xCC]));

        let records = packets(run(&mut assembler, &events));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.get("pd"), Some("0xcccc"));
    }

    #[test]
    fn stalled_packet_is_reported_when_replaced() {
        let mut assembler = PacketAssembler::default();
        let partial = framed(0x21, 0x0060, &[0x01; 8]);
        let mut events = byte_events(0.0, &partial[..20]);
        events.push(ByteEvent::new(0.5, 0.625, [0x00]).with_error(FrameErrorTag::Framing));
        events.extend(byte_events(0.75, &framed(0x20, 0x0082, &[])));

        let emitted = run(&mut assembler, &events);
        assert_eq!(emitted.len(), 2);
        match &emitted[0] {
            AssemblerEvent::Discarded(discarded) => {
                assert_eq!(discarded.reason, DiscardReason::Replaced);
                assert_eq!(discarded.start, 0.0);
                assert_eq!(discarded.discarded_at, 0.75);
                // 19 header bytes plus the break byte forwarded as data.
                assert_eq!(discarded.bytes_buffered, 20);
                assert_eq!(discarded.stalled_field, "pid");
            }
            other => panic!("expected discard, got {other:?}"),
        }
        match &emitted[1] {
            AssemblerEvent::Packet(record) => {
                assert_eq!(record.kind, PacketKind::Command);
                assert_eq!(record.start, 0.75);
                assert_eq!(record.break_duration, 0.25);
            }
            other => panic!("expected packet, got {other:?}"),
        }
    }

    #[test]
    fn break_and_start_code_in_one_event_replace_stalled_packet() {
        let mut assembler = PacketAssembler::default();
        let stale = framed(0x21, 0x0060, &[]);
        run(&mut assembler, &byte_events(0.0, &stale[..11]));
        assert!(assembler.is_active());

        let mut chunk = vec![0x00, 0xCC];
        chunk.extend(packet_bytes(0x20, 0x0082, &[]));
        let event = ByteEvent::new(1.0, 1.5, chunk).with_error(FrameErrorTag::Framing);
        let emitted = assembler.on_byte_event(&event);

        assert_eq!(emitted.len(), 2);
        match &emitted[0] {
            AssemblerEvent::Discarded(discarded) => {
                assert_eq!(discarded.reason, DiscardReason::Replaced);
                assert_eq!(discarded.bytes_buffered, 10);
                assert_eq!(discarded.stalled_field, "src");
                assert_eq!(discarded.discarded_at, 1.0);
            }
            other => panic!("expected discard, got {other:?}"),
        }
        match &emitted[1] {
            AssemblerEvent::Packet(record) => {
                assert_eq!(record.kind, PacketKind::Command);
                assert_eq!(record.fields.get("pid"), Some("DEV_LABEL"));
                assert_eq!(record.start, 1.0);
                assert_eq!(record.end, 1.5);
            }
            other => panic!("expected packet, got {other:?}"),
        }
        assert!(!assembler.is_active());
    }

    #[test]
    fn break_and_start_code_in_one_event_match_idle_decoding() {
        let mut chunk = vec![0x00, 0xCC];
        chunk.extend(packet_bytes(0x20, 0x0082, &[]));
        let event = ByteEvent::new(1.0, 1.5, chunk).with_error(FrameErrorTag::Framing);

        let mut idle = PacketAssembler::default();
        let from_idle = packets(idle.on_byte_event(&event));

        let mut busy = PacketAssembler::default();
        run(&mut busy, &byte_events(0.0, &framed(0x21, 0x0060, &[])[..11]));
        let from_busy = packets(busy.on_byte_event(&event));

        assert_eq!(from_idle.len(), 1);
        assert_eq!(from_idle, from_busy);
    }

    #[test]
    fn framing_event_without_start_code_feeds_active_packet() {
        let mut assembler = PacketAssembler::default();
        let stale = framed(0x21, 0x0060, &[]);
        run(&mut assembler, &byte_events(0.0, &stale[..11]));

        let event = ByteEvent::new(1.0, 1.1, [0x00, 0x00]).with_error(FrameErrorTag::Framing);
        assert!(assembler.on_byte_event(&event).is_empty());

        let discarded = assembler.finish(2.0).unwrap();
        assert_eq!(discarded.bytes_buffered, 12);
    }

    #[test]
    fn chunked_event_can_emit_several_packets() {
        let mut assembler = PacketAssembler::default();
        let mut chunk = vec![0x00, 0x00];
        chunk.extend(framed(0x20, 0x0060, &[]));
        chunk.push(0xFF);
        chunk.extend(framed(0x21, 0x0060, &[0x05]));
        chunk.extend(&framed(0x30, 0x1000, &[0x01])[..10]);

        let emitted = assembler.on_byte_event(&ByteEvent::new(2.0, 2.5, chunk));
        let records = packets(emitted);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, PacketKind::Command);
        assert_eq!(records[1].kind, PacketKind::Response);
        assert!(records.iter().all(|r| r.start == 2.0 && r.end == 2.5));
        assert!(assembler.is_active());
    }

    #[test]
    fn finish_reports_truncated_packet() {
        let mut assembler = PacketAssembler::default();
        let partial = framed(0x21, 0x0082, b"HELLO");
        run(&mut assembler, &byte_events(0.0, &partial[..26]));

        let discarded = assembler.finish(9.0).unwrap();
        assert_eq!(discarded.reason, DiscardReason::EndOfStream);
        assert_eq!(discarded.stalled_field, "pd");
        assert_eq!(discarded.bytes_buffered, 25);
        assert_eq!(discarded.discarded_at, 9.0);
        assert!(assembler.finish(10.0).is_none());
    }

    #[test]
    fn verbosity_controls_record_fields() {
        let bytes = framed(0x20, 0x0082, &[]);

        let mut quiet = PacketAssembler::default();
        let records = packets(run(&mut quiet, &byte_events(0.0, &bytes)));
        assert_eq!(records[0].fields.get("pid"), Some("DEV_LABEL"));
        assert_eq!(records[0].fields.get("tn"), None);

        let mut verbose = PacketAssembler::new(DecoderConfig::with_verbosity(Verbosity::On));
        let records = packets(run(&mut verbose, &byte_events(0.0, &bytes)));
        assert_eq!(records[0].fields.get("pid"), Some("DEV_LABEL (0x0082)"));
        assert_eq!(records[0].fields.get("tn"), Some("7"));
        assert!(records[0].console_line().starts_with("RDM CMD src=0x4c5500000001"));
    }
}
