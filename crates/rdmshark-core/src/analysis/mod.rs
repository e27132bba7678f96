use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::config::DecoderConfig;
use crate::protocols::rdm::{AssemblerEvent, PacketAssembler};
use crate::source::{ByteEvent, ByteEventSource, JsonlFileSource, SourceError};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, InputInfo, Report, make_stub_report};

mod summary;

use summary::DecodeStats;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

pub fn analyze_jsonl_file(path: &Path, config: DecoderConfig) -> Result<Report, AnalysisError> {
    let source = JsonlFileSource::open(path)?;
    let input = InputInfo {
        path: path.display().to_string(),
        bytes: path.metadata()?.len(),
    };
    analyze_source(input, source, config)
}

/// Run every event of `source` through a fresh assembler.
pub fn analyze_source<S: ByteEventSource>(
    input: InputInfo,
    mut source: S,
    config: DecoderConfig,
) -> Result<Report, AnalysisError> {
    let mut assembler = PacketAssembler::new(config);
    let mut capture = CaptureStats::default();
    let mut stats = DecodeStats::default();
    let mut report = make_stub_report(&input.path, input.bytes);
    report.config = config;

    while let Some(event) = source.next_event()? {
        capture.add_event(&event);
        for emitted in assembler.on_byte_event(&event) {
            match emitted {
                AssemblerEvent::Packet(record) => {
                    stats.add_packet(&record);
                    report.packets.push(record);
                }
                AssemblerEvent::Discarded(discarded) => {
                    stats.add_discarded();
                    report.discarded.push(discarded);
                }
            }
        }
    }
    if let Some(discarded) = assembler.finish(capture.last_ts.unwrap_or_default()) {
        stats.add_discarded();
        report.discarded.push(discarded);
    }

    report.capture_summary = Some(CaptureSummary {
        events_total: capture.events,
        bytes_total: capture.bytes,
        framing_errors: capture.framing_errors,
        time_start: ts_to_rfc3339(capture.first_ts),
        time_end: ts_to_rfc3339(capture.last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.decode_summary = stats.build();
    Ok(report)
}

#[derive(Debug, Default)]
struct CaptureStats {
    events: u64,
    bytes: u64,
    framing_errors: u64,
    first_ts: Option<f64>,
    last_ts: Option<f64>,
}

impl CaptureStats {
    fn add_event(&mut self, event: &ByteEvent) {
        self.events += 1;
        self.bytes += event.data.len() as u64;
        if event.is_framing_error() {
            self.framing_errors += 1;
        }
        update_ts_bounds(&mut self.first_ts, &mut self.last_ts, event.start);
        update_ts_bounds(&mut self.first_ts, &mut self.last_ts, event.end);
    }
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: f64) {
    match first {
        Some(existing) if *existing <= ts => {}
        _ => *first = Some(ts),
    }
    match last {
        Some(existing) if *existing >= ts => {}
        _ => *last = Some(ts),
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

#[cfg(test)]
mod tests {
    use super::{analyze_source, ts_to_rfc3339, update_ts_bounds};
    use crate::config::{DecoderConfig, Verbosity};
    use crate::protocols::rdm::DiscardReason;
    use crate::protocols::rdm::decoder::tests::packet_bytes;
    use crate::source::{ByteEvent, FrameErrorTag, MemorySource};
    use crate::{InputInfo, PacketKind};

    fn input() -> InputInfo {
        InputInfo {
            path: "memory".to_string(),
            bytes: 0,
        }
    }

    fn packet_events(t0: f64, cc: u8, pid: u16, pd: &[u8]) -> Vec<ByteEvent> {
        let mut bytes = vec![0xCC];
        bytes.extend(packet_bytes(cc, pid, pd));
        bytes
            .into_iter()
            .enumerate()
            .map(|(i, b)| {
                let start = t0 + i as f64 * 0.000_044;
                ByteEvent::new(start, start + 0.000_044, [b])
            })
            .collect()
    }

    #[test]
    fn analyze_source_builds_report() {
        let mut events = vec![ByteEvent::new(1.0, 1.000_176, [0x00]).with_error(FrameErrorTag::Framing)];
        events.extend(packet_events(1.0002, 0x20, 0x0082, &[]));
        events.push(ByteEvent::new(1.01, 1.010_176, [0x00]).with_error(FrameErrorTag::Framing));
        events.extend(packet_events(1.0102, 0x21, 0x0082, b"Stage left"));
        events.push(ByteEvent::new(1.02, 1.020_176, [0x00]).with_error(FrameErrorTag::Framing));
        events.extend(packet_events(1.0202, 0x20, 0x0060, &[0x01; 4]).into_iter().take(10));

        let report = analyze_source(
            input(),
            MemorySource::new(events),
            DecoderConfig::with_verbosity(Verbosity::On),
        )
        .unwrap();

        assert_eq!(report.config.verbosity, Verbosity::On);
        let capture = report.capture_summary.as_ref().unwrap();
        assert_eq!(capture.framing_errors, 3);
        assert_eq!(capture.events_total, 3 + 26 + 36 + 10);
        assert_eq!(capture.bytes_total, capture.events_total);
        assert_eq!(capture.time_start.as_deref(), Some("1970-01-01T00:00:01Z"));
        assert_eq!(report.generated_at, capture.time_end.clone().unwrap());

        assert_eq!(report.packets.len(), 2);
        assert_eq!(report.packets[0].kind, PacketKind::Command);
        assert_eq!(report.packets[1].fields.get("pd"), Some("Stage left"));

        assert_eq!(report.discarded.len(), 1);
        assert_eq!(report.discarded[0].reason, DiscardReason::EndOfStream);

        let summary = &report.decode_summary;
        assert_eq!(summary.packets_total, 2);
        assert_eq!(summary.commands, 1);
        assert_eq!(summary.responses, 1);
        assert_eq!(summary.discarded, 1);
        assert_eq!(summary.parameters.len(), 1);
        assert_eq!(summary.parameters[0].count, 2);
    }

    #[test]
    fn empty_source_has_no_timestamps() {
        let report =
            analyze_source(input(), MemorySource::default(), DecoderConfig::default()).unwrap();
        let capture = report.capture_summary.unwrap();
        assert_eq!(capture.events_total, 0);
        assert!(capture.time_start.is_none());
        assert_eq!(report.generated_at, crate::DEFAULT_GENERATED_AT);
        assert!(report.packets.is_empty());
    }

    #[test]
    fn ts_bounds_track_min_and_max() {
        let mut first = None;
        let mut last = None;
        update_ts_bounds(&mut first, &mut last, 2.0);
        update_ts_bounds(&mut first, &mut last, 1.0);
        update_ts_bounds(&mut first, &mut last, 3.0);
        assert_eq!(first, Some(1.0));
        assert_eq!(last, Some(3.0));
        assert_eq!(ts_to_rfc3339(Some(0.0)).as_deref(), Some("1970-01-01T00:00:00Z"));
        assert_eq!(ts_to_rfc3339(None), None);
    }
}
