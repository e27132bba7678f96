use serde::Deserialize;

use crate::source::{ByteEvent, FrameErrorTag};

use super::error::JsonlSourceError;

/// Raw line shape before validation.
#[derive(Debug, Deserialize)]
pub struct EventLine {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parse and validate one JSON line.
///
/// # Errors
/// Returns `JsonlSourceError` for malformed JSON, bad hex, or timestamps that
/// are not finite or run backwards.
pub fn parse_event_line(text: &str, line: usize) -> Result<ByteEvent, JsonlSourceError> {
    let raw: EventLine = serde_json::from_str(text).map_err(|e| JsonlSourceError::Json {
        line,
        message: e.to_string(),
    })?;

    if !raw.start.is_finite() || !raw.end.is_finite() {
        return Err(JsonlSourceError::Timestamp {
            line,
            message: "timestamps must be finite".to_string(),
        });
    }
    if raw.end < raw.start {
        return Err(JsonlSourceError::Timestamp {
            line,
            message: format!("end {} precedes start {}", raw.end, raw.start),
        });
    }

    let data = decode_hex(&raw.data).map_err(|message| JsonlSourceError::Hex { line, message })?;
    Ok(ByteEvent {
        start: raw.start,
        end: raw.end,
        data,
        error: raw.error.as_deref().map(FrameErrorTag::parse),
    })
}

/// Decode a hex string, accepting an optional `0x` prefix.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in '{text}'"));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("bad hex digits in '{text}'"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{decode_hex, parse_event_line};
    use crate::source::FrameErrorTag;
    use crate::source::jsonl::error::JsonlSourceError;

    #[test]
    fn decode_hex_variants() {
        assert_eq!(decode_hex("cc").unwrap(), vec![0xCC]);
        assert_eq!(decode_hex("0xCC01").unwrap(), vec![0xCC, 0x01]);
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
        assert!(decode_hex("c").is_err());
        assert!(decode_hex("zz").is_err());
        assert!(decode_hex("é1").is_err());
    }

    #[test]
    fn parse_plain_byte() {
        let event = parse_event_line(r#"{"start":0.5,"end":0.50004,"data":"cc"}"#, 1).unwrap();
        assert_eq!(event.start, 0.5);
        assert_eq!(event.data, vec![0xCC]);
        assert_eq!(event.error, None);
    }

    #[test]
    fn parse_framing_error() {
        let event =
            parse_event_line(r#"{"start":0.0,"end":0.1,"data":"00","error":"framing"}"#, 3)
                .unwrap();
        assert_eq!(event.error, Some(FrameErrorTag::Framing));
        assert!(event.is_framing_error());
    }

    #[test]
    fn parse_reports_line_numbers() {
        let err = parse_event_line("{not json", 7).unwrap_err();
        assert!(matches!(err, JsonlSourceError::Json { line: 7, .. }));

        let err = parse_event_line(r#"{"start":0.0,"end":0.1,"data":"abc"}"#, 9).unwrap_err();
        assert!(matches!(err, JsonlSourceError::Hex { line: 9, .. }));

        let err = parse_event_line(r#"{"start":1.0,"end":0.5,"data":"00"}"#, 2).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
