//! Display rendering for decoded packets.
//!
//! Everything here is presentation: values are turned into strings for
//! reports and console lines, and empty fields render as empty strings.

use std::fmt;
use std::fmt::Write as _;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::Verbosity;

use super::decoder::DecodedPacket;
use super::layout::{FieldId, LABEL_MAX_LEN, be_uint};
use super::tables::{COMMAND_CLASS_NAMES, NameTable, PARAMETER_ID_NAMES, is_label_parameter};

pub const COMMAND_CLASS_HEX_WIDTH: usize = 2;
pub const PARAMETER_ID_HEX_WIDTH: usize = 4;

/// Ordered display-name → value mapping, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut fields = FieldMap::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    fields.insert(key, value);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// Render a big-endian code through a name table.
///
/// Empty input renders as `""`. Known codes render as the mnemonic, followed
/// by the zero-padded hex code when `include_hex` is set; unknown codes
/// render as hex only.
pub fn format_named(raw: &[u8], table: &NameTable, hex_width: usize, include_hex: bool) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let value = be_uint(raw);
    match table.get(value) {
        Some(name) if include_hex => format!("{name} (0x{value:0hex_width$X})"),
        Some(name) => name.to_string(),
        None => format!("0x{value:0hex_width$X}"),
    }
}

/// Lowercase hex with a `0x` prefix, or `""` for an empty field.
pub fn format_hex(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(2 + raw.len() * 2);
    out.push_str("0x");
    for byte in raw {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Decimal rendering of a big-endian field, or `""` when empty.
pub fn format_decimal(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }
    be_uint(raw).to_string()
}

/// Break duration in milliseconds, rounded to four decimals.
///
/// Whole values keep one decimal (`"250.0 ms"`).
pub fn format_break_time(seconds: f64) -> String {
    let millis = (seconds * 1000.0 * 10_000.0).round() / 10_000.0;
    if millis.fract() == 0.0 {
        format!("{millis:.1} ms")
    } else {
        format!("{millis} ms")
    }
}

/// Mnemonic of the packet's parameter ID, when known.
pub fn parameter_name(packet: &DecodedPacket) -> Option<&'static str> {
    packet
        .parameter_id()
        .and_then(|pid| PARAMETER_ID_NAMES.get(u64::from(pid)))
}

/// Render the parameter data.
///
/// Label-type parameters decode as ASCII text cut at the first NUL and at
/// [`LABEL_MAX_LEN`] bytes; everything else renders as hex.
pub fn format_parameter_data(packet: &DecodedPacket) -> String {
    if packet.parameter_data_length() == 0 {
        return String::new();
    }
    let data = packet.parameter_data();
    if parameter_name(packet).is_some_and(is_label_parameter) {
        return decode_label(data);
    }
    let mut out = format_hex(data);
    if out.is_empty() {
        out.push_str("0x");
    }
    out
}

fn decode_label(data: &[u8]) -> String {
    let data = &data[..data.len().min(LABEL_MAX_LEN)];
    let text = match data.iter().position(|&b| b == 0) {
        Some(nul) => &data[..nul],
        None => data,
    };
    text.iter()
        .map(|&b| {
            if b.is_ascii() {
                char::from(b)
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect()
}

/// Build the display mapping for a completed packet.
///
/// `src`, `dst`, `cc`, `pid`, `pdl`, `pd` and `checksum` are always present;
/// verbose output adds the header counters, the break time and the bare PID.
pub fn render_fields(packet: &DecodedPacket, verbosity: Verbosity, break_duration: f64) -> FieldMap {
    let verbose = verbosity.is_verbose();
    let mut fields = FieldMap::new();

    if verbose {
        fields.insert("length", format_decimal(packet.field(FieldId::MessageLength)));
    }
    fields.insert("src", format_hex(packet.field(FieldId::Source)));
    fields.insert("dst", format_hex(packet.field(FieldId::Destination)));
    if verbose {
        fields.insert("tn", format_decimal(packet.field(FieldId::TransactionNumber)));
        fields.insert("portid", format_decimal(packet.field(FieldId::PortId)));
        fields.insert("msgcount", format_decimal(packet.field(FieldId::MessageCount)));
        fields.insert("breaktime", format_break_time(break_duration));
        fields.insert("subdev", format_decimal(packet.field(FieldId::SubDevice)));
    }
    fields.insert(
        "cc",
        format_named(
            packet.field(FieldId::CommandClass),
            &COMMAND_CLASS_NAMES,
            COMMAND_CLASS_HEX_WIDTH,
            verbose,
        ),
    );
    fields.insert(
        "pid",
        format_named(
            packet.field(FieldId::ParameterId),
            &PARAMETER_ID_NAMES,
            PARAMETER_ID_HEX_WIDTH,
            verbose,
        ),
    );
    if verbose {
        let pid_hex = packet
            .parameter_id()
            .map(|pid| format!("0x{pid:04X}"))
            .unwrap_or_default();
        fields.insert("pid_hex", pid_hex);
    }
    fields.insert(
        "pdl",
        format_decimal(packet.field(FieldId::ParameterDataLength)),
    );
    fields.insert("pd", format_parameter_data(packet));
    fields.insert("checksum", format_hex(packet.field(FieldId::Checksum)));
    fields
}

/// One-line summary used for console echo, independent of verbosity.
pub fn console_line(tag: &str, packet: &DecodedPacket) -> String {
    format!(
        "RDM {tag} src={} dst={} cc={} pid={} pdl={} pd={}",
        format_hex(packet.field(FieldId::Source)),
        format_hex(packet.field(FieldId::Destination)),
        format_named(
            packet.field(FieldId::CommandClass),
            &COMMAND_CLASS_NAMES,
            COMMAND_CLASS_HEX_WIDTH,
            true,
        ),
        format_named(
            packet.field(FieldId::ParameterId),
            &PARAMETER_ID_NAMES,
            PARAMETER_ID_HEX_WIDTH,
            true,
        ),
        format_hex(packet.field(FieldId::ParameterDataLength)),
        format_parameter_data(packet),
    )
}
