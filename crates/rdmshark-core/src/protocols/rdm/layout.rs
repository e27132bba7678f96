//! RDM wire schema.
//!
//! Field order and widths follow ANSI E1.20 section 6.2. The start code is
//! consumed by the assembler before the schema begins, so the first field is
//! the sub-start code.

/// Start code that opens every RDM packet on the wire.
pub const START_CODE: u8 = 0xCC;

/// Number of fields in the packet schema (start code excluded).
pub const FIELD_COUNT: usize = 13;

/// Upper bound on the text taken from a label-type payload.
pub const LABEL_MAX_LEN: usize = 32;

/// Identifies one field of the RDM packet schema.
///
/// The discriminant is the field's position in [`FIELDS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    SubStartCode = 0,
    MessageLength,
    Destination,
    Source,
    TransactionNumber,
    PortId,
    MessageCount,
    SubDevice,
    CommandClass,
    ParameterId,
    ParameterDataLength,
    ParameterData,
    Checksum,
}

impl FieldId {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static FieldSpec {
        &FIELDS[self.index()]
    }
}

/// How many bytes a field occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLength {
    Fixed(usize),
    /// Big-endian unsigned value of an earlier field.
    DerivedFrom(FieldId),
}

/// Immutable descriptor for one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: FieldId,
    pub name: &'static str,
    pub length: FieldLength,
}

pub static FIELDS: [FieldSpec; FIELD_COUNT] = [
    FieldSpec {
        id: FieldId::SubStartCode,
        name: "sub",
        length: FieldLength::Fixed(1),
    },
    FieldSpec {
        id: FieldId::MessageLength,
        name: "length",
        length: FieldLength::Fixed(1),
    },
    FieldSpec {
        id: FieldId::Destination,
        name: "dst",
        length: FieldLength::Fixed(6),
    },
    FieldSpec {
        id: FieldId::Source,
        name: "src",
        length: FieldLength::Fixed(6),
    },
    FieldSpec {
        id: FieldId::TransactionNumber,
        name: "tn",
        length: FieldLength::Fixed(1),
    },
    FieldSpec {
        id: FieldId::PortId,
        name: "portid",
        length: FieldLength::Fixed(1),
    },
    FieldSpec {
        id: FieldId::MessageCount,
        name: "msgcount",
        length: FieldLength::Fixed(1),
    },
    FieldSpec {
        id: FieldId::SubDevice,
        name: "subdev",
        length: FieldLength::Fixed(2),
    },
    FieldSpec {
        id: FieldId::CommandClass,
        name: "cc",
        length: FieldLength::Fixed(1),
    },
    FieldSpec {
        id: FieldId::ParameterId,
        name: "pid",
        length: FieldLength::Fixed(2),
    },
    FieldSpec {
        id: FieldId::ParameterDataLength,
        name: "pdl",
        length: FieldLength::Fixed(1),
    },
    FieldSpec {
        id: FieldId::ParameterData,
        name: "pd",
        length: FieldLength::DerivedFrom(FieldId::ParameterDataLength),
    },
    FieldSpec {
        id: FieldId::Checksum,
        name: "checksum",
        length: FieldLength::Fixed(2),
    },
];

/// Interpret `bytes` as an unsigned big-endian integer.
///
/// Empty input reads as 0. Callers only pass fields of at most 6 bytes.
pub fn be_uint(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
