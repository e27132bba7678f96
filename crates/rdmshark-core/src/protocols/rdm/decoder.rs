use super::layout::{FIELD_COUNT, FIELDS, FieldId, FieldLength, be_uint};

/// Field buffers of a finished packet, indexed by [`FieldId`].
///
/// Fields that were never reached or had a zero length stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPacket {
    fields: [Vec<u8>; FIELD_COUNT],
}

impl DecodedPacket {
    pub fn field(&self, id: FieldId) -> &[u8] {
        &self.fields[id.index()]
    }

    /// Command class byte, when exactly one byte was captured.
    pub fn command_class(&self) -> Option<u8> {
        match self.field(FieldId::CommandClass) {
            [cc] => Some(*cc),
            _ => None,
        }
    }

    pub fn parameter_id(&self) -> Option<u16> {
        match self.field(FieldId::ParameterId) {
            [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    /// Declared payload length; 0 when the field is missing.
    pub fn parameter_data_length(&self) -> usize {
        be_uint(self.field(FieldId::ParameterDataLength)) as usize
    }

    /// Payload bytes bounded by the declared length.
    pub fn parameter_data(&self) -> &[u8] {
        let data = self.field(FieldId::ParameterData);
        let len = self.parameter_data_length().min(data.len());
        &data[..len]
    }

    /// Total bytes held across all fields.
    pub fn len(&self) -> usize {
        self.fields.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a single [`PacketDecoder::consume`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes taken from the chunk. Anything after them belongs to the caller.
    pub consumed: usize,
    pub complete: bool,
}

/// Incremental state machine filling RDM fields in schema order.
///
/// The start code is not part of the schema; feed the bytes that follow it.
#[derive(Debug, Clone, Default)]
pub struct PacketDecoder {
    field_index: usize,
    filled: usize,
    packet: DecodedPacket,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and report whether the packet is complete.
    ///
    /// Bytes left over after completion are dropped; use [`Self::consume`]
    /// when the remainder matters.
    pub fn feed(&mut self, chunk: &[u8]) -> bool {
        self.consume(chunk).complete
    }

    /// Feed a chunk and report how much of it the packet used.
    pub fn consume(&mut self, chunk: &[u8]) -> Progress {
        let mut offset = 0;
        while offset < chunk.len() && !self.is_complete() {
            let target = self.target_length();
            if target == 0 {
                self.advance();
                continue;
            }

            let take = (target - self.filled).min(chunk.len() - offset);
            self.packet.fields[self.field_index].extend_from_slice(&chunk[offset..offset + take]);
            self.filled += take;
            offset += take;

            if self.filled == target {
                self.advance();
            }
        }

        Progress {
            consumed: offset,
            complete: self.is_complete(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.field_index == FIELD_COUNT
    }

    /// Field currently being filled, `None` once complete.
    pub fn current_field(&self) -> Option<FieldId> {
        FIELDS.get(self.field_index).map(|spec| spec.id)
    }

    /// Bytes already placed in the current field.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Bytes buffered so far across all fields.
    pub fn buffered(&self) -> usize {
        self.packet.len()
    }

    /// Hand the field buffers over once the packet is complete.
    pub fn into_packet(self) -> Option<DecodedPacket> {
        self.is_complete().then_some(self.packet)
    }

    fn target_length(&self) -> usize {
        match FIELDS[self.field_index].length {
            FieldLength::Fixed(len) => len,
            FieldLength::DerivedFrom(source) => be_uint(self.packet.field(source)) as usize,
        }
    }

    fn advance(&mut self) {
        self.field_index += 1;
        self.filled = 0;
    }
}
