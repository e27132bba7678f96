use std::collections::BTreeMap;

use crate::protocols::rdm::tables::PARAMETER_ID_NAMES;
use crate::protocols::rdm::{PacketKind, PacketRecord};
use crate::{DecodeSummary, ParameterCount};

/// Running per-packet counters for the decode summary.
#[derive(Debug, Default)]
pub(crate) struct DecodeStats {
    commands: u64,
    responses: u64,
    unknown: u64,
    discarded: u64,
    parameters: BTreeMap<u16, u64>,
}

impl DecodeStats {
    pub(crate) fn add_packet(&mut self, record: &PacketRecord) {
        match record.kind {
            PacketKind::Command => self.commands += 1,
            PacketKind::Response => self.responses += 1,
            PacketKind::Unknown => self.unknown += 1,
        }
        if let Some(pid) = record.packet().parameter_id() {
            *self.parameters.entry(pid).or_default() += 1;
        }
    }

    pub(crate) fn add_discarded(&mut self) {
        self.discarded += 1;
    }

    pub(crate) fn build(self) -> DecodeSummary {
        let parameters = self
            .parameters
            .into_iter()
            .map(|(pid, count)| ParameterCount {
                pid: format!("0x{pid:04X}"),
                name: PARAMETER_ID_NAMES
                    .get(u64::from(pid))
                    .map(str::to_string),
                count,
            })
            .collect();
        DecodeSummary {
            packets_total: self.commands + self.responses + self.unknown,
            commands: self.commands,
            responses: self.responses,
            unknown: self.unknown,
            discarded: self.discarded,
            parameters,
        }
    }
}
