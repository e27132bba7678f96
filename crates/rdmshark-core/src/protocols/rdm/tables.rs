//! Display names for command classes and parameter IDs.
//!
//! Tables are sorted by code and only consulted for rendering; decoding never
//! branches on them.

/// Read-only code → mnemonic table, sorted by code.
#[derive(Debug, Clone, Copy)]
pub struct NameTable {
    entries: &'static [(u16, &'static str)],
}

impl NameTable {
    const fn new(entries: &'static [(u16, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn get(&self, code: u64) -> Option<&'static str> {
        let code = u16::try_from(code).ok()?;
        self.entries
            .binary_search_by_key(&code, |(key, _)| *key)
            .ok()
            .map(|index| self.entries[index].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &'static str)> + '_ {
        self.entries.iter().copied()
    }
}

pub const DISC_COMMAND: u8 = 0x10;
pub const DISC_COMMAND_RESPONSE: u8 = 0x11;
pub const GET_COMMAND: u8 = 0x20;
pub const GET_COMMAND_RESPONSE: u8 = 0x21;
pub const SET_COMMAND: u8 = 0x30;
pub const SET_COMMAND_RESPONSE: u8 = 0x31;

pub const REQUEST_COMMAND_CLASSES: [u8; 3] = [DISC_COMMAND, GET_COMMAND, SET_COMMAND];
pub const RESPONSE_COMMAND_CLASSES: [u8; 3] = [
    DISC_COMMAND_RESPONSE,
    GET_COMMAND_RESPONSE,
    SET_COMMAND_RESPONSE,
];

pub static COMMAND_CLASS_NAMES: NameTable = NameTable::new(&[
    (DISC_COMMAND as u16, "DISC_CMD"),
    (DISC_COMMAND_RESPONSE as u16, "DISC_RSP"),
    (GET_COMMAND as u16, "GET_CMD"),
    (GET_COMMAND_RESPONSE as u16, "GET_RSP"),
    (SET_COMMAND as u16, "SET_CMD"),
    (SET_COMMAND_RESPONSE as u16, "SET_RSP"),
]);

/// Mnemonic of DEVICE_MODEL_DESCRIPTION, whose payload is text like the labels.
pub const DEVICE_MODEL_DESCRIPTION: &str = "DEV_MODEL_DESC";

// E1.20 table A-3.
pub static PARAMETER_ID_NAMES: NameTable = NameTable::new(&[
    (0x0001, "DISC_UNIQUE"),
    (0x0002, "DISC_MUTE"),
    (0x0003, "DISC_UNMUTE"),
    (0x0010, "PROXY_DEVS"),
    (0x0011, "PROXY_DEV_CNT"),
    (0x0015, "COMMS_STATUS"),
    (0x0020, "QUEUED_MSG"),
    (0x0030, "STATUS_MSGS"),
    (0x0031, "STATUS_ID_DESC"),
    (0x0032, "STATUS_ID_CLEAR"),
    (0x0033, "SUBDEV_STATUS_THR"),
    (0x0034, "QUEUED_MSG_SENSOR_SUB"),
    (0x0050, "SUPPORTED_PIDS"),
    (0x0051, "PID_DESC"),
    (0x0055, "SUPPORTED_PIDS_ENH"),
    (0x0056, "CTRL_FLAG_SUPPORT"),
    (0x0057, "NACK_DESC"),
    (0x0058, "PACKED_PID_SUB"),
    (0x0059, "PACKED_PID_INDEX"),
    (0x0060, "DEV_INFO"),
    (0x0070, "PROD_DETAIL_IDS"),
    (0x0080, DEVICE_MODEL_DESCRIPTION),
    (0x0081, "MFR_LABEL"),
    (0x0082, "DEV_LABEL"),
    (0x0090, "FACTORY_DEFAULTS"),
    (0x00A0, "LANG_CAPS"),
    (0x00B0, "LANGUAGE"),
    (0x00C0, "SW_VER_LABEL"),
    (0x00C1, "BOOT_SW_VER_ID"),
    (0x00C2, "BOOT_SW_VER_LABEL"),
    (0x00E0, "DMX_PERSONALITY"),
    (0x00E1, "DMX_PERSONALITY_DESC"),
    (0x00F0, "DMX_START_ADDR"),
    (0x0120, "SLOT_INFO"),
    (0x0121, "SLOT_DESC"),
    (0x0122, "DEFAULT_SLOT_VAL"),
    (0x0200, "SENSOR_DEF"),
    (0x0201, "SENSOR_VAL"),
    (0x0202, "SENSOR_RECORD"),
    (0x0400, "DEV_HOURS"),
    (0x0401, "LAMP_HOURS"),
    (0x0402, "LAMP_STRIKES"),
    (0x0403, "LAMP_STATE"),
    (0x0404, "LAMP_ON_MODE"),
    (0x0405, "DEV_POWER_CYC"),
    (0x0500, "DISPLAY_INVERT"),
    (0x0501, "DISPLAY_LEVEL"),
    (0x0600, "PAN_INVERT"),
    (0x0601, "TILT_INVERT"),
    (0x0602, "PAN_TILT_SWAP"),
    (0x0603, "RTC"),
    (0x1000, "IDENTIFY"),
    (0x1001, "RESET"),
    (0x1002, "POWER_STATE"),
    (0x1003, "SELFTEST"),
    (0x1004, "SELFTEST_DESC"),
    (0x1005, "CAPTURE_PRESET"),
    (0x1006, "PRESET_PLAYBACK"),
]);

/// Whether the named parameter carries ASCII text rather than binary data.
pub fn is_label_parameter(name: &str) -> bool {
    name.ends_with("_LABEL") || name == DEVICE_MODEL_DESCRIPTION
}
