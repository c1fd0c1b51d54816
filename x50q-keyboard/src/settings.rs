//! Device status

use x50q_transport::protocol::device;
use x50q_transport::StatusPayload;

/// Keyboard status as reported by the status query
///
/// The meaning of the `unknown_*` bytes has not been worked out; they are
/// passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Active built-in profile (1-6)
    pub profile: u8,
    pub unknown_1: u8,
    /// Most likely the firmware version; 0x40 on tested units
    pub firmware_version: u8,
    pub unknown_2: u8,
    pub unknown_3: u8,
}

impl Status {
    /// Whether this driver has been tested with the reported firmware
    pub fn is_tested_firmware(&self) -> bool {
        self.firmware_version == device::TESTED_FIRMWARE
    }
}

impl From<StatusPayload> for Status {
    fn from(p: StatusPayload) -> Self {
        Self {
            profile: p.profile,
            unknown_1: p.unknown_1,
            firmware_version: p.firmware_version,
            unknown_2: p.unknown_2,
            unknown_3: p.unknown_3,
        }
    }
}
