//! Protocol constants and frame codec for the X50Q keyboard
//!
//! Commands go out as 64-byte interrupt transfers on the vendor USB interface:
//!
//! ```text
//! [0x07, cmd, subcmd, block_index, payload[60]]
//! ```
//!
//! Responses and notifications come back as 9-byte HID input reports with
//! report ID 0x08:
//!
//! ```text
//! ack:             [08, 00, 08, cmd, d0, d1, d2, d3, d4]
//! profile changed: [08, 02, 03, 24, f0, 20, 2b, profile, 00]
//! volume key:      [08, 67, 0c, 07, 73, pressed, 00, 00, 00]
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{ExchangeError, ProtocolError};

/// Command bytes
pub mod cmd {
    /// Select a built-in profile; the subcommand carries the profile index
    pub const SELECT_PROFILE: u8 = 0x01;
    pub const SET_IDLE_COLORS: u8 = 0x09;
    pub const SET_ACTIVE_COLORS: u8 = 0x0A;
    pub const SET_IDLE_EFFECTS: u8 = 0x0D;
    pub const SET_ACTIVE_EFFECTS: u8 = 0x0E;
    pub const SET_ACTIVE_DURATION: u8 = 0x0F;
    pub const GET_STATUS: u8 = 0x81;

    /// Subcommand used by every per-key table upload
    pub const SUB_PER_KEY: u8 = 0x06;

    /// Get human-readable name for command byte
    pub fn name(cmd: u8) -> &'static str {
        match cmd {
            SELECT_PROFILE => "SELECT_PROFILE",
            SET_IDLE_COLORS => "SET_IDLE_COLORS",
            SET_ACTIVE_COLORS => "SET_ACTIVE_COLORS",
            SET_IDLE_EFFECTS => "SET_IDLE_EFFECTS",
            SET_ACTIVE_EFFECTS => "SET_ACTIVE_EFFECTS",
            SET_ACTIVE_DURATION => "SET_ACTIVE_DURATION",
            GET_STATUS => "GET_STATUS",
            _ => "UNKNOWN",
        }
    }
}

/// Inbound frame kind tags (byte 1 of an input report)
pub mod kind {
    pub const ACK: u8 = 0x00;
    pub const PROFILE_CHANGED: u8 = 0x02;
    pub const VOLUME_KEY: u8 = 0x67;
}

/// Numeric classification codes carried by [`ProtocolError`]
pub mod code {
    /// The USB transfer did not take the whole frame
    pub const SHORT_WRITE: u16 = 0;
    /// Protocol report with a length other than 9
    pub const REPORT_LENGTH: u16 = 1;
    pub const PROFILE_NOTIFICATION: u16 = 2;
    pub const VOLUME_NOTIFICATION: u16 = 3;
    pub const UNKNOWN_KIND: u16 = 4;
    pub const ACK_MARKER: u16 = 5;
    pub const ACK_ECHO: u16 = 6;
    /// A set command was acknowledged with non-zero data
    pub const ACK_DATA: u16 = 7;
    pub const STATUS_MARKER: u16 = 8;
    pub const STATUS_ECHO: u16 = 9;
    pub const STATUS_PROFILE: u16 = 10;
}

/// Device identification constants
pub mod device {
    pub const VENDOR_ID: u16 = 0x24F0;
    pub const PRODUCT_ID: u16 = 0x202B;

    /// HID interface delivering acknowledgements and notifications
    pub const INPUT_INTERFACE: i32 = 1;
    /// USB interface whose single endpoint takes outbound frames
    pub const OUTPUT_INTERFACE: u8 = 2;
    /// Number of interfaces in the active configuration
    pub const INTERFACE_COUNT: usize = 3;
    pub const OUTPUT_MAX_PACKET_SIZE: usize = 64;

    /// Firmware version this driver has been tested against
    pub const TESTED_FIRMWARE: u8 = 0x40;
}

/// Outbound report ID
pub const OUTPUT_REPORT_ID: u8 = 0x07;
/// Inbound report ID of protocol frames; anything else is unrelated traffic
pub const INPUT_REPORT_ID: u8 = 0x08;

pub const FRAME_SIZE: usize = 64;
pub const FRAME_HEADER_SIZE: usize = 4;
/// Payload bytes per block
pub const BLOCK_PAYLOAD_SIZE: usize = FRAME_SIZE - FRAME_HEADER_SIZE;
/// Block indices are a single byte
pub const MAX_BLOCKS: usize = 256;
pub const MAX_TRANSFER_SIZE: usize = BLOCK_PAYLOAD_SIZE * MAX_BLOCKS;

/// Bytes read per input poll. One more than a protocol frame so that
/// oversized reports can be detected.
pub const INPUT_BUFFER_SIZE: usize = 10;
pub const INPUT_REPORT_SIZE: usize = 9;
pub const ACK_PAYLOAD_SIZE: usize = 7;
/// First byte of every acknowledgement payload
pub const ACK_MARKER: u8 = 0x08;

/// Notification templates for bytes 2..9; `None` marks the data byte
const PROFILE_TEMPLATE: [Option<u8>; 7] = [
    Some(0x03),
    Some(0x24),
    Some(0xF0),
    Some(0x20),
    Some(0x2B),
    None,
    Some(0x00),
];
const VOLUME_TEMPLATE: [Option<u8>; 7] = [
    Some(0x0C),
    Some(0x07),
    Some(0x73),
    None,
    Some(0x00),
    Some(0x00),
    Some(0x00),
];

/// Offset of the profile number in a profile-changed report
pub const PROFILE_OFFSET: usize = 7;
/// Offset of the press flag in a volume-key report
pub const VOLUME_FLAG_OFFSET: usize = 5;

/// Highest built-in profile number
pub const MAX_PROFILE: u8 = 6;

/// One outbound 64-byte frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct OutboundFrame {
    report_id: u8,
    pub command: u8,
    pub subcommand: u8,
    pub index: u8,
    pub payload: [u8; BLOCK_PAYLOAD_SIZE],
}

impl OutboundFrame {
    /// Wire bytes of this frame
    pub fn bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Build an outbound frame, zero-padding the payload to 60 bytes
pub fn encode(
    command: u8,
    subcommand: u8,
    index: u8,
    payload: &[u8],
) -> Result<OutboundFrame, ExchangeError> {
    if payload.len() > BLOCK_PAYLOAD_SIZE {
        return Err(ExchangeError::PayloadTooLarge {
            len: payload.len(),
            max: BLOCK_PAYLOAD_SIZE,
        });
    }
    let mut frame = OutboundFrame {
        report_id: OUTPUT_REPORT_ID,
        command,
        subcommand,
        index,
        payload: [0; BLOCK_PAYLOAD_SIZE],
    };
    frame.payload[..payload.len()].copy_from_slice(payload);
    Ok(frame)
}

/// Parse a 64-byte outbound frame back into its fields
///
/// Returns `None` if the buffer has the wrong size or report ID.
pub fn decode(bytes: &[u8]) -> Option<OutboundFrame> {
    let frame = OutboundFrame::read_from_bytes(bytes).ok()?;
    (frame.report_id == OUTPUT_REPORT_ID).then_some(frame)
}

/// Classified inbound report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Not a protocol frame (e.g. multimedia keys); ignored by the read loop
    Unrelated,
    /// Command acknowledgement; meaning of the payload depends on the command
    Ack([u8; ACK_PAYLOAD_SIZE]),
    /// The active profile was changed on the keyboard (1-6)
    ProfileChanged(u8),
    /// The volume key was moved
    VolumeKey { pressed: bool },
    /// A protocol frame we do not understand
    Malformed(ProtocolError),
}

fn matches_template(report: &[u8], template: &[Option<u8>; 7]) -> bool {
    template
        .iter()
        .zip(&report[2..INPUT_REPORT_SIZE])
        .all(|(expected, actual)| expected.map_or(true, |b| b == *actual))
}

/// Classify one inbound report
pub fn classify(report: &[u8]) -> InboundFrame {
    if report.first() != Some(&INPUT_REPORT_ID) {
        return InboundFrame::Unrelated;
    }
    if report.len() != INPUT_REPORT_SIZE {
        return InboundFrame::Malformed(ProtocolError::new(code::REPORT_LENGTH, report));
    }

    match report[1] {
        kind::ACK => {
            let mut payload = [0u8; ACK_PAYLOAD_SIZE];
            payload.copy_from_slice(&report[2..INPUT_REPORT_SIZE]);
            InboundFrame::Ack(payload)
        }
        kind::PROFILE_CHANGED => {
            let profile = report[PROFILE_OFFSET];
            if !matches_template(report, &PROFILE_TEMPLATE) || !(1..=MAX_PROFILE).contains(&profile)
            {
                return InboundFrame::Malformed(ProtocolError::new(
                    code::PROFILE_NOTIFICATION,
                    report,
                ));
            }
            InboundFrame::ProfileChanged(profile)
        }
        kind::VOLUME_KEY => {
            if !matches_template(report, &VOLUME_TEMPLATE) {
                return InboundFrame::Malformed(ProtocolError::new(
                    code::VOLUME_NOTIFICATION,
                    report,
                ));
            }
            match report[VOLUME_FLAG_OFFSET] {
                0 => InboundFrame::VolumeKey { pressed: false },
                1 => InboundFrame::VolumeKey { pressed: true },
                _ => InboundFrame::Malformed(ProtocolError::new(
                    code::VOLUME_NOTIFICATION,
                    report,
                )),
            }
        }
        _ => InboundFrame::Malformed(ProtocolError::new(code::UNKNOWN_KIND, report)),
    }
}

/// Number of blocks needed to upload `total_size` bytes (at least one)
pub fn block_count(total_size: usize) -> usize {
    total_size.div_ceil(BLOCK_PAYLOAD_SIZE).max(1)
}
