//! Command/response exchange
//!
//! `ExchangeEngine` owns both channels and drives the request/response cycle:
//! send one frame, read input reports until the acknowledgement shows up, and
//! hand notifications seen in between to the [`NotificationRouter`].
//!
//! Large payloads go out as consecutive 60-byte blocks. Each block waits for
//! its own ack before the next is sent. A failed block aborts the transfer;
//! blocks already acknowledged stay applied on the device.

use tracing::{debug, trace};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{ExchangeError, ProtocolError};
use crate::notify::NotificationRouter;
use crate::protocol::{
    self, cmd, code, InboundFrame, OutboundFrame, ACK_MARKER, ACK_PAYLOAD_SIZE,
    BLOCK_PAYLOAD_SIZE, INPUT_BUFFER_SIZE, MAX_PROFILE, MAX_TRANSFER_SIZE,
};
use crate::types::Notification;
use crate::{InputChannel, OutputChannel};

/// Acknowledgement payload of the status query
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct StatusPayload {
    marker: u8,
    command: u8,
    pub profile: u8,
    pub unknown_1: u8,
    pub firmware_version: u8,
    pub unknown_2: u8,
    pub unknown_3: u8,
}

/// Single-threaded request/response driver over an output and input channel
pub struct ExchangeEngine<O, I> {
    output: O,
    input: I,
    router: NotificationRouter,
}

impl<O: OutputChannel, I: InputChannel> ExchangeEngine<O, I> {
    pub fn new(output: O, input: I) -> Self {
        Self {
            output,
            input,
            router: NotificationRouter::new(),
        }
    }

    /// Notification callbacks consulted by the read loop
    pub fn router_mut(&mut self) -> &mut NotificationRouter {
        &mut self.router
    }

    /// Give back the channels, dropping the callbacks
    pub fn into_channels(self) -> (O, I) {
        (self.output, self.input)
    }

    fn send_frame(&mut self, frame: &OutboundFrame) -> Result<(), ExchangeError> {
        let bytes = frame.bytes();
        trace!(
            "Sending {} block {}: {:02X?}",
            cmd::name(frame.command),
            frame.index,
            bytes
        );
        let remaining = self.output.send(bytes)?;
        if !remaining.is_empty() {
            return Err(ProtocolError::new(code::SHORT_WRITE, remaining).into());
        }
        Ok(())
    }

    /// Read input reports until an acknowledgement arrives
    ///
    /// Unrelated reports are skipped and notifications are dispatched on the
    /// way. Blocks for as long as the input channel does.
    fn wait_for_ack(&mut self) -> Result<[u8; ACK_PAYLOAD_SIZE], ExchangeError> {
        loop {
            let mut buf = [0u8; INPUT_BUFFER_SIZE];
            let len = self.input.receive(&mut buf)?;
            if len == 0 {
                continue;
            }
            let report = &buf[..len];
            trace!("Received: {:02X?}", report);

            match protocol::classify(report) {
                InboundFrame::Unrelated => continue,
                InboundFrame::Ack(payload) => return Ok(payload),
                InboundFrame::ProfileChanged(profile) => self
                    .router
                    .dispatch(Notification::ProfileChanged { profile }),
                InboundFrame::VolumeKey { pressed } => {
                    self.router.dispatch(Notification::VolumeKey { pressed })
                }
                InboundFrame::Malformed(err) => {
                    debug!("Malformed report (code {}): {:02X?}", err.code, report);
                    return Err(err.into());
                }
            }
        }
    }

    /// Send one block and wait for a clean acknowledgement
    ///
    /// The ack must carry the marker byte, echo `command`, and be zero
    /// everywhere else.
    pub fn exchange_block(
        &mut self,
        command: u8,
        subcommand: u8,
        index: u8,
        payload: &[u8],
    ) -> Result<(), ExchangeError> {
        let frame = protocol::encode(command, subcommand, index, payload)?;
        self.send_frame(&frame)?;
        let ack = self.wait_for_ack()?;

        if ack[0] != ACK_MARKER {
            return Err(ProtocolError::new(code::ACK_MARKER, &ack).into());
        }
        if ack[1] != command {
            return Err(ProtocolError::new(code::ACK_ECHO, &ack).into());
        }
        if ack[2..].iter().any(|&b| b != 0) {
            return Err(ProtocolError::new(code::ACK_DATA, &ack).into());
        }
        Ok(())
    }

    /// Upload `payload` as `max(1, ceil(total_size / 60))` sequential blocks
    ///
    /// Bytes past the end of `payload` (up to `total_size`) go out as zeros.
    pub fn exchange(
        &mut self,
        command: u8,
        subcommand: u8,
        total_size: usize,
        payload: &[u8],
    ) -> Result<(), ExchangeError> {
        if total_size > MAX_TRANSFER_SIZE {
            return Err(ExchangeError::PayloadTooLarge {
                len: total_size,
                max: MAX_TRANSFER_SIZE,
            });
        }
        if payload.len() > total_size {
            return Err(ExchangeError::PayloadTooLarge {
                len: payload.len(),
                max: total_size,
            });
        }

        let blocks = protocol::block_count(total_size);
        debug!(
            "{} (0x{:02X}/0x{:02X}): {} bytes in {} block(s)",
            cmd::name(command),
            command,
            subcommand,
            payload.len(),
            blocks
        );

        let mut chunks = payload.chunks(BLOCK_PAYLOAD_SIZE);
        for index in 0..blocks {
            let chunk = chunks.next().unwrap_or(&[]);
            // blocks <= MAX_BLOCKS, so the index fits in a byte
            self.exchange_block(command, subcommand, index as u8, chunk)?;
        }
        Ok(())
    }

    /// Query the status; the ack payload carries data instead of zeros
    pub fn status_exchange(&mut self) -> Result<StatusPayload, ExchangeError> {
        let frame = protocol::encode(cmd::GET_STATUS, 0, 0, &[])?;
        self.send_frame(&frame)?;
        let ack = self.wait_for_ack()?;

        let status = StatusPayload::read_from_bytes(&ack[..])
            .map_err(|_| ProtocolError::new(code::STATUS_MARKER, &ack))?;
        if status.marker != ACK_MARKER {
            return Err(ProtocolError::new(code::STATUS_MARKER, &ack).into());
        }
        if status.command != cmd::GET_STATUS {
            return Err(ProtocolError::new(code::STATUS_ECHO, &ack).into());
        }
        if !(1..=MAX_PROFILE).contains(&status.profile) {
            return Err(ProtocolError::new(code::STATUS_PROFILE, &ack).into());
        }
        debug!("Status: {:?}", status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ack, RecordingOutput, ScriptedInput};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(
        reports: Vec<Vec<u8>>,
    ) -> ExchangeEngine<RecordingOutput, ScriptedInput> {
        ExchangeEngine::new(RecordingOutput::new(), ScriptedInput::new(reports))
    }

    #[test]
    fn test_exchange_block_clean_ack() {
        let mut eng = engine(vec![ack(cmd::SELECT_PROFILE)]);
        eng.exchange_block(cmd::SELECT_PROFILE, 3, 0, &[]).unwrap();
        let (out, input) = eng.into_channels();
        assert_eq!(out.frames.len(), 1);
        assert_eq!(&out.frames[0][..4], &[0x07, 0x01, 0x03, 0x00]);
        assert!(input.is_drained());
    }

    #[test]
    fn test_exchange_block_rejects_nonzero_ack() {
        for offset in 4..9 {
            let mut report = ack(cmd::SET_IDLE_EFFECTS);
            report[offset] = 1;
            let mut eng = engine(vec![report.clone()]);
            let err = eng
                .exchange_block(cmd::SET_IDLE_EFFECTS, cmd::SUB_PER_KEY, 0, &[])
                .unwrap_err();
            match err {
                ExchangeError::Protocol(e) => {
                    assert_eq!(e.code, code::ACK_DATA);
                    assert_eq!(e.raw, &report[2..]);
                }
                other => panic!("expected protocol error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_exchange_block_rejects_wrong_echo_and_marker() {
        let mut eng = engine(vec![ack(cmd::SET_IDLE_COLORS)]);
        let err = eng
            .exchange_block(cmd::SET_ACTIVE_COLORS, cmd::SUB_PER_KEY, 0, &[])
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Protocol(ProtocolError { code: code::ACK_ECHO, .. })
        ));

        let mut report = ack(cmd::SET_IDLE_COLORS);
        report[2] = 0x09;
        let mut eng = engine(vec![report]);
        let err = eng
            .exchange_block(cmd::SET_IDLE_COLORS, cmd::SUB_PER_KEY, 0, &[])
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Protocol(ProtocolError { code: code::ACK_MARKER, .. })
        ));
    }

    #[test]
    fn test_unrelated_and_empty_reads_are_skipped() {
        let mut eng = engine(vec![
            vec![],
            vec![0x03, 0xE9, 0x00],
            vec![0x01, 0x00, 0x00, 0x00],
            ack(cmd::SELECT_PROFILE),
        ]);
        eng.exchange_block(cmd::SELECT_PROFILE, 1, 0, &[]).unwrap();
    }

    #[test]
    fn test_short_write_is_protocol_error() {
        let mut eng = ExchangeEngine::new(
            RecordingOutput::accepting(40),
            ScriptedInput::new(vec![ack(cmd::SELECT_PROFILE)]),
        );
        let err = eng.exchange_block(cmd::SELECT_PROFILE, 1, 0, &[]).unwrap_err();
        match err {
            ExchangeError::Protocol(e) => {
                assert_eq!(e.code, code::SHORT_WRITE);
                assert_eq!(e.raw.len(), 24);
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn test_exchange_block_count_and_slices() {
        for size in [0usize, 1, 59, 60, 61, 144, 432] {
            let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8 + 1).collect();
            let blocks = protocol::block_count(size);
            let mut eng = engine(vec![ack(cmd::SET_ACTIVE_DURATION); blocks]);
            eng.exchange(cmd::SET_ACTIVE_DURATION, cmd::SUB_PER_KEY, size, &payload)
                .unwrap();
            let (out, _) = eng.into_channels();

            assert_eq!(out.frames.len(), size.div_ceil(60).max(1));
            let mut rebuilt = Vec::new();
            for (i, frame) in out.frames.iter().enumerate() {
                assert_eq!(frame.len(), 64);
                assert_eq!(frame[3] as usize, i);
                let take = (size - rebuilt.len()).min(60);
                rebuilt.extend_from_slice(&frame[4..4 + take]);
                assert!(frame[4 + take..].iter().all(|&b| b == 0));
            }
            assert_eq!(rebuilt, payload);
        }
    }

    #[test]
    fn test_exchange_short_payload_is_padded() {
        let mut eng = engine(vec![ack(cmd::SET_IDLE_EFFECTS); 3]);
        eng.exchange(cmd::SET_IDLE_EFFECTS, cmd::SUB_PER_KEY, 144, &[2; 10])
            .unwrap();
        let (out, _) = eng.into_channels();
        assert_eq!(out.frames.len(), 3);
        assert_eq!(&out.frames[0][4..14], &[2; 10]);
        assert!(out.frames[0][14..].iter().all(|&b| b == 0));
        assert!(out.frames[1][4..].iter().all(|&b| b == 0));
        assert!(out.frames[2][4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_exchange_rejects_oversized() {
        let mut eng = engine(vec![]);
        let err = eng
            .exchange(cmd::SET_IDLE_EFFECTS, cmd::SUB_PER_KEY, 144, &[0; 145])
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::PayloadTooLarge { len: 145, max: 144 }
        ));

        let err = eng
            .exchange(cmd::SET_IDLE_EFFECTS, cmd::SUB_PER_KEY, 60 * 256 + 1, &[])
            .unwrap_err();
        assert!(matches!(err, ExchangeError::PayloadTooLarge { .. }));
        let (out, _) = eng.into_channels();
        assert!(out.frames.is_empty());
    }

    #[test]
    fn test_failure_stops_remaining_blocks() {
        let mut eng = engine(vec![
            ack(cmd::SET_IDLE_COLORS),
            vec![0x08, 0x99, 0, 0, 0, 0, 0, 0, 0],
            ack(cmd::SET_IDLE_COLORS),
        ]);
        let err = eng
            .exchange(cmd::SET_IDLE_COLORS, cmd::SUB_PER_KEY, 432, &[0x10; 432])
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Protocol(ProtocolError { code: code::UNKNOWN_KIND, .. })
        ));
        let (out, _) = eng.into_channels();
        assert_eq!(out.frames.len(), 2);
    }

    #[test]
    fn test_notifications_dispatched_before_ack() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut eng = engine(vec![
            vec![0x08, 0x02, 0x03, 0x24, 0xF0, 0x20, 0x2B, 0x05, 0x00],
            ack(cmd::SELECT_PROFILE),
        ]);
        let s = Rc::clone(&seen);
        eng.router_mut()
            .set_profile_callback(move |profile| s.borrow_mut().push(profile));
        eng.exchange_block(cmd::SELECT_PROFILE, 2, 0, &[]).unwrap();
        assert_eq!(*seen.borrow(), vec![5]);
    }

    #[test]
    fn test_status_exchange() {
        let mut eng = engine(vec![vec![0x08, 0x00, 0x08, 0x81, 6, 0, 0x40, 0, 0]]);
        let status = eng.status_exchange().unwrap();
        assert_eq!(status.profile, 6);
        assert_eq!(status.unknown_1, 0);
        assert_eq!(status.firmware_version, 0x40);
        assert_eq!(status.unknown_2, 0);
        assert_eq!(status.unknown_3, 0);
        let (out, _) = eng.into_channels();
        assert_eq!(&out.frames[0][..4], &[0x07, 0x81, 0x00, 0x00]);
    }

    #[test]
    fn test_status_exchange_errors() {
        let cases = [
            (vec![0x08, 0x00, 0x07, 0x81, 6, 0, 0x40, 0, 0], code::STATUS_MARKER),
            (vec![0x08, 0x00, 0x08, 0x01, 6, 0, 0x40, 0, 0], code::STATUS_ECHO),
            (vec![0x08, 0x00, 0x08, 0x81, 0, 0, 0x40, 0, 0], code::STATUS_PROFILE),
            (vec![0x08, 0x00, 0x08, 0x81, 7, 0, 0x40, 0, 0], code::STATUS_PROFILE),
        ];
        for (report, expected) in cases {
            let mut eng = engine(vec![report]);
            match eng.status_exchange().unwrap_err() {
                ExchangeError::Protocol(e) => assert_eq!(e.code, expected),
                other => panic!("expected protocol error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_transport_error_propagates() {
        let mut eng = engine(vec![]);
        let err = eng.exchange_block(cmd::SELECT_PROFILE, 1, 0, &[]).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Transport(crate::TransportError::Disconnected)
        ));
    }
}
