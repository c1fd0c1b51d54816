//! In-memory channels for exercising the exchange without a keyboard
//!
//! `RecordingOutput` keeps every frame written to it, `ScriptedInput` replays
//! a fixed list of input reports and reports `Disconnected` once exhausted.

use std::collections::VecDeque;

use crate::error::TransportError;
use crate::protocol::{kind, ACK_MARKER, INPUT_REPORT_ID};
use crate::{InputChannel, OutputChannel};

/// Clean acknowledgement report for `command`
pub fn ack(command: u8) -> Vec<u8> {
    vec![INPUT_REPORT_ID, kind::ACK, ACK_MARKER, command, 0, 0, 0, 0, 0]
}

/// Output channel that records frames
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub frames: Vec<Vec<u8>>,
    accept: Option<usize>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only take the first `bytes` of every frame, leaving a tail unsent
    pub fn accepting(bytes: usize) -> Self {
        Self {
            frames: Vec::new(),
            accept: Some(bytes),
        }
    }
}

impl OutputChannel for RecordingOutput {
    fn send<'a>(&mut self, frame: &'a [u8]) -> Result<&'a [u8], TransportError> {
        self.frames.push(frame.to_vec());
        let written = self.accept.unwrap_or(frame.len()).min(frame.len());
        Ok(&frame[written..])
    }
}

/// Input channel that replays a script of reports
#[derive(Debug, Default)]
pub struct ScriptedInput {
    reports: VecDeque<Vec<u8>>,
}

impl ScriptedInput {
    pub fn new(reports: Vec<Vec<u8>>) -> Self {
        Self {
            reports: reports.into(),
        }
    }

    pub fn push(&mut self, report: Vec<u8>) {
        self.reports.push_back(report);
    }

    /// Whether every scripted report has been consumed
    pub fn is_drained(&self) -> bool {
        self.reports.is_empty()
    }
}

impl InputChannel for ScriptedInput {
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let report = self.reports.pop_front().ok_or(TransportError::Disconnected)?;
        let len = report.len().min(buf.len());
        buf[..len].copy_from_slice(&report[..len]);
        Ok(len)
    }
}
