//! HID input channel: acknowledgements and notifications from the keyboard

use hidapi::HidDevice;
use tracing::trace;

use crate::error::TransportError;
use crate::InputChannel;

/// Reads input reports from the keyboard's HID interface
pub struct HidInput {
    device: HidDevice,
    /// Read timeout (ms); `None` blocks until a report arrives
    timeout_ms: Option<u32>,
}

impl HidInput {
    /// Wrap an opened HID device
    ///
    /// # Arguments
    /// * `device` - HID device of the input interface
    /// * `timeout_ms` - Optional read timeout; elapsing yields `TransportError::Timeout`
    pub fn new(device: HidDevice, timeout_ms: Option<u32>) -> Self {
        Self { device, timeout_ms }
    }

    /// Set read timeout (None for blocking reads)
    pub fn set_timeout(&mut self, timeout_ms: Option<u32>) {
        self.timeout_ms = timeout_ms;
    }
}

impl InputChannel for HidInput {
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.timeout_ms {
            None => Ok(self.device.read(buf)?),
            Some(ms) => {
                let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
                let len = self.device.read_timeout(buf, timeout)?;
                if len == 0 {
                    trace!("No input report within {} ms", ms);
                    return Err(TransportError::Timeout);
                }
                Ok(len)
            }
        }
    }
}
