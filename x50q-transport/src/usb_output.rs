//! USB output channel: interrupt OUT transfers on the vendor interface

use futures::executor::block_on;
use nusb::Interface;

use crate::error::TransportError;
use crate::OutputChannel;

/// Sends frames to the keyboard's interrupt OUT endpoint
pub struct UsbOutput {
    interface: Interface,
    endpoint: u8,
}

impl UsbOutput {
    /// Wrap a claimed interface and its OUT endpoint address
    pub fn new(interface: Interface, endpoint: u8) -> Self {
        Self {
            interface,
            endpoint,
        }
    }

    /// Address of the OUT endpoint
    pub fn endpoint(&self) -> u8 {
        self.endpoint
    }
}

impl OutputChannel for UsbOutput {
    fn send<'a>(&mut self, frame: &'a [u8]) -> Result<&'a [u8], TransportError> {
        let completion = block_on(self.interface.interrupt_out(self.endpoint, frame.to_vec()));
        let written = completion.into_result()?.actual_length();
        Ok(&frame[written.min(frame.len())..])
    }
}
