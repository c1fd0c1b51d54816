//! Transport and exchange layer for X50Q keyboard communication
//!
//! The keyboard takes commands on a USB interrupt OUT endpoint and answers on
//! a separate HID input interface:
//!
//! ```text
//! [Keyboard facade]
//!        |
//! [ExchangeEngine]  ← blocks, acks, notification routing
//!        |
//! [protocol codec]  ← 64-byte frames out, 9-byte reports in
//!        |
//! [UsbOutput] [HidInput]  ← implement OutputChannel / InputChannel
//! ```

pub mod error;
pub mod exchange;
pub mod notify;
pub mod protocol;
pub mod types;

mod discovery;
mod hid_input;
mod usb_output;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use discovery::{find_output_endpoint, open_device, EndpointShape, InterfaceShape};
pub use error::{DiscoveryError, ExchangeError, ProtocolError, TransportError};
pub use exchange::{ExchangeEngine, StatusPayload};
pub use hid_input::HidInput;
pub use notify::NotificationRouter;
pub use protocol::{classify, decode, encode, InboundFrame, OutboundFrame};
pub use types::{DeviceConfig, Notification, TransportDeviceInfo};
pub use usb_output::UsbOutput;

/// Outbound command channel (USB interrupt OUT)
pub trait OutputChannel {
    /// Write one frame, blocking until the transfer completes
    ///
    /// # Returns
    /// The tail of `frame` the device did not accept (empty on success)
    fn send<'a>(&mut self, frame: &'a [u8]) -> Result<&'a [u8], TransportError>;
}

/// Inbound report channel (HID interrupt IN)
pub trait InputChannel {
    /// Read one input report into `buf`, blocking until one arrives
    ///
    /// # Returns
    /// Number of bytes read; 0 when the poll produced nothing
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

impl<T: OutputChannel + ?Sized> OutputChannel for Box<T> {
    fn send<'a>(&mut self, frame: &'a [u8]) -> Result<&'a [u8], TransportError> {
        (**self).send(frame)
    }
}

impl<T: InputChannel + ?Sized> InputChannel for Box<T> {
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).receive(buf)
    }
}
