//! Transport and protocol error types

use std::fmt;

use thiserror::Error;

/// Errors reported by the raw USB/HID channels
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device disconnected")]
    Disconnected,

    #[error("Communication timeout")]
    Timeout,

    // HID-specific errors
    #[error("HID error: {0}")]
    HidError(String),

    #[error("HID permission denied: {0}")]
    HidPermissionDenied(String),

    // USB-specific errors
    #[error("USB error: {0}")]
    UsbError(String),

    #[error("USB transfer failed: {0}")]
    UsbTransfer(String),
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") {
            TransportError::HidPermissionDenied(msg)
        } else {
            TransportError::HidError(msg)
        }
    }
}

impl From<nusb::Error> for TransportError {
    fn from(e: nusb::Error) -> Self {
        TransportError::UsbError(e.to_string())
    }
}

impl From<nusb::transfer::TransferError> for TransportError {
    fn from(e: nusb::transfer::TransferError) -> Self {
        match e {
            nusb::transfer::TransferError::Disconnected => TransportError::Disconnected,
            other => TransportError::UsbTransfer(other.to_string()),
        }
    }
}

/// Errors while locating the keyboard and its channels
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Keyboard {vid:04x}:{pid:04x} not found on the HID bus (interface {interface})")]
    HidInterfaceNotFound { vid: u16, pid: u16, interface: i32 },

    #[error("Keyboard {vid:04x}:{pid:04x} not found on the USB bus")]
    UsbDeviceNotFound { vid: u16, pid: u16 },

    #[error("Unexpected USB topology: {0}")]
    Topology(String),

    #[error("Failed to open device: {0}")]
    Open(#[from] TransportError),
}

/// An inbound or outbound frame did not match the known protocol.
///
/// These are always bugs in our understanding of the protocol, never transient
/// conditions. The raw bytes are kept so the report can be diagnosed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub code: u16,
    pub raw: Vec<u8>,
}

impl ProtocolError {
    pub fn new(code: u16, raw: &[u8]) -> Self {
        Self {
            code,
            raw: raw.to_vec(),
        }
    }

    /// Raw bytes as a contiguous lowercase hex string
    pub fn raw_hex(&self) -> String {
        self.raw.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unexpected keyboard response. Please report what you did when this happened, \
             including the following information.\n\nError code: {}\nContext: {}",
            self.code,
            self.raw_hex()
        )
    }
}

impl std::error::Error for ProtocolError {}

/// Errors from one command/response exchange
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },
}
