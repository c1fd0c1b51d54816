//! Common types for transport layer

use serde::{Deserialize, Serialize};

use crate::protocol::device;

/// Where to find the keyboard and how to talk to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// HID interface number carrying acknowledgements and notifications
    pub input_interface: i32,
    /// USB interface index holding the interrupt OUT endpoint
    pub output_interface: u8,
    /// Give up waiting for an input report after this many milliseconds.
    /// Unset blocks forever.
    pub read_timeout_ms: Option<u32>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: device::VENDOR_ID,
            product_id: device::PRODUCT_ID,
            input_interface: device::INPUT_INTERFACE,
            output_interface: device::OUTPUT_INTERFACE,
            read_timeout_ms: None,
        }
    }
}

/// Device identification information for an opened session
#[derive(Debug, Clone)]
pub struct TransportDeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// HID device path of the input interface
    pub hid_path: String,
    /// Address of the interrupt OUT endpoint
    pub out_endpoint: u8,
    /// Product name if available
    pub product_name: Option<String>,
}

/// Asynchronous device notifications seen while waiting for an acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Profile changed on the keyboard (1-6)
    ProfileChanged { profile: u8 },
    /// Volume key moved
    VolumeKey { pressed: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_x50q() {
        let config = DeviceConfig::default();
        assert_eq!(config.vendor_id, 0x24F0);
        assert_eq!(config.product_id, 0x202B);
        assert_eq!(config.input_interface, 1);
        assert_eq!(config.output_interface, 2);
        assert_eq!(config.read_timeout_ms, None);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: DeviceConfig = toml::from_str("read_timeout_ms = 2000").unwrap();
        assert_eq!(config.read_timeout_ms, Some(2000));
        assert_eq!(config.vendor_id, device::VENDOR_ID);
        assert_eq!(config.output_interface, device::OUTPUT_INTERFACE);
    }
}
