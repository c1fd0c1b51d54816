//! Device discovery for the X50Q keyboard
//!
//! The keyboard shows up twice: as a HID device whose interface 1 delivers
//! acknowledgements, and as a raw USB device whose third interface has the
//! interrupt OUT endpoint commands are written to.

use hidapi::HidApi;
use nusb::transfer::{Direction, EndpointType};
use tracing::{debug, info};

use crate::error::{DiscoveryError, TransportError};
use crate::hid_input::HidInput;
use crate::protocol::device;
use crate::types::{DeviceConfig, TransportDeviceInfo};
use crate::usb_output::UsbOutput;

/// Endpoint descriptor fields relevant for discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointShape {
    pub address: u8,
    pub is_out: bool,
    pub is_interrupt: bool,
    pub max_packet_size: usize,
}

/// Interface descriptor fields relevant for discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceShape {
    pub number: u8,
    /// Endpoints of each alternate setting
    pub alt_settings: Vec<Vec<EndpointShape>>,
}

/// Locate the OUT endpoint on the interface at position `index`
///
/// The active configuration must have exactly three interfaces, and the
/// chosen one a single alternate setting with a single 64-byte interrupt OUT
/// endpoint.
///
/// # Returns
/// `(interface_number, endpoint_address)`
pub fn find_output_endpoint(
    interfaces: &[InterfaceShape],
    index: u8,
) -> Result<(u8, u8), DiscoveryError> {
    if interfaces.len() != device::INTERFACE_COUNT {
        return Err(DiscoveryError::Topology(format!(
            "expected {} interfaces, found {}",
            device::INTERFACE_COUNT,
            interfaces.len()
        )));
    }
    let iface = interfaces.get(index as usize).ok_or_else(|| {
        DiscoveryError::Topology(format!("no interface at index {index}"))
    })?;
    let [alt] = iface.alt_settings.as_slice() else {
        return Err(DiscoveryError::Topology(format!(
            "interface {} has {} alternate settings, expected 1",
            iface.number,
            iface.alt_settings.len()
        )));
    };
    let [ep] = alt.as_slice() else {
        return Err(DiscoveryError::Topology(format!(
            "interface {} has {} endpoints, expected 1",
            iface.number,
            alt.len()
        )));
    };
    if !ep.is_interrupt || !ep.is_out {
        return Err(DiscoveryError::Topology(format!(
            "endpoint 0x{:02X} is not an interrupt OUT endpoint",
            ep.address
        )));
    }
    if ep.max_packet_size != device::OUTPUT_MAX_PACKET_SIZE {
        return Err(DiscoveryError::Topology(format!(
            "endpoint 0x{:02X} has max packet size {}, expected {}",
            ep.address,
            ep.max_packet_size,
            device::OUTPUT_MAX_PACKET_SIZE
        )));
    }
    Ok((iface.number, ep.address))
}

fn describe_configuration(config: &nusb::descriptors::Configuration<'_>) -> Vec<InterfaceShape> {
    config
        .interfaces()
        .map(|group| InterfaceShape {
            number: group.interface_number(),
            alt_settings: group
                .alt_settings()
                .map(|alt| {
                    alt.endpoints()
                        .map(|ep| EndpointShape {
                            address: ep.address(),
                            is_out: ep.direction() == Direction::Out,
                            is_interrupt: ep.transfer_type() == EndpointType::Interrupt,
                            max_packet_size: ep.max_packet_size(),
                        })
                        .collect()
                })
                .collect(),
        })
        .collect()
}

fn open_hid_input(config: &DeviceConfig) -> Result<(HidInput, String, Option<String>), DiscoveryError> {
    let api = HidApi::new().map_err(TransportError::from)?;
    let device_info = api
        .device_list()
        .find(|d| {
            d.vendor_id() == config.vendor_id
                && d.product_id() == config.product_id
                && d.interface_number() == config.input_interface
        })
        .ok_or(DiscoveryError::HidInterfaceNotFound {
            vid: config.vendor_id,
            pid: config.product_id,
            interface: config.input_interface,
        })?;

    let path = device_info.path().to_string_lossy().to_string();
    let product_name = device_info.product_string().map(|s| s.to_string());
    debug!("Opening HID input interface: {}", path);

    let device = device_info
        .open_device(&api)
        .map_err(TransportError::from)?;
    Ok((
        HidInput::new(device, config.read_timeout_ms),
        path,
        product_name,
    ))
}

fn open_usb_output(config: &DeviceConfig) -> Result<UsbOutput, DiscoveryError> {
    let device_info = nusb::list_devices()
        .map_err(TransportError::from)?
        .find(|d| d.vendor_id() == config.vendor_id && d.product_id() == config.product_id)
        .ok_or(DiscoveryError::UsbDeviceNotFound {
            vid: config.vendor_id,
            pid: config.product_id,
        })?;

    let usb_device = device_info.open().map_err(TransportError::from)?;
    let interfaces = {
        let active = usb_device
            .active_configuration()
            .map_err(|e| DiscoveryError::Topology(e.to_string()))?;
        describe_configuration(&active)
    };
    let (interface_number, endpoint) = find_output_endpoint(&interfaces, config.output_interface)?;
    debug!(
        "Output endpoint 0x{:02X} on interface {}",
        endpoint, interface_number
    );

    let interface = usb_device
        .detach_and_claim_interface(interface_number)
        .map_err(TransportError::from)?;
    Ok(UsbOutput::new(interface, endpoint))
}

/// Open both channels of the configured keyboard
pub fn open_device(
    config: &DeviceConfig,
) -> Result<(UsbOutput, HidInput, TransportDeviceInfo), DiscoveryError> {
    let (input, hid_path, product_name) = open_hid_input(config)?;
    let output = open_usb_output(config)?;

    info!(
        "Connected to {:04x}:{:04x} ({})",
        config.vendor_id,
        config.product_id,
        product_name.as_deref().unwrap_or("unknown product")
    );
    let info = TransportDeviceInfo {
        vid: config.vendor_id,
        pid: config.product_id,
        hid_path,
        out_endpoint: output.endpoint(),
        product_name,
    };
    Ok((output, input, info))
}
