//! Serial port link
//!
//! Port enumeration and the production [`LinkOpener`] built on the
//! `serialport` crate. Ports are opened 8N1 without flow control; the
//! configured read timeout bounds every blocking read.

use super::{ConnectionParams, LinkOpener, ReadWrite};
use gcodelink_core::{ConnectionError, Result};
use serde::{Deserialize, Serialize};
use std::io;

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// Serial number if available
    pub serial_number: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,

    /// Whether the name matches a USB/ACM adapter a printer board would use
    pub likely_device: bool,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        let port_name = port_name.into();
        Self {
            likely_device: is_device_port(&port_name),
            port_name,
            description: description.into(),
            manufacturer: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set serial number
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

/// List available serial ports on the system
///
/// Every port the OS reports is returned; ports that look like a USB or ACM
/// adapter are sorted first and flagged with `likely_device`.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        ConnectionError::IoError {
            reason: format!("Failed to enumerate ports: {}", e),
        }
    })?;

    let mut infos: Vec<SerialPortInfo> = ports
        .iter()
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, port_description(port));
            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    let mut info = info.with_usb_ids(usb.vid, usb.pid);
                    if let Some(ref mfg) = usb.manufacturer {
                        info = info.with_manufacturer(mfg);
                    }
                    if let Some(ref serial) = usb.serial_number {
                        info = info.with_serial_number(serial);
                    }
                    info
                }
                _ => info,
            }
        })
        .collect();

    infos.sort_by(|a, b| {
        b.likely_device
            .cmp(&a.likely_device)
            .then_with(|| a.port_name.cmp(&b.port_name))
    });
    tracing::debug!("Found {} serial ports", infos.len());
    Ok(infos)
}

/// Check if a port name matches the adapters printer boards enumerate as
///
/// - Windows: COM* (COM1, COM2, etc.)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
fn is_device_port(port_name: &str) -> bool {
    if let Some(num) = port_name.strip_prefix("COM") {
        return !num.is_empty() && num.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial-")
        || port_name.starts_with("/dev/cu.usbmodem")
}

fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "USB {} {}",
            usb.manufacturer.as_deref().unwrap_or("Device"),
            usb.product.as_deref().unwrap_or("Serial Port")
        ),
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Opens real serial ports through the `serialport` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialLinkOpener;

impl LinkOpener for SerialLinkOpener {
    fn open(&self, params: &ConnectionParams) -> std::result::Result<Box<dyn ReadWrite>, ConnectionError> {
        let port = serialport::new(&params.port, params.baud_rate)
            .timeout(params.timeout())
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open_native()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                map_open_error(&params.port, params.baud_rate, e)
            })?;

        Ok(Box::new(port))
    }
}

fn map_open_error(port: &str, baud: u32, err: serialport::Error) -> ConnectionError {
    match err.kind() {
        serialport::ErrorKind::NoDevice
        | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => ConnectionError::PortNotFound {
            port: port.to_string(),
        },
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied)
        | serialport::ErrorKind::Io(io::ErrorKind::ResourceBusy) => ConnectionError::PortInUse {
            port: port.to_string(),
        },
        serialport::ErrorKind::InvalidInput if err.description.to_lowercase().contains("baud") => {
            ConnectionError::UnsupportedBaudRate { baud }
        }
        serialport::ErrorKind::InvalidInput => ConnectionError::InvalidParameters {
            reason: err.description,
        },
        _ => ConnectionError::FailedToOpen {
            port: port.to_string(),
            reason: err.description,
        },
    }
}
