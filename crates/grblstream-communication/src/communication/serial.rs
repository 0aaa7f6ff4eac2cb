//! Serial port transport
//!
//! Provides the byte-level link to the controller:
//! - The [`Transport`] abstraction used by the streaming engine
//! - A [`RealSerialPort`] backed by the `serialport` crate (8N1, no flow control)
//! - Port enumeration and the numbered-port fallback used when opening

use grblstream_core::{ConnectionError, Error, Result};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Which side of the transport buffers to discard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSide {
    /// Bytes received but not yet read
    Input,
    /// Bytes written but not yet transmitted
    Output,
    /// Both directions
    All,
}

impl From<BufferSide> for serialport::ClearBuffer {
    fn from(side: BufferSide) -> Self {
        match side {
            BufferSide::Input => serialport::ClearBuffer::Input,
            BufferSide::Output => serialport::ClearBuffer::Output,
            BufferSide::All => serialport::ClearBuffer::All,
        }
    }
}

/// Byte stream to a controller
///
/// Reads are expected to return within the configured timeout, reporting
/// [`io::ErrorKind::TimedOut`] when nothing arrived. A cloned handle must
/// read and write the same link independently of the original.
pub trait Transport: Send {
    /// Write every byte of `data`
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read available bytes into `buf`
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Discard buffered bytes
    fn clear(&mut self, which: BufferSide) -> io::Result<()>;

    /// Set the read/write timeout of this handle
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Open a second handle onto the same link
    fn try_clone(&self) -> io::Result<Box<dyn Transport>>;

    /// Human readable name of the link
    fn name(&self) -> String;
}

/// Parameters for opening a serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Timeout applied to the write handle
    pub timeout: Duration,
    /// Assert DTR after opening
    pub dtr: bool,
    /// Assert RTS after opening
    pub rts: bool,
}

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor and product IDs if applicable
    pub usb_ids: Option<(u16, u16)>,
}

/// List serial ports that look like CNC controllers
///
/// Windows `COM*`, Linux `/dev/ttyUSB*` and `/dev/ttyACM*`, macOS
/// `/dev/cu.usbserial-*` and `/dev/cu.usbmodem*`.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        Error::other(format!("Failed to enumerate ports: {}", e))
    })?;

    Ok(ports
        .iter()
        .filter(|port| is_valid_cnc_port(&port.port_name))
        .map(|port| {
            let (manufacturer, usb_ids) = match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    (usb.manufacturer.clone(), Some((usb.vid, usb.pid)))
                }
                _ => (None, None),
            };
            SerialPortInfo {
                port_name: port.port_name.clone(),
                description: port_description(port),
                manufacturer,
                usb_ids,
            }
        })
        .collect())
}

fn is_valid_cnc_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
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

/// Alternate name tried when a numbered port fails to open
///
/// Device numbering often shifts by one digit when a board re-enumerates
/// (`/dev/ttyUSB10` vs `/dev/ttyUSB1`). Names longer than four characters
/// ending in two ASCII digits fall back to the name without the last one.
pub fn fallback_port_name(port: &str) -> Option<String> {
    if port.chars().count() <= 4 {
        return None;
    }
    let bytes = port.as_bytes();
    if bytes[bytes.len() - 2..].iter().all(u8::is_ascii_digit) {
        Some(port[..port.len() - 1].to_string())
    } else {
        None
    }
}

/// Serial port backed by the `serialport` crate
pub struct RealSerialPort {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl RealSerialPort {
    /// Open a port at 8 data bits, no parity, one stop bit, no flow control
    pub fn open(settings: &SerialSettings) -> std::result::Result<Self, ConnectionError> {
        let mut port = serialport::new(&settings.port, settings.baud_rate)
            .timeout(settings.timeout)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| ConnectionError::FailedToOpen {
                port: settings.port.clone(),
                reason: e.to_string(),
            })?;

        port.write_data_terminal_ready(settings.dtr)
            .and_then(|_| port.write_request_to_send(settings.rts))
            .map_err(|e| ConnectionError::SerialError {
                reason: format!("Failed to set modem lines on {}: {}", settings.port, e),
            })?;

        Ok(Self {
            port,
            name: settings.port.clone(),
        })
    }

    /// Open a port, retrying once under its fallback name
    pub fn open_with_fallback(
        settings: &SerialSettings,
    ) -> std::result::Result<Self, ConnectionError> {
        match Self::open(settings) {
            Ok(port) => Ok(port),
            Err(first) => {
                let Some(alternate) = fallback_port_name(&settings.port) else {
                    tracing::warn!("Failed to open serial port {}: {}", settings.port, first);
                    return Err(first);
                };
                tracing::warn!(
                    "Failed to open serial port {} ({}), trying {}",
                    settings.port,
                    first,
                    alternate
                );
                let retry = SerialSettings {
                    port: alternate,
                    ..settings.clone()
                };
                Self::open(&retry)
            }
        }
    }
}

impl Transport for RealSerialPort {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.port, data)?;
        self.port.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(&mut self.port, buf)
    }

    fn clear(&mut self, which: BufferSide) -> io::Result<()> {
        self.port.clear(which.into()).map_err(io::Error::from)
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port.set_timeout(timeout).map_err(io::Error::from)
    }

    fn try_clone(&self) -> io::Result<Box<dyn Transport>> {
        let port = self.port.try_clone().map_err(io::Error::from)?;
        Ok(Box::new(RealSerialPort {
            port,
            name: self.name.clone(),
        }))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
