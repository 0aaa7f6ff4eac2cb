//! Transport and buffer accounting

pub mod flow_control;
pub mod serial;

pub use flow_control::{FlowControlConfig, FlowControlTracker, OutstandingCommand};
pub use serial::{
    fallback_port_name, list_ports, BufferSide, RealSerialPort, SerialPortInfo, SerialSettings,
    Transport,
};
