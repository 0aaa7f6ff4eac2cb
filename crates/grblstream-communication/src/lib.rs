//! # grblstream Communication
//!
//! Serial transport, GRBL response handling and the streaming engine.
//! Commands are paced by counting the bytes outstanding in the controller's
//! receive buffer; responses are read on a dedicated blocking task and
//! notifications are delivered from their own task.

pub mod communication;
pub mod firmware;
pub mod streamer;

pub use communication::{
    fallback_port_name, list_ports, BufferSide, FlowControlConfig, FlowControlTracker,
    OutstandingCommand, RealSerialPort, SerialPortInfo, SerialSettings, Transport,
};

pub use firmware::grbl::{parse_response, GrblResponse, StatusReport};
pub use streamer::{GrblStreamer, StreamSummary, StreamerConfig};
