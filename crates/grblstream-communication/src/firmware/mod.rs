//! Controller firmware protocol support

pub mod grbl;
