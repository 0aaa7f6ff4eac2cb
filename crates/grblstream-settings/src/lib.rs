//! grblstream Settings Crate
//!
//! Loads and saves the streamer configuration as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{default_config_path, Config};
pub use error::{SettingsError, SettingsResult};
