//! Drive configuration loading
//!
//! drives.toml is embedded at build time (and validated by build.rs).
//! If it still fails to parse on target, the classic eight-drive layout
//! on pins 2-17 is used instead.

use defmt::*;

use stepchoir_core::config::{parse_config, DriveConfig};

/// Embedded drive configuration (compiled into firmware)
/// Edit drives.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../drives.toml");

/// Parse the embedded configuration
pub fn load_config() -> DriveConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Loaded {} channels from drives.toml", config.channels.len());
            config
        }
        Err(e) => {
            warn!("drives.toml invalid ({:?}), using default layout", e);
            DriveConfig::arduino_layout()
        }
    }
}
