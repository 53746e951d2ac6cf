//! Configuration types
//!
//! Board-agnostic drive configuration, built from a TOML file or one of
//! the built-in wiring layouts.

pub mod parse;
pub mod types;

pub use parse::{parse_config, parse_pin_string, ParseError};
pub use types::*;
