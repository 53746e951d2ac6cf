//! Minimal TOML reader for drive configuration
//!
//! Handles only the subset the drive config uses. It does NOT support the
//! full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - `[drive]` and `[channel.<label>]` section headers
//! - Comments (# ...), including trailing comments
//!
//! Example:
//! ```toml
//! [drive]
//! resolution_us = 40
//! reset_step_delay_ms = 5
//!
//! [channel.fd0]
//! step_pin = "gpio2"
//! dir_pin = "!gpio3"
//! drive = "3.5"
//! ```
//!
//! Channel ids follow the order of the `[channel.*]` sections.

use heapless::String;

use super::types::{
    label_from, ChannelConfig, DriveConfig, DriveKind, PinConfig, MAX_LABEL_LEN,
};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Invalid value type or range
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
    /// Channel section without `step_pin` or `dir_pin`
    MissingPin,
    /// More channel sections than the bank supports
    TooManyChannels,
    /// Key not valid in its section
    UnknownKey,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Drive,
    Channel,
}

/// Channel section being built
struct ChannelBuilder {
    label: String<MAX_LABEL_LEN>,
    step_pin: Option<PinConfig>,
    dir_pin: Option<PinConfig>,
    enabled: bool,
    max_position: u16,
}

impl ChannelBuilder {
    fn new(label: &str) -> Self {
        Self {
            label: label_from(label),
            step_pin: None,
            dir_pin: None,
            enabled: true,
            max_position: DriveKind::ThreeAndHalf.max_position(),
        }
    }

    fn build(self) -> Result<ChannelConfig, ParseError> {
        Ok(ChannelConfig {
            label: self.label,
            step_pin: self.step_pin.ok_or(ParseError::MissingPin)?,
            dir_pin: self.dir_pin.ok_or(ParseError::MissingPin)?,
            enabled: self.enabled,
            max_position: self.max_position,
        })
    }
}

/// Parse TOML configuration into DriveConfig
pub fn parse_config(input: &str) -> Result<DriveConfig, ParseError> {
    let mut config = DriveConfig::new();
    let mut section = Section::Root;
    let mut current: Option<ChannelBuilder> = None;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            save_channel(&mut config, &mut current)?;

            let header = line[1..line.len() - 1].trim();
            section = match header.split_once('.') {
                None if header == "drive" => Section::Drive,
                Some(("channel", label)) if !label.is_empty() => {
                    current = Some(ChannelBuilder::new(label.trim()));
                    Section::Channel
                }
                _ => return Err(ParseError::InvalidSection),
            };
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidValue)?;
        match section {
            Section::Root => apply_root(&mut config, key, value)?,
            Section::Drive => apply_drive(&mut config, key, value)?,
            Section::Channel => {
                if let Some(channel) = current.as_mut() {
                    apply_channel(channel, key, value)?;
                }
            }
        }
    }

    save_channel(&mut config, &mut current)?;

    Ok(config)
}

/// Parse a pin string from config
///
/// Supports formats:
/// - "gpio11" -> (11, false)
/// - "!gpio12" -> (12, true) (inverted/active-low)
pub fn parse_pin_string(s: &str) -> Option<(u8, bool)> {
    let s = s.trim();

    let (s, inverted) = match s.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (s, false),
    };

    let pin = s.strip_prefix("gpio")?.parse().ok()?;
    Some((pin, inverted))
}

fn save_channel(
    config: &mut DriveConfig,
    current: &mut Option<ChannelBuilder>,
) -> Result<(), ParseError> {
    if let Some(builder) = current.take() {
        let channel = builder.build()?;
        config
            .channels
            .push(channel)
            .map_err(|_| ParseError::TooManyChannels)?;
    }
    Ok(())
}

fn apply_root(config: &mut DriveConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "version" => config.version = parse_int(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_drive(config: &mut DriveConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "resolution_us" => {
            config.resolution_us = parse_int(value)?;
            if config.resolution_us == 0 {
                return Err(ParseError::InvalidValue);
            }
        }
        "reset_step_delay_ms" => config.reset_step_delay_ms = parse_int(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_channel(channel: &mut ChannelBuilder, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "step_pin" => channel.step_pin = Some(parse_pin(value)?),
        "dir_pin" => channel.dir_pin = Some(parse_pin(value)?),
        "enabled" => channel.enabled = parse_bool(value)?,
        "drive" => {
            let kind = DriveKind::from_name(parse_string(value)).ok_or(ParseError::InvalidValue)?;
            channel.max_position = kind.max_position();
        }
        "max_position" => {
            channel.max_position = parse_int(value)?;
            if channel.max_position == 0 {
                return Err(ParseError::InvalidValue);
            }
        }
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    // Remove inline comments
    let value = match value.find('#') {
        // Make sure # is not inside a string
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let (pin, inverted) = parse_pin_string(parse_string(value)).ok_or(ParseError::InvalidPin)?;
    Ok(PinConfig { pin, inverted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_CHANNELS;

    const SAMPLE: &str = r#"
# Two drives on the breadboard
version = 1

[drive]
resolution_us = 40
reset_step_delay_ms = 6   # slow mechanisms

[channel.lead]
step_pin = "gpio2"
dir_pin = "!gpio3"

[channel.bass]
step_pin = "gpio4"
dir_pin = "gpio5"
drive = "5.25"
enabled = false
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.resolution_us, 40);
        assert_eq!(config.reset_step_delay_ms, 6);
        assert_eq!(config.channels.len(), 2);

        let lead = &config.channels[0];
        assert_eq!(lead.label.as_str(), "lead");
        assert_eq!(lead.step_pin, PinConfig::new(2));
        assert_eq!(lead.dir_pin, PinConfig::inverted(3));
        assert!(lead.enabled);
        assert_eq!(lead.max_position, 158);

        let bass = &config.channels[1];
        assert_eq!(bass.max_position, 98);
        assert!(!bass.enabled);
    }

    #[test]
    fn test_parse_pin_string() {
        assert_eq!(parse_pin_string("gpio11"), Some((11, false)));
        assert_eq!(parse_pin_string("!gpio12"), Some((12, true)));
        assert_eq!(parse_pin_string(" gpio0 "), Some((0, false)));

        // Invalid
        assert_eq!(parse_pin_string("gpio300"), None);
        assert_eq!(parse_pin_string("pin11"), None);
        assert_eq!(parse_pin_string(""), None);
    }

    #[test]
    fn test_missing_pin() {
        let input = "[channel.fd0]\nstep_pin = \"gpio2\"\n";
        assert_eq!(parse_config(input), Err(ParseError::MissingPin));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("[drive]\nresolution_us = 0\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[channel.a]\nstep_pin = \"gpio2\"\ndir_pin = \"gpio3\"\nmax_position = 0\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[channel.a]\nstep_pin = \"io2\"\n"),
            Err(ParseError::InvalidPin)
        );
        assert_eq!(
            parse_config("[channel.a]\ndrive = \"8\"\n"),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn test_unknown_section_and_key() {
        assert_eq!(parse_config("[heater.dryer]\n"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("[channel.]\n"), Err(ParseError::InvalidSection));
        assert_eq!(
            parse_config("[drive]\nspeed = 3\n"),
            Err(ParseError::UnknownKey)
        );
    }

    #[test]
    fn test_too_many_channels() {
        let mut input: heapless::String<1024> = heapless::String::new();
        for i in 0..=MAX_CHANNELS {
            use core::fmt::Write;
            let _ = write!(
                input,
                "[channel.fd{}]\nstep_pin = \"gpio{}\"\ndir_pin = \"gpio{}\"\n",
                i,
                2 * i,
                2 * i + 1
            );
        }
        assert_eq!(parse_config(&input), Err(ParseError::TooManyChannels));
    }

    #[test]
    fn test_empty_input_is_empty_config() {
        let config = parse_config("# nothing here\n").unwrap();
        assert!(config.channels.is_empty());
        assert_eq!(config.resolution_us, 40);
    }
}
