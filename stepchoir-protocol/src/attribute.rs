//! Attribute text interface
//!
//! Each entry takes a short text value such as `"2, 440"` or `"reset"`.
//! Parsing is lenient about surrounding whitespace and a trailing newline,
//! which is what shell writes (`echo "0, 28" > ticks`) produce.

use core::fmt::Write;

use heapless::String;

use crate::command::Command;
use crate::packet::CONTROL_MARKER;

/// Maximum length of the rendered `info` entry
pub const INFO_LEN: usize = 24;

/// Step pin of channel 0 in the legacy pin-addressed entry
const LEGACY_FIRST_PIN: i32 = 2;

/// Highest channel id reachable through the legacy entry
const LEGACY_LAST_CHANNEL: i32 = 7;

/// Errors decoding an attribute write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttributeError {
    /// No entry with that name
    UnknownAttribute,
    /// Entry cannot be written
    ReadOnly,
    /// Text is not in the expected format
    Malformed,
    /// A number does not fit its field
    ValueOutOfRange,
    /// Legacy pin number does not address any channel
    UnmappedPin(i32),
}

/// Attribute entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attribute {
    /// `"<channel>, <ticks>"`
    Ticks,
    /// `"<channel>, <midi note>"`
    Note,
    /// `"<channel>, <hz>"`
    Freq,
    /// `"reset"`
    Ctrl,
    /// `"<pin>, <value>"`, pin-addressed like the serial stream
    Command,
    /// Read-only: `"<enabled channels>, <step rate>"`
    Info,
}

impl Attribute {
    /// All entries, in the order they are registered
    pub const ALL: [Attribute; 6] = [
        Attribute::Ticks,
        Attribute::Note,
        Attribute::Freq,
        Attribute::Ctrl,
        Attribute::Command,
        Attribute::Info,
    ];

    /// Look up an entry by its name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Entry name
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Ticks => "ticks",
            Attribute::Note => "note",
            Attribute::Freq => "freq",
            Attribute::Ctrl => "ctrl",
            Attribute::Command => "command",
            Attribute::Info => "info",
        }
    }

    /// Decode a write to this entry
    ///
    /// Returns `Ok(None)` for writes that are accepted but do nothing
    /// (reserved legacy control values).
    pub fn parse_write(self, text: &str) -> Result<Option<Command>, AttributeError> {
        match self {
            Attribute::Ticks => {
                let (channel, value) = parse_pair(text)?;
                Ok(Some(Command::SetPeriod {
                    channel: to_channel(channel)?,
                    ticks: narrow(value)?,
                }))
            }
            Attribute::Note => {
                let (channel, value) = parse_pair(text)?;
                Ok(Some(Command::SetNote {
                    channel: to_channel(channel)?,
                    note: narrow(value)?,
                }))
            }
            Attribute::Freq => {
                let (channel, value) = parse_pair(text)?;
                Ok(Some(Command::SetFrequency {
                    channel: to_channel(channel)?,
                    hz: narrow(value)?,
                }))
            }
            Attribute::Ctrl => {
                if text.trim() == "reset" {
                    Ok(Some(Command::Reset))
                } else {
                    Err(AttributeError::Malformed)
                }
            }
            Attribute::Command => parse_legacy(text),
            Attribute::Info => Err(AttributeError::ReadOnly),
        }
    }
}

/// Render the `info` entry
pub fn format_info(enabled_channels: u8, step_rate_hz: u32) -> String<INFO_LEN> {
    let mut out = String::new();
    // Two integers, a separator and a newline always fit INFO_LEN
    let _ = writeln!(out, "{}, {}", enabled_channels, step_rate_hz);
    out
}

/// Parse `"<int>, <int>"`
fn parse_pair(text: &str) -> Result<(i32, i32), AttributeError> {
    let (first, second) = text.split_once(',').ok_or(AttributeError::Malformed)?;
    let first = first.trim().parse().map_err(|_| AttributeError::Malformed)?;
    let second = second.trim().parse().map_err(|_| AttributeError::Malformed)?;
    Ok((first, second))
}

fn to_channel(value: i32) -> Result<u8, AttributeError> {
    narrow(value)
}

fn narrow<T: TryFrom<i32>>(value: i32) -> Result<T, AttributeError> {
    T::try_from(value).map_err(|_| AttributeError::ValueOutOfRange)
}

/// Legacy `"<pin>, <value>"` entry
///
/// Pin 100 is the control marker: value 0 or anything above 4 resets,
/// values 1-4 are reserved. Other pins map to channel `(pin - 2) / 2`,
/// truncated toward zero, so pin 1 lands on channel 0 too.
fn parse_legacy(text: &str) -> Result<Option<Command>, AttributeError> {
    let (pin, value) = parse_pair(text)?;

    if pin == i32::from(CONTROL_MARKER) {
        return if value == 0 || value > 4 {
            Ok(Some(Command::Reset))
        } else {
            Ok(None)
        };
    }

    let channel = pin.saturating_sub(LEGACY_FIRST_PIN) / 2;
    if !(0..=LEGACY_LAST_CHANNEL).contains(&channel) {
        return Err(AttributeError::UnmappedPin(pin));
    }

    Ok(Some(Command::SetPeriod {
        channel: to_channel(channel)?,
        ticks: narrow(value)?,
    }))
}
