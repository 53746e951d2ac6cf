//! Configuration type definitions
//!
//! These types describe how drives are wired and timed. Channel ids are
//! positions in [`DriveConfig::channels`]; physical pin numbers live in
//! the channel entry.

use core::fmt::Write;

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum channels (drives) per config
pub const MAX_CHANNELS: usize = 8;

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 8;

/// Default scheduler tick interval in microseconds
pub const DEFAULT_RESOLUTION_US: u32 = 40;

/// Default pause between reset pulses in milliseconds
pub const DEFAULT_RESET_STEP_DELAY_MS: u32 = 5;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// Drive mechanism, which determines head travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DriveKind {
    /// 3.5" drive, 80 tracks
    #[default]
    ThreeAndHalf,
    /// 5.25" drive, 50 tracks
    FiveAndQuarter,
}

impl DriveKind {
    /// Travel bound in half-steps (two step edges per track)
    pub const fn max_position(self) -> u16 {
        match self {
            DriveKind::ThreeAndHalf => 158,
            DriveKind::FiveAndQuarter => 98,
        }
    }

    /// Parse the config spelling (`"3.5"` or `"5.25"`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "3.5" => Some(DriveKind::ThreeAndHalf),
            "5.25" => Some(DriveKind::FiveAndQuarter),
            _ => None,
        }
    }
}

/// One drive: its pins and travel bound
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelConfig {
    /// Channel name (e.g., "fd0")
    pub label: String<MAX_LABEL_LEN>,
    /// Step pulse pin
    pub step_pin: PinConfig,
    /// Direction pin (high = toward track 0)
    pub dir_pin: PinConfig,
    /// Channel takes part in ticking and reset
    pub enabled: bool,
    /// Travel bound in half-steps
    pub max_position: u16,
}

impl ChannelConfig {
    /// An enabled 3.5" drive on the given pins
    ///
    /// Labels longer than [`MAX_LABEL_LEN`] are truncated.
    pub fn new(label: &str, step_pin: u8, dir_pin: u8) -> Self {
        Self {
            label: label_from(label),
            step_pin: PinConfig::new(step_pin),
            dir_pin: PinConfig::new(dir_pin),
            enabled: true,
            max_position: DriveKind::ThreeAndHalf.max_position(),
        }
    }

    /// Use the travel bound of a drive kind
    pub fn with_kind(mut self, kind: DriveKind) -> Self {
        self.max_position = kind.max_position();
        self
    }
}

/// Complete drive bank configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriveConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    /// Tick interval in microseconds
    pub resolution_us: u32,
    /// Pause between reset pulses in milliseconds
    pub reset_step_delay_ms: u32,
    /// Channels, indexed by channel id
    pub channels: Vec<ChannelConfig, MAX_CHANNELS>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveConfig {
    /// Empty configuration with default timing
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            resolution_us: DEFAULT_RESOLUTION_US,
            reset_step_delay_ms: DEFAULT_RESET_STEP_DELAY_MS,
            channels: Vec::new(),
        }
    }

    /// Eight drives with step/direction on pins 2/3, 4/5 ... 16/17
    pub fn arduino_layout() -> Self {
        let mut config = Self::new();
        for (id, step_pin) in (2u8..=16).step_by(2).enumerate() {
            let mut channel = ChannelConfig::new("", step_pin, step_pin + 1);
            let _ = write!(channel.label, "fd{}", id);
            // Exactly MAX_CHANNELS entries
            let _ = config.channels.push(channel);
        }
        config
    }

    /// Four drives on a Raspberry Pi header (step/dir 17/18, 27/22, 23/24, 25/4)
    pub fn pi_header_layout() -> Self {
        let mut config = Self::new();
        for (label, step_pin, dir_pin) in [
            ("fd0", 17, 18),
            ("fd1", 27, 22),
            ("fd2", 23, 24),
            ("fd3", 25, 4),
        ] {
            let _ = config.channels.push(ChannelConfig::new(label, step_pin, dir_pin));
        }
        config
    }

    /// Step rate constant: steps per second at a period of one tick
    ///
    /// One audible cycle takes two steps (rising and falling step edge),
    /// so a tone of `f` Hz needs a period of `step_rate_hz() / f` ticks.
    pub fn step_rate_hz(&self) -> u32 {
        step_rate_hz(self.resolution_us)
    }

    /// Find a channel by label
    pub fn find_channel(&self, label: &str) -> Option<(u8, &ChannelConfig)> {
        self.channels
            .iter()
            .enumerate()
            .find(|(_, c)| c.label.as_str() == label)
            .map(|(id, c)| (id as u8, c))
    }
}

/// Step rate constant for a tick interval
pub fn step_rate_hz(resolution_us: u32) -> u32 {
    1_000_000 / resolution_us.max(1).saturating_mul(2)
}

/// Build a label, truncating to [`MAX_LABEL_LEN`]
pub(crate) fn label_from(text: &str) -> String<MAX_LABEL_LEN> {
    let mut label = String::new();
    for c in text.chars() {
        if label.push(c).is_err() {
            break;
        }
    }
    label
}
