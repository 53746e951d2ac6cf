//! Command interface
//!
//! [`CommandPort`] applies decoded transport commands to the shared
//! registry. It never touches pins: period changes are atomic stores and a
//! reset only silences the bank and raises the request flag that
//! [`Drive::service_reset`](crate::Drive::service_reset) acts on.

use heapless::String;
use stepchoir_protocol::{format_info, Attribute, AttributeError, Command, INFO_LEN};

use crate::pitch::{period_for_frequency, NoteTable};
use crate::registry::Registry;

/// Why a command was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// No channel with this id
    UnknownChannel(u8),
    /// Channel exists but is disabled
    ChannelDisabled(u8),
    /// Note has no entry in the note table
    NoteOutOfRange(u8),
    /// Attribute text could not be decoded
    Attribute(AttributeError),
}

impl From<AttributeError> for CommandError {
    fn from(e: AttributeError) -> Self {
        CommandError::Attribute(e)
    }
}

/// Answer to an info query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveInfo {
    /// Channels taking part in ticking
    pub enabled_channels: u8,
    /// Steps per second at a period of one tick
    pub step_rate_hz: u32,
}

/// Command entry point for transports
pub struct CommandPort<'a, T> {
    registry: &'a Registry,
    notes: T,
}

impl<'a, T: NoteTable> CommandPort<'a, T> {
    pub fn new(registry: &'a Registry, notes: T) -> Self {
        Self { registry, notes }
    }

    /// Set a channel's period in ticks (0 silences it)
    pub fn set_period(&self, channel: u8, ticks: u16) -> Result<(), CommandError> {
        self.registry.set_period(channel, ticks)
    }

    /// Set a channel's pitch in Hz (0 silences it)
    pub fn set_frequency(&self, channel: u8, hz: u32) -> Result<(), CommandError> {
        let ticks = period_for_frequency(self.registry.step_rate_hz(), hz);
        self.registry.set_period(channel, ticks)
    }

    /// Set a channel's pitch from a MIDI note number
    pub fn set_note(&self, channel: u8, note: u8) -> Result<(), CommandError> {
        let ticks = self
            .notes
            .period(note)
            .ok_or(CommandError::NoteOutOfRange(note))?;
        self.registry.set_period(channel, ticks)
    }

    /// Silence every channel and request a homing run
    pub fn trigger_reset(&self) {
        self.registry.request_reset();
    }

    /// Enabled channel count and step rate
    pub fn query_info(&self) -> DriveInfo {
        DriveInfo {
            enabled_channels: self.registry.enabled_count(),
            step_rate_hz: self.registry.step_rate_hz(),
        }
    }

    /// Apply a decoded command
    pub fn dispatch(&self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::SetPeriod { channel, ticks } => self.set_period(channel, ticks),
            Command::SetFrequency { channel, hz } => self.set_frequency(channel, hz),
            Command::SetNote { channel, note } => self.set_note(channel, note),
            Command::Reset => {
                self.trigger_reset();
                Ok(())
            }
        }
    }

    /// Handle a write to a named attribute entry
    pub fn write_attribute(&self, attribute: Attribute, text: &str) -> Result<(), CommandError> {
        match attribute.parse_write(text)? {
            Some(command) => self.dispatch(command),
            None => Ok(()),
        }
    }

    /// Render the read-only `info` entry
    pub fn read_info(&self) -> String<INFO_LEN> {
        let info = self.query_info();
        format_info(info.enabled_channels, info.step_rate_hz)
    }
}
