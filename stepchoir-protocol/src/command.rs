//! Transport-independent commands
//!
//! Every transport decodes into these; the core applies them.

/// A decoded request for the drive bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Set the step period of a channel in scheduler ticks (0 = silent)
    SetPeriod { channel: u8, ticks: u16 },
    /// Set the pitch of a channel in Hz (0 = silent)
    SetFrequency { channel: u8, hz: u32 },
    /// Set the pitch of a channel from a MIDI note number
    SetNote { channel: u8, note: u8 },
    /// Silence everything and home all heads
    Reset,
}
