//! Serial byte-stream packets
//!
//! Packet format:
//! - PIN (1 byte): step pin number of the addressed drive, or [`CONTROL_MARKER`]
//! - PERIOD_HIGH (1 byte): high byte of the period in ticks
//! - PERIOD_LOW (1 byte): low byte of the period in ticks
//!
//! Drives are wired as step/direction pairs starting at pin 2, so step
//! pins are the even numbers `2..=16` and channel `n` steps on pin `2 + 2n`.

use heapless::Vec;

use crate::command::Command;

/// Bytes per packet
pub const PACKET_LEN: usize = 3;

/// First byte of a control packet
pub const CONTROL_MARKER: u8 = 100;

/// Step pin of channel 0
pub const FIRST_STEP_PIN: u8 = 2;

/// Step pin of the last addressable channel
pub const LAST_STEP_PIN: u8 = 16;

/// Map a step pin number to a channel id
///
/// Odd pins are direction lines and never address a channel.
pub fn channel_from_pin(pin: u8) -> Option<u8> {
    if !(FIRST_STEP_PIN..=LAST_STEP_PIN).contains(&pin) || pin % 2 != 0 {
        return None;
    }
    Some((pin - FIRST_STEP_PIN) / 2)
}

/// Errors converting a packet into a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Pin byte does not address any channel
    UnmappedPin(u8),
}

/// Opcode carried by a control packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlOpcode(pub u8);

impl ControlOpcode {
    /// Opcode sent by clients to request a reset
    pub const RESET: ControlOpcode = ControlOpcode(0);

    /// Opcodes 1-4 are reserved and do nothing
    pub fn is_reserved(self) -> bool {
        matches!(self.0, 1..=4)
    }

    /// Every non-reserved opcode resets the bank
    pub fn is_reset(self) -> bool {
        !self.is_reserved()
    }
}

/// A decoded packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Packet {
    /// Set the period of the drive stepping on `pin`
    SetPeriod { pin: u8, period: u16 },
    /// Control packet
    Control(ControlOpcode),
}

impl Packet {
    /// Encode this packet for transmission
    ///
    /// The unused third byte of a control packet is sent as zero.
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        match *self {
            Packet::SetPeriod { pin, period } => {
                let [high, low] = period.to_be_bytes();
                [pin, high, low]
            }
            Packet::Control(ControlOpcode(op)) => [CONTROL_MARKER, op, 0],
        }
    }

    /// Convert into a command
    ///
    /// Returns `Ok(None)` for reserved control opcodes.
    pub fn to_command(&self) -> Result<Option<Command>, PacketError> {
        match *self {
            Packet::SetPeriod { pin, period } => {
                let channel = channel_from_pin(pin).ok_or(PacketError::UnmappedPin(pin))?;
                Ok(Some(Command::SetPeriod {
                    channel,
                    ticks: period,
                }))
            }
            Packet::Control(op) if op.is_reserved() => Ok(None),
            Packet::Control(_) => Ok(Some(Command::Reset)),
        }
    }
}

/// Incremental packet decoder
///
/// Bytes are fed as they arrive. The transport calls [`end_burst`] once
/// it has drained everything currently buffered; after a control packet
/// the decoder ignores the remainder of that burst. Once a reset has run,
/// the transport flushes whatever arrived meanwhile and calls [`reset`],
/// so framing restarts on the next byte.
///
/// [`end_burst`]: PacketDecoder::end_burst
/// [`reset`]: PacketDecoder::reset
#[derive(Debug, Clone, Default)]
pub struct PacketDecoder {
    buffer: Vec<u8, PACKET_LEN>,
    discarding: bool,
}

impl PacketDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            discarding: false,
        }
    }

    /// Drop any partial packet and stop discarding
    ///
    /// The next byte fed is taken as the first byte of a packet.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Number of bytes of a partial packet held
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the rest of the current burst is being dropped
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Feed a single byte to the decoder
    ///
    /// Returns `Some(packet)` when a complete packet has been received.
    pub fn feed(&mut self, byte: u8) -> Option<Packet> {
        if self.discarding {
            return None;
        }

        // Capacity is PACKET_LEN and the buffer is cleared on completion
        let _ = self.buffer.push(byte);
        if self.buffer.len() < PACKET_LEN {
            return None;
        }

        let packet = if self.buffer[0] == CONTROL_MARKER {
            self.discarding = true;
            Packet::Control(ControlOpcode(self.buffer[1]))
        } else {
            Packet::SetPeriod {
                pin: self.buffer[0],
                period: u16::from_be_bytes([self.buffer[1], self.buffer[2]]),
            }
        };
        self.buffer.clear();
        Some(packet)
    }

    /// Mark the end of a read burst
    ///
    /// Partial packets are kept; they complete with the next burst.
    pub fn end_burst(&mut self) {
        self.discarding = false;
    }

    /// Feed a whole burst, calling `on_packet` for each decoded packet
    pub fn feed_burst(&mut self, bytes: &[u8], mut on_packet: impl FnMut(Packet)) {
        for &byte in bytes {
            if let Some(packet) = self.feed(byte) {
                on_packet(packet);
            }
        }
        self.end_burst();
    }
}
