//! Stepchoir command transports
//!
//! Two ways of talking to a drive bank are supported, both decoding into
//! the same [`Command`] type:
//!
//! # Serial byte stream
//!
//! Fixed three-byte packets, addressed by step pin number:
//! ```text
//! ┌──────────┬─────────────┬────────────┐
//! │ PIN      │ PERIOD_HIGH │ PERIOD_LOW │
//! │ 1B       │ 1B          │ 1B         │
//! └──────────┴─────────────┴────────────┘
//! ```
//! A packet whose first byte is [`CONTROL_MARKER`] carries an opcode in
//! its second byte instead. Opcodes `1..=4` are reserved; anything else
//! resets the bank and drops the rest of the read burst.
//!
//! # Attribute text
//!
//! Write-only entries `ticks`, `note`, `freq`, `ctrl`, the legacy
//! pin-addressed `command` entry, and the read-only `info` entry.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod attribute;
pub mod command;
pub mod packet;

pub use attribute::{format_info, Attribute, AttributeError, INFO_LEN};
pub use command::Command;
pub use packet::{
    channel_from_pin, ControlOpcode, Packet, PacketDecoder, PacketError, CONTROL_MARKER,
    PACKET_LEN,
};
