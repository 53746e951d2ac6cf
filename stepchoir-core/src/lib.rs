//! Board-agnostic core logic for the floppy drive orchestra
//!
//! This crate contains everything that does not depend on a specific
//! chip:
//!
//! - Drive and channel configuration (plus a small TOML reader)
//! - Channel registry shared between the command and tick contexts
//! - Per-channel step state machine (bounce between travel limits)
//! - Tick scheduler and the blocking home/reset sequence
//! - Pitch helpers (Hz and MIDI note to period)
//! - Command interface applying decoded transport commands

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod channel;
pub mod command;
pub mod config;
pub mod pitch;
pub mod registry;
pub mod scheduler;

pub use channel::{ChannelMotion, Direction, StepSignal};
pub use pitch::{EqualTemperament, NoteTable};
pub use command::{CommandError, CommandPort, DriveInfo};
pub use registry::{Channel, Registry};
pub use scheduler::{ChannelOutputs, Drive};
