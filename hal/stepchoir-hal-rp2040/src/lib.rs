//! RP2040-specific HAL for the floppy drive firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `stepchoir-hal` traits, plus RP2040-specific functionality:
//!
//! - GPIO outputs with active-low inversion
//! - Dynamic pin allocation for config-driven setup

#![no_std]

pub mod gpio;
pub mod pins;

pub use gpio::{GpioOutput, GPIO_COUNT};
pub use pins::{PinBank, PinError, RemainingPeripherals, SERIAL_RX_PIN, SERIAL_TX_PIN};
