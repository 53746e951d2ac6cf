//! Stepchoir Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the drive core is written
//! against. Chip-specific HALs implement them so the same tick and reset
//! logic runs on the RP2040 board and in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  stepchoir-core (tick scheduler, reset) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  stepchoir-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ stepchoir-hal-│       │  test doubles │
//! │    rp2040     │       │  (host only)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Step and direction outputs

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;

pub use gpio::{Level, OutputPin};
