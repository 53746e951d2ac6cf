//! Dynamic pin allocation for config-driven hardware setup
//!
//! Provides a way to get GPIO pins by number at runtime, so drive wiring
//! comes from `drives.toml` rather than being hardcoded.
//!
//! GPIO0/GPIO1 carry the UART0 command stream and are handed out through
//! [`RemainingPeripherals`] instead of the bank.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals::{PIN_0, PIN_1, UART0};
use embassy_rp::{Peri, Peripherals};

use crate::gpio::{GpioOutput, GPIO_COUNT};

/// UART0 TX pin
pub const SERIAL_TX_PIN: u8 = 0;

/// UART0 RX pin
pub const SERIAL_RX_PIN: u8 = 1;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin reserved for special function
    Reserved,
}

/// Pin bank that holds the free GPIO pins and allows taking them by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

/// Non-GPIO peripherals (and the serial pins) left after creating a PinBank
pub struct RemainingPeripherals {
    pub uart0: Peri<'static, UART0>,
    pub uart0_tx: Peri<'static, PIN_0>,
    pub uart0_rx: Peri<'static, PIN_1>,
}

impl PinBank {
    /// Split embassy peripherals into a pin bank and everything else
    pub fn from_peripherals(p: Peripherals) -> (Self, RemainingPeripherals) {
        let bank = Self {
            pins: [
                None,
                None,
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        };
        let remaining = RemainingPeripherals {
            uart0: p.UART0,
            uart0_tx: p.PIN_0,
            uart0_rx: p.PIN_1,
        };
        (bank, remaining)
    }

    /// Take a pin by number
    ///
    /// Returns the pin if available, or an error if:
    /// - Pin number is invalid (>= 30)
    /// - Pin is one of the serial pins
    /// - Pin was already taken
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if usize::from(pin_num) >= GPIO_COUNT {
            return Err(PinError::InvalidPin);
        }
        if pin_num == SERIAL_TX_PIN || pin_num == SERIAL_RX_PIN {
            return Err(PinError::Reserved);
        }
        self.pins[usize::from(pin_num)]
            .take()
            .ok_or(PinError::AlreadyTaken)
    }

    /// Take a pin and configure it as a logically-low output
    pub fn output(&mut self, pin_num: u8, inverted: bool) -> Result<GpioOutput, PinError> {
        Ok(GpioOutput::new(self.take(pin_num)?, inverted))
    }
}
