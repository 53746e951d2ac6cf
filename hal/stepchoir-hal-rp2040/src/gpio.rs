//! GPIO outputs
//!
//! Wraps an embassy output so the core can drive it through
//! [`stepchoir_hal::OutputPin`]. Inversion is applied here: the core
//! always works in logical levels.

use embassy_rp::gpio::{AnyPin, Level as RpLevel, Output};
use embassy_rp::Peri;
use stepchoir_hal::OutputPin;

/// Number of GPIO pins on RP2040
pub const GPIO_COUNT: usize = 30;

/// Push-pull output with optional active-low inversion
pub struct GpioOutput {
    output: Output<'static>,
    inverted: bool,
}

impl GpioOutput {
    /// Configure `pin` as an output, logically low
    pub fn new(pin: Peri<'static, AnyPin>, inverted: bool) -> Self {
        let initial = if inverted { RpLevel::High } else { RpLevel::Low };
        Self {
            output: Output::new(pin, initial),
            inverted,
        }
    }
}

impl OutputPin for GpioOutput {
    fn set_high(&mut self) {
        if self.inverted {
            self.output.set_low();
        } else {
            self.output.set_high();
        }
    }

    fn set_low(&mut self) {
        if self.inverted {
            self.output.set_high();
        } else {
            self.output.set_low();
        }
    }

    fn is_set_high(&self) -> bool {
        self.output.is_set_high() != self.inverted
    }
}
