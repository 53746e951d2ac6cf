//! Per-channel head motion
//!
//! A drive head walks back and forth between position 0 and the channel's
//! travel bound, one half-step per pulse. Each pulse toggles the step line,
//! so two pulses make one audible cycle.

use stepchoir_hal::Level;

/// Head travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Away from track 0, position increases
    #[default]
    Forward,
    /// Toward track 0, position decreases
    Reverse,
}

impl Direction {
    /// Level driven on the direction pin
    pub fn level(self) -> Level {
        match self {
            Direction::Forward => Level::Low,
            Direction::Reverse => Level::High,
        }
    }
}

/// Pin levels to drive for one step pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepSignal {
    /// Direction pin level
    pub dir: Level,
    /// Step pin level
    pub step: Level,
}

/// Motion state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMotion {
    /// Head position in half-steps, `0..=max_position`
    pub position: u16,
    /// Current travel direction
    pub direction: Direction,
    /// Next level written to the step pin
    pub step_phase: bool,
    /// Ticks elapsed since the last step
    pub tick_counter: u16,
}

impl ChannelMotion {
    /// Parked at track 0, moving forward, step line low
    pub const fn home() -> Self {
        Self {
            position: 0,
            direction: Direction::Forward,
            step_phase: false,
            tick_counter: 0,
        }
    }

    /// Advance the head by one half-step
    ///
    /// Reverses at either end of travel before moving, then returns the
    /// levels to drive. The step phase flips after each pulse and the
    /// tick counter restarts.
    pub fn advance(&mut self, max_position: u16) -> StepSignal {
        if self.position >= max_position {
            self.direction = Direction::Reverse;
        } else if self.position == 0 {
            self.direction = Direction::Forward;
        }

        match self.direction {
            Direction::Forward => self.position += 1,
            Direction::Reverse => self.position = self.position.saturating_sub(1),
        }

        let signal = StepSignal {
            dir: self.direction.level(),
            step: Level::from(self.step_phase),
        };
        self.step_phase = !self.step_phase;
        self.tick_counter = 0;
        signal
    }
}
