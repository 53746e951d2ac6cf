//! Tick scheduler and homing sequence
//!
//! [`Drive`] owns the step/direction outputs and the motion state of every
//! channel. It reads periods from the shared [`Registry`] on each tick and
//! is the only thing that touches the pins.
//!
//! ```text
//!   command context               tick context
//!   ───────────────               ────────────
//!   CommandPort ──store──► Registry ◄──load── Drive::tick()
//!        │                    │                   │
//!        └─request_reset──►  flag  ──take──► Drive::service_reset()
//!                                                 │
//!                                           step/dir pins
//! ```

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use stepchoir_hal::OutputPin;

use crate::channel::{ChannelMotion, Direction};
use crate::config::MAX_CHANNELS;
use crate::registry::Registry;

/// Step and direction outputs of one channel
pub struct ChannelOutputs<P> {
    /// Step pulse line
    pub step: P,
    /// Direction line
    pub dir: P,
}

impl<P: OutputPin> ChannelOutputs<P> {
    /// Pair a step and a direction output
    pub fn new(step: P, dir: P) -> Self {
        Self { step, dir }
    }

    fn park(&mut self) {
        self.dir.set_level(Direction::Forward.level());
        self.step.set_low();
    }
}

/// The drive bank: pins plus per-channel motion
///
/// Channels without outputs (pin acquisition failed) are never stepped.
pub struct Drive<'a, P> {
    registry: &'a Registry,
    outputs: Vec<Option<ChannelOutputs<P>>, MAX_CHANNELS>,
    motion: Vec<ChannelMotion, MAX_CHANNELS>,
}

impl<'a, P: OutputPin> Drive<'a, P> {
    /// Create a drive over `registry` with outputs indexed by channel id
    ///
    /// Every channel starts at home. Run [`Drive::reset`] before ticking
    /// so the heads actually are there.
    pub fn new(registry: &'a Registry, outputs: Vec<Option<ChannelOutputs<P>>, MAX_CHANNELS>) -> Self {
        let mut motion = Vec::new();
        for _ in 0..registry.len() {
            let _ = motion.push(ChannelMotion::home());
        }

        Self {
            registry,
            outputs,
            motion,
        }
    }

    /// Shared registry
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Motion state of a channel
    pub fn motion(&self, id: u8) -> Option<&ChannelMotion> {
        self.motion.get(usize::from(id))
    }

    /// Outputs of a channel, if it has any
    pub fn outputs(&self, id: u8) -> Option<&ChannelOutputs<P>> {
        self.outputs.get(usize::from(id))?.as_ref()
    }

    /// Advance every enabled channel by one tick
    ///
    /// Channels are serviced in id order; several may step in the same
    /// tick. Returns the number of steps taken.
    pub fn tick(&mut self) -> u8 {
        let registry = self.registry;
        let mut fired = 0;

        for channel in registry.iter_enabled() {
            let id = usize::from(channel.id());
            let (Some(Some(outputs)), Some(motion)) =
                (self.outputs.get_mut(id), self.motion.get_mut(id))
            else {
                continue;
            };

            let period = channel.period();
            if period == 0 {
                motion.tick_counter = 0;
                continue;
            }

            motion.tick_counter = motion.tick_counter.saturating_add(1);
            if motion.tick_counter >= period {
                let signal = motion.advance(channel.max_position());
                outputs.dir.set_level(signal.dir);
                outputs.step.set_level(signal.step);
                fired += 1;
            }
        }

        fired
    }

    /// Walk every head back to track 0
    ///
    /// Blocks for `max_position_global / 2` pulses separated by the
    /// configured delay. Periods are zeroed first, so nothing else steps
    /// while the pulses go out.
    pub fn reset(&mut self, delay: &mut impl DelayNs) {
        let registry = self.registry;
        registry.silence_all();

        let pulses = registry.max_position_global() / 2;
        let reverse = Direction::Reverse.level();
        for _ in 0..pulses {
            for channel in registry.iter_enabled() {
                if let Some(Some(outputs)) = self.outputs.get_mut(usize::from(channel.id())) {
                    outputs.dir.set_level(reverse);
                    outputs.step.set_high();
                    outputs.step.set_low();
                }
            }
            delay.delay_ms(registry.reset_step_delay_ms());
        }

        for channel in registry.iter_enabled() {
            let id = usize::from(channel.id());
            if let Some(motion) = self.motion.get_mut(id) {
                *motion = ChannelMotion::home();
            }
            if let Some(Some(outputs)) = self.outputs.get_mut(id) {
                outputs.park();
            }
        }
    }

    /// Run a reset if one was requested
    ///
    /// Returns `true` if a reset ran.
    pub fn service_reset(&mut self, delay: &mut impl DelayNs) -> bool {
        if !self.registry.take_reset_request() {
            return false;
        }
        self.reset(delay);
        true
    }

    /// Silence the bank and hand the outputs back
    pub fn shutdown(mut self) -> Vec<Option<ChannelOutputs<P>>, MAX_CHANNELS> {
        self.registry.silence_all();
        for outputs in self.outputs.iter_mut().flatten() {
            outputs.park();
        }
        self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelConfig, DriveConfig, DriveKind};
    use proptest::prelude::*;
    use stepchoir_hal::Level;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec as StdVec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Line {
        Step(u8),
        Dir(u8),
    }

    type Log = Rc<RefCell<StdVec<(Line, Level)>>>;

    /// Output that records every write into a shared log
    struct RecordingPin {
        line: Line,
        high: bool,
        log: Log,
    }

    impl OutputPin for RecordingPin {
        fn set_high(&mut self) {
            self.high = true;
            self.log.borrow_mut().push((self.line, Level::High));
        }

        fn set_low(&mut self) {
            self.high = false;
            self.log.borrow_mut().push((self.line, Level::Low));
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        calls: u32,
        total_ms: u32,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_ms(&mut self, ms: u32) {
            self.calls += 1;
            self.total_ms += ms;
        }
    }

    fn outputs_for(registry: &Registry, log: &Log) -> Vec<Option<ChannelOutputs<RecordingPin>>, MAX_CHANNELS> {
        let mut outputs = Vec::new();
        for channel in registry.iter() {
            let pin = |line| RecordingPin {
                line,
                high: false,
                log: log.clone(),
            };
            let _ = outputs.push(Some(ChannelOutputs::new(
                pin(Line::Step(channel.id())),
                pin(Line::Dir(channel.id())),
            )));
        }
        outputs
    }

    fn single_channel(kind: DriveKind) -> Registry {
        let mut config = DriveConfig::new();
        let _ = config.channels.push(ChannelConfig::new("fd0", 2, 3).with_kind(kind));
        Registry::from_config(&config)
    }

    #[test]
    fn test_a4_steps_once_every_28_ticks() {
        let registry = single_channel(DriveKind::ThreeAndHalf);
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));
        registry.set_period(0, 28).unwrap();

        for _ in 0..27 {
            assert_eq!(drive.tick(), 0);
        }
        assert_eq!(drive.motion(0).unwrap().tick_counter, 27);
        assert_eq!(drive.tick(), 1);

        let motion = drive.motion(0).unwrap();
        assert_eq!(motion.position, 1);
        assert_eq!(motion.tick_counter, 0);
        assert!(motion.step_phase);
        assert_eq!(
            log.borrow().as_slice(),
            &[(Line::Dir(0), Level::Low), (Line::Step(0), Level::Low)]
        );
    }

    #[test]
    fn test_period_one_steps_every_tick() {
        let registry = single_channel(DriveKind::ThreeAndHalf);
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));
        registry.set_period(0, 1).unwrap();

        for _ in 0..10 {
            assert_eq!(drive.tick(), 1);
        }
        assert_eq!(drive.motion(0).unwrap().position, 10);
    }

    #[test]
    fn test_bounces_at_max_position() {
        let registry = single_channel(DriveKind::ThreeAndHalf);
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));
        registry.set_period(0, 1).unwrap();

        for _ in 0..158 {
            drive.tick();
        }
        assert_eq!(drive.motion(0).unwrap().position, 158);
        assert_eq!(drive.motion(0).unwrap().direction, Direction::Forward);

        log.borrow_mut().clear();
        drive.tick();
        let motion = drive.motion(0).unwrap();
        assert_eq!(motion.direction, Direction::Reverse);
        assert_eq!(motion.position, 157);
        assert_eq!(log.borrow()[0], (Line::Dir(0), Level::High));
    }

    #[test]
    fn test_silent_channel_holds_counter_at_zero() {
        let registry = single_channel(DriveKind::ThreeAndHalf);
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));

        registry.set_period(0, 100).unwrap();
        for _ in 0..50 {
            drive.tick();
        }
        registry.set_period(0, 0).unwrap();
        assert_eq!(drive.tick(), 0);
        assert_eq!(drive.motion(0).unwrap().tick_counter, 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_period_lowered_below_counter_steps_next_tick() {
        let registry = single_channel(DriveKind::ThreeAndHalf);
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));

        registry.set_period(0, 1000).unwrap();
        for _ in 0..500 {
            drive.tick();
        }
        registry.set_period(0, 10).unwrap();
        assert_eq!(drive.tick(), 1);
    }

    #[test]
    fn test_several_channels_step_in_one_tick() {
        let registry = Registry::from_config(&DriveConfig::arduino_layout());
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));
        registry.set_period(0, 2).unwrap();
        registry.set_period(5, 2).unwrap();
        registry.set_period(7, 3).unwrap();

        assert_eq!(drive.tick(), 0);
        assert_eq!(drive.tick(), 2);
        assert_eq!(drive.tick(), 1);

        // Fixed id order within a tick
        let order: StdVec<Line> = log.borrow().iter().map(|(line, _)| *line).collect();
        assert_eq!(
            order,
            [Line::Dir(0), Line::Step(0), Line::Dir(5), Line::Step(5), Line::Dir(7), Line::Step(7)]
        );
    }

    #[test]
    fn test_disabled_and_unwired_channels_are_skipped() {
        let mut registry = Registry::from_config(&DriveConfig::arduino_layout());
        let log = Log::default();
        let mut outputs = outputs_for(&registry, &log);
        registry.set_period(1, 1).unwrap();
        registry.set_period(2, 1).unwrap();
        registry.disable(1);
        outputs[2] = None;

        let mut drive = Drive::new(&registry, outputs);
        assert_eq!(drive.tick(), 0);
        assert_eq!(drive.motion(2).unwrap().position, 0);
        assert!(drive.outputs(2).is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_reset_homes_every_enabled_channel() {
        let mut config = DriveConfig::arduino_layout();
        config.channels[3].enabled = false;
        let registry = Registry::from_config(&config);
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));

        registry.set_period(0, 1).unwrap();
        registry.set_period(6, 3).unwrap();
        for _ in 0..400 {
            drive.tick();
        }
        log.borrow_mut().clear();

        let mut delay = CountingDelay::default();
        drive.reset(&mut delay);

        assert_eq!(delay.calls, 79);
        assert_eq!(delay.total_ms, 79 * 5);
        for channel in registry.iter_enabled() {
            assert_eq!(channel.period(), 0);
            assert_eq!(drive.motion(channel.id()), Some(&ChannelMotion::home()));
            let outputs = drive.outputs(channel.id()).unwrap();
            assert!(outputs.dir.is_set_low());
            assert!(outputs.step.is_set_low());
        }

        let log = log.borrow();
        let step_highs = log
            .iter()
            .filter(|(line, level)| *line == Line::Step(0) && *level == Level::High)
            .count();
        assert_eq!(step_highs, 79);
        assert!(log.iter().all(|(line, _)| *line != Line::Step(3) && *line != Line::Dir(3)));
    }

    #[test]
    fn test_reset_pulse_count_follows_largest_drive() {
        let registry = single_channel(DriveKind::FiveAndQuarter);
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));
        let mut delay = CountingDelay::default();
        drive.reset(&mut delay);
        assert_eq!(delay.calls, 49);
    }

    #[test]
    fn test_reset_on_empty_bank_is_noop() {
        let registry = Registry::from_config(&DriveConfig::new());
        let mut drive: Drive<'_, RecordingPin> = Drive::new(&registry, Vec::new());
        let mut delay = CountingDelay::default();
        drive.reset(&mut delay);
        assert_eq!(delay.calls, 0);
        assert_eq!(drive.tick(), 0);
    }

    #[test]
    fn test_service_reset_runs_only_when_requested() {
        let registry = single_channel(DriveKind::ThreeAndHalf);
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));
        let mut delay = CountingDelay::default();

        assert!(!drive.service_reset(&mut delay));
        assert_eq!(delay.calls, 0);

        registry.set_period(0, 1).unwrap();
        for _ in 0..5 {
            drive.tick();
        }
        registry.request_reset();
        // Silenced immediately, before the reset is serviced
        assert_eq!(drive.tick(), 0);

        assert!(drive.service_reset(&mut delay));
        assert_eq!(delay.calls, 79);
        assert_eq!(drive.motion(0).unwrap().position, 0);
        assert!(!drive.service_reset(&mut delay));
    }

    #[test]
    fn test_shutdown_returns_parked_outputs() {
        let registry = single_channel(DriveKind::ThreeAndHalf);
        let log = Log::default();
        let mut drive = Drive::new(&registry, outputs_for(&registry, &log));
        registry.set_period(0, 1).unwrap();
        drive.tick();
        drive.tick();

        let outputs = drive.shutdown();
        assert_eq!(registry.get(0).unwrap().period(), 0);
        let pins = outputs[0].as_ref().unwrap();
        assert!(pins.step.is_set_low());
        assert!(pins.dir.is_set_low());
    }

    proptest! {
        #[test]
        fn prop_positions_stay_in_bounds(
            periods in proptest::collection::vec(0u16..6, 8),
            ticks in 0usize..1500,
        ) {
            let registry = Registry::from_config(&DriveConfig::arduino_layout());
            let log = Log::default();
            let mut drive = Drive::new(&registry, outputs_for(&registry, &log));
            for (id, period) in periods.iter().enumerate() {
                registry.set_period(id as u8, *period).unwrap();
            }

            for _ in 0..ticks {
                drive.tick();
                for channel in registry.iter() {
                    let motion = drive.motion(channel.id()).unwrap();
                    prop_assert!(motion.position <= channel.max_position());
                    if channel.period() > 0 {
                        prop_assert!(motion.tick_counter < channel.period());
                    }
                }
            }
        }
    }
}
