//! Channel registry
//!
//! The registry is built once from [`DriveConfig`], has failed channels
//! disabled while pins are acquired, and is then shared by reference
//! between the tick context and the command context.
//!
//! Only the period and the reset request cross contexts. Both are atomics,
//! so a command can land between any two ticks without tearing.

use heapless::{String, Vec};
use portable_atomic::{AtomicBool, AtomicU16, Ordering};

use crate::command::CommandError;
use crate::config::{DriveConfig, PinConfig, MAX_CHANNELS, MAX_LABEL_LEN};

/// One drive as seen by the scheduler and the command interface
#[derive(Debug)]
pub struct Channel {
    id: u8,
    label: String<MAX_LABEL_LEN>,
    step_pin: PinConfig,
    dir_pin: PinConfig,
    enabled: bool,
    max_position: u16,
    period: AtomicU16,
}

impl Channel {
    /// Channel id (index in the registry)
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Channel label from config
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Step pin
    pub fn step_pin(&self) -> PinConfig {
        self.step_pin
    }

    /// Direction pin
    pub fn dir_pin(&self) -> PinConfig {
        self.dir_pin
    }

    /// Whether the channel ticks and resets
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Travel bound in half-steps
    pub fn max_position(&self) -> u16 {
        self.max_position
    }

    /// Current period in ticks (0 = silent)
    pub fn period(&self) -> u16 {
        self.period.load(Ordering::Relaxed)
    }

    fn store_period(&self, ticks: u16) {
        self.period.store(ticks, Ordering::Relaxed);
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Channel {{ id: {}, label: {}, enabled: {}, period: {} }}",
            self.id,
            self.label.as_str(),
            self.enabled,
            self.period()
        );
    }
}

/// All channels of the bank plus shared timing
#[derive(Debug)]
pub struct Registry {
    channels: Vec<Channel, MAX_CHANNELS>,
    reset_requested: AtomicBool,
    resolution_us: u32,
    step_rate_hz: u32,
    reset_step_delay_ms: u32,
}

impl Registry {
    /// Build channels from config, all silent
    pub fn from_config(config: &DriveConfig) -> Self {
        let mut channels = Vec::new();
        for (id, channel) in config.channels.iter().enumerate() {
            // Same capacity as the config's channel list
            let _ = channels.push(Channel {
                id: id as u8,
                label: channel.label.clone(),
                step_pin: channel.step_pin,
                dir_pin: channel.dir_pin,
                enabled: channel.enabled,
                max_position: channel.max_position,
                period: AtomicU16::new(0),
            });
        }

        Self {
            channels,
            reset_requested: AtomicBool::new(false),
            resolution_us: config.resolution_us,
            step_rate_hz: config.step_rate_hz(),
            reset_step_delay_ms: config.reset_step_delay_ms,
        }
    }

    /// Number of channels, enabled or not
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Registry has no channels
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Look up a channel by id
    pub fn get(&self, id: u8) -> Option<&Channel> {
        self.channels.get(usize::from(id))
    }

    /// All channels in id order
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Enabled channels in id order
    pub fn iter_enabled(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(|c| c.enabled)
    }

    /// Permanently disable a channel
    ///
    /// Used while acquiring pins, before the registry is shared.
    /// Returns `false` if there is no such channel.
    pub fn disable(&mut self, id: u8) -> bool {
        match self.channels.get_mut(usize::from(id)) {
            Some(channel) => {
                channel.enabled = false;
                channel.store_period(0);
                true
            }
            None => false,
        }
    }

    /// Number of enabled channels
    pub fn enabled_count(&self) -> u8 {
        self.iter_enabled().count() as u8
    }

    /// Tick interval in microseconds
    pub fn resolution_us(&self) -> u32 {
        self.resolution_us
    }

    /// Steps per second at a period of one tick
    pub fn step_rate_hz(&self) -> u32 {
        self.step_rate_hz
    }

    /// Pause between reset pulses in milliseconds
    pub fn reset_step_delay_ms(&self) -> u32 {
        self.reset_step_delay_ms
    }

    /// Largest travel bound among enabled channels (0 if none)
    pub fn max_position_global(&self) -> u16 {
        self.iter_enabled()
            .map(|c| c.max_position)
            .max()
            .unwrap_or(0)
    }

    /// Set a channel's period
    pub fn set_period(&self, id: u8, ticks: u16) -> Result<(), CommandError> {
        let channel = self.get(id).ok_or(CommandError::UnknownChannel(id))?;
        if !channel.enabled {
            return Err(CommandError::ChannelDisabled(id));
        }
        channel.store_period(ticks);
        Ok(())
    }

    /// Silence every channel
    pub fn silence_all(&self) {
        for channel in self.channels.iter() {
            channel.store_period(0);
        }
    }

    /// Silence everything and ask the drive owner to home all heads
    ///
    /// Periods are zeroed before the flag is raised, so no tick after
    /// this call steps a channel until a new period is set.
    pub fn request_reset(&self) {
        self.silence_all();
        self.reset_requested.store(true, Ordering::Release);
    }

    /// Whether a reset is waiting to be serviced
    pub fn reset_pending(&self) -> bool {
        self.reset_requested.load(Ordering::Acquire)
    }

    /// Consume a pending reset request
    pub fn take_reset_request(&self) -> bool {
        self.reset_requested.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelConfig, DriveKind};

    fn registry() -> Registry {
        let mut config = DriveConfig::arduino_layout();
        config.channels[1].enabled = false;
        config.channels[2] = ChannelConfig::new("bass", 6, 7).with_kind(DriveKind::FiveAndQuarter);
        Registry::from_config(&config)
    }

    #[test]
    fn test_from_config() {
        let registry = registry();
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.enabled_count(), 7);
        assert_eq!(registry.step_rate_hz(), 12_500);
        assert_eq!(registry.resolution_us(), 40);
        assert_eq!(registry.reset_step_delay_ms(), 5);

        let bass = registry.get(2).unwrap();
        assert_eq!(bass.id(), 2);
        assert_eq!(bass.label(), "bass");
        assert_eq!(bass.step_pin(), PinConfig::new(6));
        assert_eq!(bass.dir_pin(), PinConfig::new(7));
        assert_eq!(bass.max_position(), 98);
        assert!(registry.iter().all(|c| c.period() == 0));
    }

    #[test]
    fn test_set_period() {
        let registry = registry();
        assert_eq!(registry.set_period(0, 28), Ok(()));
        assert_eq!(registry.get(0).unwrap().period(), 28);

        assert_eq!(registry.set_period(1, 28), Err(CommandError::ChannelDisabled(1)));
        assert_eq!(registry.get(1).unwrap().period(), 0);

        assert_eq!(registry.set_period(8, 28), Err(CommandError::UnknownChannel(8)));
        assert_eq!(registry.set_period(255, 28), Err(CommandError::UnknownChannel(255)));
    }

    #[test]
    fn test_disable() {
        let mut registry = registry();
        registry.set_period(3, 40).unwrap();
        assert!(registry.disable(3));
        assert!(!registry.get(3).unwrap().is_enabled());
        assert_eq!(registry.get(3).unwrap().period(), 0);
        assert_eq!(registry.enabled_count(), 6);
        assert!(!registry.disable(42));
    }

    #[test]
    fn test_max_position_global() {
        let mut config = DriveConfig::new();
        assert_eq!(Registry::from_config(&config).max_position_global(), 0);

        let _ = config
            .channels
            .push(ChannelConfig::new("a", 2, 3).with_kind(DriveKind::FiveAndQuarter));
        assert_eq!(Registry::from_config(&config).max_position_global(), 98);

        let mut disabled = ChannelConfig::new("b", 4, 5);
        disabled.enabled = false;
        let _ = config.channels.push(disabled);
        assert_eq!(Registry::from_config(&config).max_position_global(), 98);

        let _ = config.channels.push(ChannelConfig::new("c", 6, 7));
        assert_eq!(Registry::from_config(&config).max_position_global(), 158);
    }

    #[test]
    fn test_reset_request() {
        let registry = registry();
        registry.set_period(0, 28).unwrap();
        registry.set_period(4, 50).unwrap();
        assert!(!registry.reset_pending());

        registry.request_reset();
        assert!(registry.reset_pending());
        assert!(registry.iter().all(|c| c.period() == 0));

        assert!(registry.take_reset_request());
        assert!(!registry.take_reset_request());
        assert!(!registry.reset_pending());
    }
}
