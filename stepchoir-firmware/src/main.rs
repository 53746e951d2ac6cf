//! Stepchoir - Floppy Drive Orchestra Firmware
//!
//! Main firmware binary for RP2040 boards driving a bank of floppy drives.
//! Each drive head is stepped at an audible cadence, so every channel
//! plays one note. Periods arrive as 3-byte packets over UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Delay;
use heapless::Vec;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use stepchoir_core::config::{PinConfig, MAX_CHANNELS};
use stepchoir_core::{ChannelOutputs, CommandPort, Drive, EqualTemperament, Registry};
use stepchoir_hal_rp2040::{GpioOutput, PinBank, PinError};

mod channels;
mod config;
mod tasks;

/// Serial command stream baud rate
const SERIAL_BAUD: u32 = 9600;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// Shared between the drive task and the serial task
static REGISTRY: StaticCell<Registry> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stepchoir firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let drive_config = config::load_config();
    let mut registry = Registry::from_config(&drive_config);

    let (mut bank, remaining) = PinBank::from_peripherals(p);
    let outputs = acquire_outputs(&mut registry, &mut bank);

    let registry: &'static Registry = REGISTRY.init(registry);
    info!(
        "{} of {} channels enabled, {} us resolution",
        registry.enabled_count(),
        registry.len(),
        registry.resolution_us()
    );

    // Home every head before the scheduler starts ticking
    let mut drive = Drive::new(registry, outputs);
    drive.reset(&mut Delay);
    info!("Drives homed");

    // Setup UART0 for the command stream
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = SERIAL_BAUD;

    let tx_buf = TX_BUF.init([0u8; 16]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(
        remaining.uart0,
        remaining.uart0_tx,
        remaining.uart0_rx,
        uart_config,
    );
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (_tx, rx) = uart.split();
    info!("UART initialized at {} baud", SERIAL_BAUD);

    let port = CommandPort::new(registry, EqualTemperament::new(registry.step_rate_hz()));

    spawner.spawn(tasks::drive_task(drive)).unwrap();
    spawner.spawn(tasks::serial_task(rx, port)).unwrap();

    info!("All tasks spawned");
}

/// Take step/dir pins for every enabled channel
///
/// A channel whose pins cannot be acquired is disabled for good.
fn acquire_outputs(
    registry: &mut Registry,
    bank: &mut PinBank,
) -> Vec<Option<ChannelOutputs<GpioOutput>>, MAX_CHANNELS> {
    let mut outputs = Vec::new();
    let mut failed: Vec<u8, MAX_CHANNELS> = Vec::new();

    for channel in registry.iter() {
        let acquired = if channel.is_enabled() {
            match take_channel_pins(bank, channel.step_pin(), channel.dir_pin()) {
                Ok(pins) => Some(pins),
                Err(e) => {
                    warn!(
                        "Channel {} ({}): pin acquisition failed: {:?}",
                        channel.id(),
                        channel.label(),
                        e
                    );
                    let _ = failed.push(channel.id());
                    None
                }
            }
        } else {
            None
        };
        // One entry per registry channel
        let _ = outputs.push(acquired);
    }

    for id in failed {
        registry.disable(id);
    }

    outputs
}

fn take_channel_pins(
    bank: &mut PinBank,
    step: PinConfig,
    dir: PinConfig,
) -> Result<ChannelOutputs<GpioOutput>, PinError> {
    let step = bank.output(step.pin, step.inverted)?;
    let dir = bank.output(dir.pin, dir.inverted)?;
    Ok(ChannelOutputs::new(step, dir))
}
