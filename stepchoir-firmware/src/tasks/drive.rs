//! Drive task
//!
//! Ticks the scheduler once per resolution interval and services reset
//! requests between ticks. A reset blocks this task (and pauses ticking)
//! until every head is home.

use defmt::*;
use embassy_time::{Delay, Duration, Ticker};

use stepchoir_core::Drive;
use stepchoir_hal_rp2040::GpioOutput;

use crate::channels::RESET_DONE;

/// Drive task - the only context that writes step/dir pins
#[embassy_executor::task]
pub async fn drive_task(mut drive: Drive<'static, GpioOutput>) {
    let registry = drive.registry();
    info!("Drive task started ({} us ticks)", registry.resolution_us());

    let mut ticker = Ticker::every(Duration::from_micros(u64::from(registry.resolution_us())));
    let mut delay = Delay;

    loop {
        ticker.next().await;
        drive.tick();

        if registry.reset_pending() && drive.service_reset(&mut delay) {
            info!("Reset complete");
            // Don't try to catch up on ticks missed while homing
            ticker.reset();
            RESET_DONE.signal(());
        }
    }
}
