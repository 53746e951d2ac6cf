//! Inter-task signals

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Signalled by the drive task after a requested reset has finished
pub static RESET_DONE: Signal<CriticalSectionRawMutex, ()> = Signal::new();
