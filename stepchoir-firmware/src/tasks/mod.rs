//! Embassy async tasks
//!
//! Each task runs independently and communicates via the shared registry
//! and signals.

pub mod drive;
pub mod serial;

pub use drive::drive_task;
pub use serial::serial_task;
