//! Serial command receive task
//!
//! Reads bursts from UART0 and decodes 3-byte packets. A control packet
//! drops the rest of its burst. After a reset the task waits for homing
//! to finish, then flushes everything received meanwhile and restarts
//! packet framing.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Read;

use stepchoir_core::{CommandPort, EqualTemperament};
use stepchoir_protocol::{Command, PacketDecoder};

use crate::channels::RESET_DONE;

const RX_BUF_SIZE: usize = 64;

/// Line idle time that ends a flush (about two byte times at 9600 baud)
const FLUSH_IDLE: Duration = Duration::from_millis(2);

/// Serial RX task - decodes packets and applies them to the bank
#[embassy_executor::task]
pub async fn serial_task(mut rx: BufferedUartRx, port: CommandPort<'static, EqualTemperament>) {
    info!("Serial RX task started");

    let mut decoder = PacketDecoder::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                let mut reset_requested = false;
                decoder.feed_burst(&buf[..n], |packet| match packet.to_command() {
                    Ok(Some(command)) => {
                        if command == Command::Reset {
                            reset_requested = true;
                        }
                        if let Err(e) = port.dispatch(command) {
                            warn!("Command {:?} rejected: {:?}", command, e);
                        }
                    }
                    Ok(None) => {
                        trace!("Reserved control packet ignored");
                    }
                    Err(e) => {
                        warn!("Packet dropped: {:?}", e);
                    }
                });

                if reset_requested {
                    RESET_DONE.wait().await;
                    let dropped = flush(&mut rx, &mut buf).await;
                    decoder.reset();
                    debug!("Reset done, {} bytes received during homing dropped", dropped);
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Read and discard until the line goes idle
///
/// Returns the number of bytes dropped. Overrun errors from a full RX
/// buffer are part of what gets flushed.
async fn flush(rx: &mut BufferedUartRx, buf: &mut [u8]) -> usize {
    let mut dropped = 0;
    loop {
        match with_timeout(FLUSH_IDLE, rx.read(buf)).await {
            Ok(Ok(n)) if n > 0 => dropped += n,
            Ok(Err(_)) => {}
            Ok(Ok(_)) | Err(_) => return dropped,
        }
    }
}
