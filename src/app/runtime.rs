//! Input pump: a blocking thread that forwards terminal events to the
//! event loop's channel.

use crossterm::event::{self, Event};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

/// Spawn a thread that polls crossterm and forwards events until the
/// shutdown flag is set or the receiver goes away.
pub fn spawn_input_thread(
    tx: Sender<Event>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while !shutdown.load(Ordering::SeqCst) {
            match event::poll(poll_interval) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        log::warn!("input read error: {err}");
                        break;
                    }
                },
                Ok(false) => {
                    // No input this tick; check the flag and poll again
                }
                Err(err) => {
                    log::warn!("input poll error: {err}");
                    break;
                }
            }
        }
    })
}
