//! Application core: terminal lifecycle and the cooperative event loop.
//!
//! All state lives in the [`Model`] and is mutated only on this thread. A
//! dedicated pump thread collects terminal events onto a channel (see
//! [`runtime`]); the loop here processes one message to completion, redraws,
//! and uses the receive timeout as the follow-mode tick.

pub mod runtime;

use crate::error::Result;
use crate::ui::terminal::{self, TerminalGuard};
use crate::ui::Model;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Follow-mode refresh cadence.
const TICK_INTERVAL: Duration = Duration::from_millis(500);
/// How often the input thread re-checks the shutdown flag.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Owns the model and drives it from terminal events.
pub struct Application {
    model: Model,
}

impl Application {
    pub fn new(model: Model) -> Self {
        Self { model }
    }

    /// Run the interactive loop until the model asks to quit.
    pub fn run(&mut self) -> Result<()> {
        let guard = TerminalGuard::new()?;
        let (width, height) = guard.size()?;
        self.model.resize(width as usize, height as usize);

        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let input_thread = runtime::spawn_input_thread(tx, Arc::clone(&shutdown), INPUT_POLL_INTERVAL);

        while !self.model.should_quit() {
            terminal::draw(&self.model.render())?;

            match rx.recv_timeout(TICK_INTERVAL) {
                Ok(event) => self.model.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {
                    if self.model.any_following() {
                        self.model.on_tick();
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        shutdown.store(true, Ordering::SeqCst);
        let _ = input_thread.join();
        drop(guard);
        Ok(())
    }
}
