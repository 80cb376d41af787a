//! Terminal lifecycle and frame drawing.
//!
//! [`TerminalGuard`] owns raw mode and the alternate screen, restoring both
//! on drop so a panic never leaves the shell unusable. Frames arrive as
//! pre-styled rows of exactly the terminal width, so drawing is a queued
//! cursor-move-and-print per row with a single flush; no clearing is needed
//! because every cell is rewritten.

use crate::error::{MlessError, Result};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};

/// Raw-mode + alternate-screen session, restored on drop.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn new() -> Result<Self> {
        enable_raw_mode().map_err(|e| MlessError::terminal(e.to_string()))?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)
            .map_err(|e| MlessError::terminal(e.to_string()))?;
        Ok(Self { active: true })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        crossterm::terminal::size().map_err(|e| MlessError::terminal(e.to_string()))
    }

    fn restore(&mut self) {
        if self.active {
            let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
            self.active = false;
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Write a full frame, one row per terminal line.
pub fn draw(rows: &[String]) -> Result<()> {
    let mut stdout = io::stdout();
    for (y, row) in rows.iter().enumerate() {
        queue!(stdout, MoveTo(0, y as u16), Print(row))
            .map_err(|e| MlessError::terminal(e.to_string()))?;
    }
    stdout
        .flush()
        .map_err(|e| MlessError::terminal(e.to_string()))
}
