//! Line styling: level-based coloring and the SGR helpers the UI shares.
//!
//! Renderers produce plain strings carrying raw ANSI escape sequences; the
//! viewport's escape-aware truncation and the terminal driver both operate
//! on that representation directly.

use crate::config::Config;
use crate::logformat::{Level, LevelDetector};
use crate::source::Line;

/// Reset all attributes.
pub const RESET: &str = "\x1b[0m";

/// Applies styling to lines before the viewport lays them out.
pub trait Renderer: Send + Sync {
    fn render(&self, line: &Line) -> String;
}

/// Renders content as-is.
#[derive(Debug, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, line: &Line) -> String {
        line.content.clone()
    }
}

/// Colors lines by detected log level using 256-color theme codes.
pub struct LevelRenderer {
    detector: LevelDetector,
    colors: [Option<u8>; 7],
}

impl LevelRenderer {
    pub fn new(cfg: &Config) -> Self {
        let detector = LevelDetector::new(&cfg.log_levels);
        let levels = &cfg.theme.levels;

        let mut colors = [None; 7];
        colors[Level::Trace as usize] = parse_color(&levels.trace);
        colors[Level::Debug as usize] = parse_color(&levels.debug);
        colors[Level::Info as usize] = parse_color(&levels.info);
        colors[Level::Warn as usize] = parse_color(&levels.warn);
        colors[Level::Error as usize] = parse_color(&levels.error);
        colors[Level::Fatal as usize] = parse_color(&levels.fatal);

        Self { detector, colors }
    }
}

impl Renderer for LevelRenderer {
    fn render(&self, line: &Line) -> String {
        let level = if line.level != Level::Unknown {
            line.level
        } else {
            self.detector.detect(&line.content)
        };

        match self.colors[level as usize] {
            Some(code) => fg(code, &line.content),
            None => line.content.clone(),
        }
    }
}

/// Parse a 256-color code from its config string form.
pub fn parse_color(s: &str) -> Option<u8> {
    s.trim().parse().ok()
}

/// Wrap text in a 256-color foreground.
pub fn fg(code: u8, text: &str) -> String {
    format!("\x1b[38;5;{code}m{text}{RESET}")
}

/// Wrap text in 256-color background and foreground.
pub fn bg_fg(bg: u8, fg: u8, text: &str) -> String {
    format!("\x1b[48;5;{bg}m\x1b[38;5;{fg}m{text}{RESET}")
}

/// Wrap text in bold plus a 256-color foreground.
pub fn bold_fg(code: u8, text: &str) -> String {
    format!("\x1b[1m\x1b[38;5;{code}m{text}{RESET}")
}
