//! Application configuration loaded from an optional TOML file.
//!
//! The file lives at `$XDG_CONFIG_HOME/mless/config.toml` (or
//! `~/.config/mless/config.toml`). A missing file or missing keys fall back
//! to built-in defaults; a malformed file is reported via the log and then
//! ignored. Nothing is ever written back.

use serde::Deserialize;
use std::path::PathBuf;

/// All application configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub log_levels: LogLevelConfig,
    pub theme: ThemeConfig,
}

/// Initial display options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_line_numbers: bool,
    pub wrap_lines: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_line_numbers: true,
            wrap_lines: false,
        }
    }
}

/// Pattern lists for level detection, one list per severity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogLevelConfig {
    pub trace_patterns: Vec<String>,
    pub debug_patterns: Vec<String>,
    pub info_patterns: Vec<String>,
    pub warn_patterns: Vec<String>,
    pub error_patterns: Vec<String>,
    pub fatal_patterns: Vec<String>,
}

impl Default for LogLevelConfig {
    fn default() -> Self {
        let strs = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            trace_patterns: strs(&["[TRC]", "[TRACE]", "TRACE", "TRC"]),
            debug_patterns: strs(&["[DBG]", "[DEBUG]", "DEBUG", "DBG"]),
            info_patterns: strs(&["[INF]", "[INFO]", "INFO", "INF"]),
            warn_patterns: strs(&["[WRN]", "[WARN]", "[WARNING]", "WARN", "WRN", "WARNING"]),
            error_patterns: strs(&["[ERR]", "[ERROR]", "ERROR", "ERR"]),
            fatal_patterns: strs(&["[FTL]", "[FATAL]", "FATAL", "FTL", "[CRIT]", "CRITICAL"]),
        }
    }
}

/// 256-color codes (as strings, matching the config file format) for UI
/// elements and per-level line styling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub line_numbers: String,
    pub status_bar: String,
    pub status_bar_text: String,
    pub highlight: String,
    pub visual_marker: String,
    pub levels: LevelColors,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            line_numbers: "240".to_string(),
            status_bar: "236".to_string(),
            status_bar_text: "252".to_string(),
            highlight: "226".to_string(),
            visual_marker: "51".to_string(),
            levels: LevelColors::default(),
        }
    }
}

/// Per-level foreground colors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LevelColors {
    pub trace: String,
    pub debug: String,
    pub info: String,
    pub warn: String,
    pub error: String,
    pub fatal: String,
}

impl Default for LevelColors {
    fn default() -> Self {
        Self {
            trace: "240".to_string(),
            debug: "244".to_string(),
            info: "250".to_string(),
            warn: "214".to_string(),
            error: "167".to_string(),
            fatal: "196".to_string(),
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults on any problem.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    fn load_from(path: &PathBuf) -> Self {
        let Ok(data) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&data) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("ignoring malformed config {}: {err}", path.display());
                Self::default()
            }
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mless").join("config.toml"))
}
