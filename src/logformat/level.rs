//! Log level detection from line content.
//!
//! Levels appear near the start of a line, after the timestamp, so only the
//! first 150 bytes are inspected. Bracketed patterns like `[ERROR]` are
//! precise and match anywhere in the prefix; bare patterns like `ERROR`
//! require non-word boundaries on both sides so `INFORMATION` does not read
//! as `INFO`.

use crate::config::LogLevelConfig;

/// How many bytes of a line are inspected for a level pattern.
const DETECT_PREFIX_BYTES: usize = 150;

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    #[default]
    Unknown,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// The detectable levels, least severe first (Unknown is not detectable).
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Three-letter tag used in the status bar filter summary.
    pub fn short_name(self) -> &'static str {
        match self {
            Level::Unknown => "UNK",
            Level::Trace => "TRC",
            Level::Debug => "DBG",
            Level::Info => "INF",
            Level::Warn => "WRN",
            Level::Error => "ERR",
            Level::Fatal => "FTL",
        }
    }
}

/// Detects log levels using pattern lists from the configuration.
#[derive(Debug, Clone)]
pub struct LevelDetector {
    // Most severe first, so the highest match wins.
    patterns: [(Level, Vec<String>); 6],
}

impl LevelDetector {
    /// Create a detector from configured pattern lists.
    pub fn new(cfg: &LogLevelConfig) -> Self {
        Self {
            patterns: [
                (Level::Fatal, cfg.fatal_patterns.clone()),
                (Level::Error, cfg.error_patterns.clone()),
                (Level::Warn, cfg.warn_patterns.clone()),
                (Level::Info, cfg.info_patterns.clone()),
                (Level::Debug, cfg.debug_patterns.clone()),
                (Level::Trace, cfg.trace_patterns.clone()),
            ],
        }
    }

    /// Return the level for a line, or `Level::Unknown` when nothing matches.
    pub fn detect(&self, content: &str) -> Level {
        let prefix = clamp_to_boundary(content, DETECT_PREFIX_BYTES);

        for (level, patterns) in &self.patterns {
            if patterns.iter().any(|p| match_pattern(prefix, p)) {
                return *level;
            }
        }
        Level::Unknown
    }
}

/// Truncate to at most `max` bytes without splitting a UTF-8 sequence.
fn clamp_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Check whether a pattern matches with the appropriate boundary rules.
fn match_pattern(text: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }

    // Bracketed patterns are precise and match anywhere
    if pattern.starts_with('[') && pattern.ends_with(']') {
        return text.contains(pattern);
    }

    // Bare patterns require non-word boundaries on both sides
    let Some(idx) = text.find(pattern) else {
        return false;
    };

    if let Some(before) = text[..idx].chars().next_back() {
        if before.is_alphanumeric() || before == '_' {
            return false;
        }
    }

    let end = idx + pattern.len();
    if let Some(after) = text[end..].chars().next() {
        if after.is_alphanumeric() || after == '_' {
            return false;
        }
    }

    true
}
