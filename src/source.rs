//! Line providers: the core abstraction the viewport renders from.
//!
//! A [`LineProvider`] yields [`Line`] records by visible index and can map a
//! visible index back to the original line number in the underlying file.
//! Two implementations exist: [`file::FileSource`] (identity mapping over a
//! mapped file) and [`filtered::FilteredProvider`] (level/substring filters
//! with a maintained forward and reverse mapping).

pub mod file;
pub mod filtered;

pub use file::FileSource;
pub use filtered::FilteredProvider;

use crate::logformat::Level;
use chrono::{DateTime, Local};

/// A single line with optional metadata, yielded on request.
#[derive(Debug, Clone)]
pub struct Line {
    /// Content without the trailing newline (lossy UTF-8)
    pub content: String,
    /// 0-based line number in the source file, always populated
    pub original_index: usize,
    /// Detected severity; `Unknown` until a detector has run
    pub level: Level,
    /// Parsed timestamp, if any layer bothered to attach one
    pub timestamp: Option<DateTime<Local>>,
}

impl Line {
    pub fn new(content: String, original_index: usize) -> Self {
        Self {
            content,
            original_index,
            level: Level::Unknown,
            timestamp: None,
        }
    }
}

/// Read access to an ordered sequence of lines.
///
/// The viewport only interacts with this trait; it knows nothing about
/// filters, slices, or file sources.
pub trait LineProvider: Send + Sync {
    /// Total number of visible lines.
    fn line_count(&self) -> usize;

    /// Line at `index` (0-based), or `None` when out of range.
    fn get_line(&self, index: usize) -> Option<Line>;

    /// Up to `count` lines starting at `start`.
    fn get_lines(&self, start: usize, count: usize) -> Vec<Line> {
        (start..start.saturating_add(count))
            .map_while(|i| self.get_line(i))
            .collect()
    }

    /// Original line number behind visible `index`, or `None` out of range.
    fn original_line_number(&self, index: usize) -> Option<usize>;
}
