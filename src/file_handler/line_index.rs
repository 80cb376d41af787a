//! Line boundary index with a lazy timestamp cache.
//!
//! The index is built in one pass at open time by scanning 64 KiB chunks for
//! newlines with memchr, and extended incrementally when the file grows.
//! Timestamps are parsed on first request and cached per line, even when a
//! line has none, so a parse is attempted at most once.
//!
//! Time-lookup queries scan linearly: a binary search would force parsing of
//! lines it never visits and destroy the lazy property, while linear scans
//! amortize the parse cost across repeated queries.

use crate::file_handler::mmap::MappedFile;
use crate::logformat::TimestampParser;
use chrono::{DateTime, Local};
use memchr::memchr;

/// Scan granularity for newline detection.
const CHUNK_SIZE: usize = 64 * 1024;

/// Per-line timestamp cache entry.
#[derive(Debug, Clone, Copy)]
enum TsSlot {
    /// No parse attempted yet
    Unparsed,
    /// Parsed; the line has no recognizable timestamp
    Missing,
    /// Parsed successfully
    At(DateTime<Local>),
}

/// Ordered line-start byte offsets for a [`MappedFile`], plus a parallel
/// sparse array of parsed timestamps.
///
/// Invariants: offsets are strictly increasing, every offset is `< size`,
/// and offset 0 is present whenever the file is non-empty. Line `i` spans
/// `[offset[i], offset[i+1])` (or to EOF for the last line), excluding the
/// trailing `\n` / `\r\n`.
#[derive(Debug)]
pub struct LineIndex {
    offsets: Vec<u64>,
    timestamps: Vec<TsSlot>,
    parser: TimestampParser,
}

impl LineIndex {
    /// Build the index by scanning the whole file.
    pub fn build(file: &MappedFile) -> Self {
        let size = file.size();
        let mut offsets = Vec::with_capacity((size / 100 + 1) as usize);
        if size > 0 {
            offsets.push(0);
        }

        let mut index = Self {
            offsets,
            timestamps: Vec::new(),
            parser: TimestampParser::new(),
        };
        index.scan_from(file, 0);
        index
    }

    /// Index content appended since `old_size`.
    ///
    /// If the previous content ended with a newline, `old_size` itself is the
    /// start of a new line.
    pub fn append_from(&mut self, file: &MappedFile, old_size: u64) {
        let size = file.size();
        if size <= old_size {
            return;
        }

        if old_size > 0 {
            let mut last = [0u8; 1];
            if file.read_at(&mut last, old_size - 1) == 1 && last[0] == b'\n' {
                self.offsets.push(old_size);
            }
        } else if self.offsets.is_empty() {
            // Empty file receiving its first content
            self.offsets.push(0);
        }

        self.scan_from(file, old_size);
    }

    /// Scan `[from, size)` for newlines, recording each following line start.
    fn scan_from(&mut self, file: &MappedFile, from: u64) {
        let size = file.size();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut pos = from;

        while pos < size {
            let n = file.read_at(&mut buf, pos);
            if n == 0 {
                break;
            }

            let chunk = &buf[..n];
            let mut offset = 0;
            while let Some(idx) = memchr(b'\n', &chunk[offset..]) {
                let line_start = pos + (offset + idx) as u64 + 1;
                if line_start < size {
                    self.offsets.push(line_start);
                }
                offset += idx + 1;
            }

            pos += n as u64;
        }
    }

    /// Total number of indexed lines.
    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }

    /// Content of line `i` with the trailing `\r?\n` stripped, or `None`
    /// when `i` is out of range.
    pub fn get_line(&self, file: &MappedFile, i: usize) -> Option<Vec<u8>> {
        if i >= self.offsets.len() {
            return None;
        }

        let start = self.offsets[i];
        let end = match self.offsets.get(i + 1) {
            Some(&next) => next,
            None => file.size(),
        };

        let mut content = file.read_range(start, end);
        if content.last() == Some(&b'\n') {
            content.pop();
            if content.last() == Some(&b'\r') {
                content.pop();
            }
        }
        Some(content)
    }

    /// Byte offset where line `i` starts.
    pub fn byte_offset(&self, i: usize) -> Option<u64> {
        self.offsets.get(i).copied()
    }

    /// Line-start offsets indexed so far.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Timestamp of line `i`, parsed and cached on first request.
    pub fn timestamp(&mut self, file: &MappedFile, i: usize) -> Option<DateTime<Local>> {
        if i >= self.offsets.len() {
            return None;
        }

        if self.timestamps.len() < self.offsets.len() {
            self.timestamps.resize(self.offsets.len(), TsSlot::Unparsed);
        }

        match self.timestamps[i] {
            TsSlot::At(ts) => Some(ts),
            TsSlot::Missing => None,
            TsSlot::Unparsed => {
                let content = self.get_line(file, i)?;
                let parsed = self.parser.parse(&String::from_utf8_lossy(&content));
                self.timestamps[i] = match parsed {
                    Some(ts) => TsSlot::At(ts),
                    None => TsSlot::Missing,
                };
                parsed
            }
        }
    }

    /// First line whose timestamp is at or after `target`.
    pub fn find_line_at_time(
        &mut self,
        file: &MappedFile,
        target: DateTime<Local>,
    ) -> Option<usize> {
        for i in 0..self.line_count() {
            if let Some(ts) = self.timestamp(file, i) {
                if ts >= target {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Last line whose timestamp is before `target`, stopping at the first
    /// line at or after it.
    ///
    /// Correct only for monotonic timestamps; out-of-order logs yield an
    /// approximation.
    pub fn find_line_before_time(
        &mut self,
        file: &MappedFile,
        target: DateTime<Local>,
    ) -> Option<usize> {
        let mut last_before = None;
        for i in 0..self.line_count() {
            if let Some(ts) = self.timestamp(file, i) {
                if ts < target {
                    last_before = Some(i);
                } else {
                    break;
                }
            }
        }
        last_before
    }

    /// Whichever of [`Self::find_line_at_time`] and
    /// [`Self::find_line_before_time`] is temporally closer to `target`;
    /// ties favor the earlier line.
    pub fn find_nearest_line_at_time(
        &mut self,
        file: &MappedFile,
        target: DateTime<Local>,
    ) -> Option<usize> {
        let after = self.find_line_at_time(file, target);
        let before = self.find_line_before_time(file, target);

        match (before, after) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (Some(b), Some(a)) => {
                let ts_after = self.timestamp(file, a);
                let ts_before = self.timestamp(file, b);
                match (ts_before, ts_after) {
                    (Some(tb), Some(ta)) => {
                        if target - tb <= ta - target {
                            Some(b)
                        } else {
                            Some(a)
                        }
                    }
                    (Some(_), None) => Some(b),
                    _ => Some(a),
                }
            }
        }
    }
}
