//! Line provider backed by a memory-mapped file and its line index.
//!
//! A `FileSource` may be shared between panes (`Arc<FileSource>`); panes
//! sharing a source share its index. Trait methods take `&self`, so the
//! mutable parts (the mapping after a refresh, the lazy timestamp cache) sit
//! behind a `parking_lot::RwLock`.

use crate::error::Result;
use crate::file_handler::{LineIndex, MappedFile};
use crate::source::{Line, LineProvider};
use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct Inner {
    file: MappedFile,
    index: LineIndex,
}

/// Provides lines from a single file by original index.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl FileSource {
    /// Open a file and build its line index in one pass.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = MappedFile::open(path)?;
        let index = LineIndex::build(&file);
        Ok(Self {
            path: path.to_path_buf(),
            inner: RwLock::new(Inner { file, index }),
        })
    }

    /// Path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes as of the last refresh.
    pub fn size(&self) -> u64 {
        self.inner.read().file.size()
    }

    /// Byte offset of a line start.
    pub fn byte_offset(&self, index: usize) -> Option<u64> {
        self.inner.read().index.byte_offset(index)
    }

    /// Check whether the file has grown; if so, remap it and index the new
    /// content. Returns the number of new lines.
    pub fn refresh(&self) -> Result<usize> {
        let mut inner = self.inner.write();
        let old_size = inner.file.size();
        let old_count = inner.index.line_count();

        if !inner.file.refresh()? {
            return Ok(0);
        }

        let Inner { file, index } = &mut *inner;
        index.append_from(file, old_size);
        Ok(index.line_count() - old_count)
    }

    /// Timestamp of a line, parsed lazily and cached.
    pub fn timestamp(&self, index: usize) -> Option<DateTime<Local>> {
        let mut inner = self.inner.write();
        let Inner { file, index: idx } = &mut *inner;
        idx.timestamp(file, index)
    }

    /// First line whose timestamp is at or after `target`.
    pub fn find_line_at_time(&self, target: DateTime<Local>) -> Option<usize> {
        let mut inner = self.inner.write();
        let Inner { file, index } = &mut *inner;
        index.find_line_at_time(file, target)
    }

    /// Last line whose timestamp is before `target`.
    pub fn find_line_before_time(&self, target: DateTime<Local>) -> Option<usize> {
        let mut inner = self.inner.write();
        let Inner { file, index } = &mut *inner;
        index.find_line_before_time(file, target)
    }

    /// Line with the timestamp closest to `target`; ties favor the earlier.
    pub fn find_nearest_line_at_time(&self, target: DateTime<Local>) -> Option<usize> {
        let mut inner = self.inner.write();
        let Inner { file, index } = &mut *inner;
        index.find_nearest_line_at_time(file, target)
    }
}

impl LineProvider for FileSource {
    fn line_count(&self) -> usize {
        self.inner.read().index.line_count()
    }

    fn get_line(&self, index: usize) -> Option<Line> {
        let inner = self.inner.read();
        let content = inner.index.get_line(&inner.file, index)?;
        Some(Line::new(
            String::from_utf8_lossy(&content).into_owned(),
            index,
        ))
    }

    fn original_line_number(&self, index: usize) -> Option<usize> {
        if index < self.line_count() {
            Some(index)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source(content: &str) -> (NamedTempFile, FileSource) {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        let src = FileSource::open(file.path()).unwrap();
        (file, src)
    }

    #[test]
    fn test_get_line_identity_mapping() {
        let (_f, src) = source("alpha\nbeta\ngamma\n");
        assert_eq!(src.line_count(), 3);

        let line = src.get_line(1).unwrap();
        assert_eq!(line.content, "beta");
        assert_eq!(line.original_index, 1);
        assert_eq!(src.original_line_number(1), Some(1));
        assert_eq!(src.original_line_number(3), None);
    }

    #[test]
    fn test_get_lines_clamps_at_eof() {
        let (_f, src) = source("a\nb\nc\n");
        let lines = src.get_lines(1, 10);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content, "b");
        assert_eq!(lines[1].original_index, 2);

        assert!(src.get_lines(10, 5).is_empty());
    }

    #[test]
    fn test_refresh_counts_new_lines() {
        let (mut f, src) = source("one\n");
        assert_eq!(src.refresh().unwrap(), 0);

        f.write_all(b"two\nthree\n").unwrap();
        f.flush().unwrap();

        assert_eq!(src.refresh().unwrap(), 2);
        assert_eq!(src.line_count(), 3);
        assert_eq!(src.get_line(2).unwrap().content, "three");
    }

    #[test]
    fn test_shared_source_sees_refresh() {
        let (mut f, src) = source("one\n");
        let src = std::sync::Arc::new(src);
        let other = std::sync::Arc::clone(&src);

        f.write_all(b"two\n").unwrap();
        f.flush().unwrap();

        // Refresh through one handle is observed through the other
        assert_eq!(src.refresh().unwrap(), 1);
        assert_eq!(other.line_count(), 2);
        assert_eq!(other.get_line(1).unwrap().content, "two");
    }

    #[test]
    fn test_time_queries() {
        let (_f, src) = source("2024-01-15 09:00:00 a\n2024-01-15 10:00:00 b\n");
        let target = Local.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(src.find_line_at_time(target), Some(1));
        assert_eq!(src.find_line_before_time(target), Some(0));
        assert_eq!(
            src.timestamp(0),
            Some(Local.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap())
        );
    }
}
