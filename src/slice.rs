//! Materializing line ranges to on-disk cache files.
//!
//! A slice copies a contiguous original-line range (or the currently visible
//! filtered lines) into a file under the OS temp directory, which the pane
//! then opens in place of its current source. Panes keep slices on a LIFO
//! stack; the stack ordering itself records the parent relationship, so no
//! back pointers are needed.

use crate::error::{MlessError, Result};
use crate::source::{FileSource, FilteredProvider, LineProvider};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Metadata about one materialized slice.
#[derive(Debug, Clone)]
pub struct SliceInfo {
    /// File the slice was cut from
    pub source_path: PathBuf,
    /// Materialized cache file
    pub cache_path: PathBuf,
    /// First original line (inclusive) at the moment of slicing
    pub start_line: usize,
    /// Past-the-end original line at the moment of slicing
    pub end_line: usize,
}

/// Extracts portions of files into cache files.
#[derive(Debug, Clone)]
pub struct Slicer {
    cache_dir: PathBuf,
}

impl Slicer {
    pub fn new() -> Self {
        Self {
            cache_dir: std::env::temp_dir(),
        }
    }

    /// Use an explicit cache directory (tests).
    pub fn with_cache_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: dir.into(),
        }
    }

    /// Materialize lines `[start, end)` of `source` to a cache file.
    ///
    /// Both bounds are clamped to the source's line count; an empty range
    /// after clamping is an error.
    pub fn slice_range(
        &self,
        source: &FileSource,
        start: usize,
        end: usize,
    ) -> Result<SliceInfo> {
        let total = source.line_count();
        let start = start.min(total);
        let end = end.min(total);
        if start >= end {
            return Err(MlessError::invalid_range(format!("{start}-{end}")));
        }

        let cache_path = self.cache_dir.join(format!(
            "mless-slice-{start}-{end}-{}",
            basename(source.path())
        ));

        log::debug!(
            "slicing {}..{} of {} to {}",
            start,
            end,
            source.path().display(),
            cache_path.display()
        );

        self.write_lines(&cache_path, (start..end).filter_map(|i| source.get_line(i)))?;

        Ok(SliceInfo {
            source_path: source.path().to_path_buf(),
            cache_path,
            start_line: start,
            end_line: end,
        })
    }

    /// Materialize only the lines visible through `filtered`.
    ///
    /// With no active filter this is the whole file.
    pub fn slice_filtered(
        &self,
        source: &FileSource,
        filtered: &FilteredProvider,
    ) -> Result<SliceInfo> {
        if !filtered.is_filtered() {
            return self.slice_range(source, 0, source.line_count());
        }

        let cache_path = self
            .cache_dir
            .join(format!("mless-slice-filtered-{}", basename(source.path())));

        let count = filtered.line_count();
        self.write_lines(&cache_path, (0..count).filter_map(|i| filtered.get_line(i)))?;

        Ok(SliceInfo {
            source_path: source.path().to_path_buf(),
            cache_path,
            start_line: 0,
            end_line: count,
        })
    }

    fn write_lines(
        &self,
        cache_path: &Path,
        lines: impl Iterator<Item = crate::source::Line>,
    ) -> Result<()> {
        let out = File::create(cache_path)
            .map_err(|e| MlessError::file_error("Failed to create slice file", e))?;
        let mut writer = BufWriter::new(out);

        let result: std::io::Result<()> = (|| {
            for line in lines {
                writer.write_all(line.content.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()
        })();

        if let Err(e) = result {
            let _ = std::fs::remove_file(cache_path);
            return Err(MlessError::file_error("Failed to write slice file", e));
        }
        Ok(())
    }

    /// Remove a slice's cache file.
    pub fn cleanup(&self, info: &SliceInfo) -> Result<()> {
        std::fs::remove_file(&info.cache_path)
            .map_err(|e| MlessError::file_error("Failed to remove slice cache", e))
    }
}

impl Default for Slicer {
    fn default() -> Self {
        Self::new()
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string())
}
