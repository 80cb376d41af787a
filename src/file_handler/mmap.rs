//! Memory-mapped byte source with growth detection.
//!
//! [`MappedFile`] is an append-only view of a file's bytes: offsets in
//! `[0, size)` are stable once observed. Files that grow on disk are picked
//! up by [`MappedFile::refresh`], which remaps the file wholesale; shrinkage
//! is ignored so readers never see bytes disappear under them.

use crate::error::{MlessError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Read-only memory-mapped access to a file.
///
/// An empty file carries no mapping (mapping zero bytes is not portable);
/// all reads against it come back empty until a refresh observes growth.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    mmap: Option<Mmap>,
    size: u64,
}

impl MappedFile {
    /// Open a file with memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(MlessError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|e| MlessError::from_io(path, e))?;
        let metadata = file
            .metadata()
            .map_err(|e| MlessError::file_error("Failed to read file metadata", e))?;
        if !metadata.is_file() {
            return Err(MlessError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let size = metadata.len();
        let mmap = Self::map_file(&file, size, path)?;

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            size,
        })
    }

    fn map_file(file: &File, size: u64, path: &Path) -> Result<Option<Mmap>> {
        if size == 0 {
            return Ok(None);
        }
        let mmap = unsafe {
            Mmap::map(file).map_err(|e| {
                MlessError::file_error(format!("Failed to memory map {}", path.display()), e)
            })?
        };
        Ok(Some(mmap))
    }

    /// File size in bytes as of the last open or refresh.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Path the mapping was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fill `buf` from the mapped bytes starting at `offset`.
    ///
    /// Returns the number of bytes copied; offsets at or past the known size
    /// yield an empty read.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> usize {
        let Some(mmap) = &self.mmap else { return 0 };
        if offset >= self.size {
            return 0;
        }
        let start = offset as usize;
        let end = (offset + buf.len() as u64).min(self.size) as usize;
        let n = end - start;
        buf[..n].copy_from_slice(&mmap[start..end]);
        n
    }

    /// Read the bytes in `[start, end)`, clamping `end` to the known size.
    ///
    /// Returns an empty vector when `start >= end` after clamping.
    pub fn read_range(&self, start: u64, end: u64) -> Vec<u8> {
        let end = end.min(self.size);
        if start >= end {
            return Vec::new();
        }
        match &self.mmap {
            Some(mmap) => mmap[start as usize..end as usize].to_vec(),
            None => Vec::new(),
        }
    }

    /// Stat the path and remap if the file has grown.
    ///
    /// Returns whether growth occurred. A shrunken file is left alone: the
    /// cached size and mapping are retained.
    pub fn refresh(&mut self) -> Result<bool> {
        let metadata =
            std::fs::metadata(&self.path).map_err(|e| MlessError::from_io(&self.path, e))?;
        let new_size = metadata.len();
        if new_size <= self.size {
            return Ok(false);
        }

        let file = File::open(&self.path).map_err(|e| MlessError::from_io(&self.path, e))?;
        self.mmap = Self::map_file(&file, new_size, &self.path)?;
        self.size = new_size;
        Ok(true)
    }
}
