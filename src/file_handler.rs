//! File access for the pager: memory-mapped byte source and line index.
//!
//! [`mmap::MappedFile`] provides read-only random access to file bytes with
//! growth detection, and [`line_index::LineIndex`] maintains the ordered
//! line-start offsets plus a lazily populated timestamp cache on top of it.
//! Everything above this layer addresses the file by line number only.

pub mod line_index;
pub mod mmap;

pub use line_index::LineIndex;
pub use mmap::MappedFile;
