//! A single file view with its own filter, viewport, marks, search state,
//! slice stack, and follow flag.
//!
//! Panes may share a [`FileSource`] (split views page the same mapping) but
//! everything else is exclusively owned. Slice push/pop swaps the pane onto
//! a materialized cache file: the replacement source is opened before the
//! old one is discarded, so a failed swap leaves the pane untouched. Marks
//! store raw original line numbers and are preserved across slice swaps even
//! though the coordinate space changes; jumping to a mark outside the
//! current slice is a no-op.

use crate::config::Config;
use crate::error::{MlessError, Result};
use crate::logformat::{parse_time_input, Level, LevelDetector};
use crate::range::{parse_range, ResolveContext};
use crate::render::{LevelRenderer, Renderer};
use crate::slice::{SliceInfo, Slicer};
use crate::source::{FileSource, FilteredProvider, LineProvider};
use crate::viewport::Viewport;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a time jump that resolved to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeJump {
    /// The viewport moved to the line
    Jumped { original: usize },
    /// The line exists but the active filter hides it; the viewport stayed
    Hidden { original: usize },
}

/// Per-view state over a file source.
pub struct Pane {
    source: Arc<FileSource>,
    filtered: FilteredProvider,
    viewport: Viewport,
    renderer: Box<dyn Renderer>,
    config: Arc<Config>,

    filename: String,
    source_path: PathBuf,
    cache_path: Option<PathBuf>,
    is_cached: bool,

    following: bool,

    slicer: Slicer,
    slice_stack: Vec<SliceInfo>,

    marks: BTreeMap<char, usize>,

    search_term: String,
    search_results: Vec<usize>,
    search_index: usize,

    visual_anchor: Option<usize>,
    visual_end: Option<usize>,
}

impl Pane {
    /// Open a pane on a file, optionally paging a local temp copy of it.
    pub fn open(path: impl AsRef<Path>, config: Arc<Config>, cache_file: bool) -> Result<Self> {
        let path = path.as_ref();

        let (actual_path, cache_path) = if cache_file {
            let cache = cache_file_path(path);
            std::fs::copy(path, &cache).map_err(|e| MlessError::from_io(path, e))?;
            (cache.clone(), Some(cache))
        } else {
            (path.to_path_buf(), None)
        };

        let source = match FileSource::open(&actual_path) {
            Ok(source) => Arc::new(source),
            Err(e) => {
                if let Some(cache) = &cache_path {
                    let _ = std::fs::remove_file(cache);
                }
                return Err(e);
            }
        };

        let filtered = make_filtered(&source, &config);
        let viewport = Viewport::new(80, 24, &config);
        let renderer = Box::new(LevelRenderer::new(&config));

        Ok(Self {
            source,
            filtered,
            viewport,
            renderer,
            is_cached: cache_path.is_some(),
            cache_path,
            filename: basename(path),
            source_path: path.to_path_buf(),
            config,
            following: false,
            slicer: Slicer::new(),
            slice_stack: Vec::new(),
            marks: BTreeMap::new(),
            search_term: String::new(),
            search_results: Vec::new(),
            search_index: 0,
            visual_anchor: None,
            visual_end: None,
        })
    }

    /// Duplicate for a split: shares the file source, everything else fresh.
    pub fn duplicate(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            filtered: make_filtered(&self.source, &self.config),
            viewport: Viewport::new(80, 24, &self.config),
            renderer: Box::new(LevelRenderer::new(&self.config)),
            config: Arc::clone(&self.config),
            filename: self.filename.clone(),
            source_path: self.source.path().to_path_buf(),
            cache_path: None,
            is_cached: self.is_cached,
            following: false,
            slicer: Slicer::new(),
            slice_stack: Vec::new(),
            marks: BTreeMap::new(),
            search_term: String::new(),
            search_results: Vec::new(),
            search_index: 0,
            visual_anchor: None,
            visual_end: None,
        }
    }

    // --- accessors -------------------------------------------------------

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn source(&self) -> &Arc<FileSource> {
        &self.source
    }

    pub fn filtered(&self) -> &FilteredProvider {
        &self.filtered
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn is_cached(&self) -> bool {
        self.is_cached
    }

    pub fn current_slice(&self) -> Option<&SliceInfo> {
        self.slice_stack.last()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn search_results(&self) -> &[usize] {
        &self.search_results
    }

    pub fn marks(&self) -> &BTreeMap<char, usize> {
        &self.marks
    }

    /// Original line behind the top of the viewport.
    pub fn current_original_line(&self) -> usize {
        self.filtered
            .original_line_number(self.viewport.current_line())
            .unwrap_or(0)
    }

    /// Timestamp of the current line, if one parses.
    pub fn current_timestamp(&self) -> Option<DateTime<Local>> {
        self.source.timestamp(self.current_original_line())
    }

    pub fn percent_scrolled(&self) -> f64 {
        self.viewport.percent_scrolled(&self.filtered)
    }

    // --- navigation ------------------------------------------------------

    pub fn scroll_down(&mut self, n: usize) {
        self.viewport.scroll_down(n, &self.filtered);
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.viewport.scroll_up(n);
    }

    pub fn page_down(&mut self) {
        self.viewport.page_down(&self.filtered);
    }

    pub fn page_up(&mut self) {
        self.viewport.page_up();
    }

    pub fn goto_top(&mut self) {
        self.viewport.goto_top();
    }

    pub fn goto_bottom(&mut self) {
        self.viewport.goto_bottom(&self.filtered);
    }

    /// Direct filtered-index seek.
    pub fn goto_line(&mut self, line: usize) {
        self.viewport.goto_line(line, &self.filtered);
    }

    pub fn scroll_left(&mut self, n: usize) {
        self.viewport.scroll_left(n);
    }

    pub fn scroll_right(&mut self, n: usize) {
        self.viewport.scroll_right(n);
    }

    pub fn reset_horizontal(&mut self) {
        self.viewport.reset_horizontal();
    }

    pub fn toggle_wrap(&mut self) -> bool {
        self.viewport.toggle_wrap()
    }

    pub fn toggle_line_numbers(&mut self) -> bool {
        self.viewport.toggle_line_numbers()
    }

    /// Jump the viewport to an original line if the filter shows it.
    /// Returns whether the viewport moved.
    fn jump_to_original(&mut self, original: usize) -> bool {
        let Some(filtered_index) = self.filtered.filtered_index_for(original) else {
            return false;
        };
        self.viewport.goto_line(filtered_index, &self.filtered);
        if let Some(actual) = self.filtered.original_line_number(filtered_index) {
            self.viewport.set_highlight(actual);
        }
        true
    }

    // --- refresh / follow ------------------------------------------------

    /// Pick up file growth; the filter index is rebuilt on the next read.
    pub fn refresh(&mut self) -> Result<bool> {
        let grew = self.source.refresh()? > 0;
        if grew {
            self.filtered.mark_dirty();
        }
        Ok(grew)
    }

    pub fn toggle_following(&mut self) -> bool {
        self.following = !self.following;
        if self.following {
            self.goto_bottom();
        }
        self.following
    }

    pub fn stop_following(&mut self) {
        self.following = false;
    }

    /// Follow-tick body: refresh and, while following, stick to the bottom.
    pub fn check_for_new_lines(&mut self) -> Result<bool> {
        let grew = self.refresh()?;
        if grew && self.following {
            self.goto_bottom();
        }
        Ok(grew)
    }

    // --- filters ---------------------------------------------------------

    pub fn toggle_level(&mut self, level: Level) {
        self.filtered.toggle_level(level);
        self.viewport.goto_top();
    }

    pub fn set_level_and_above(&mut self, level: Level) {
        self.filtered.set_level_and_above(level);
        self.viewport.goto_top();
    }

    pub fn clear_filters(&mut self) {
        self.filtered.clear_all();
        self.viewport.goto_top();
    }

    /// Clear all filters but keep the viewport on the same original line,
    /// mapped through the reverse index.
    pub fn clear_filters_preserving_position(&mut self) {
        let original = self.current_original_line();
        self.filtered.clear_all();
        if let Some(index) = self.filtered.filtered_index_for(original) {
            self.viewport.goto_line(index, &self.filtered);
        } else {
            self.viewport.goto_top();
        }
    }

    /// Live substring filter; an empty string clears it.
    pub fn set_text_filter(&mut self, text: &str) {
        self.filtered.set_text_filter(text);
        self.viewport.goto_top();
    }

    pub fn clear_text_filter(&mut self) {
        self.filtered.clear_text_filter();
        self.viewport.goto_top();
    }

    // --- search ----------------------------------------------------------

    /// Find all original lines containing `term` and jump to the first.
    pub fn perform_search(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.search_results.clear();
        self.search_index = 0;

        if term.is_empty() {
            self.viewport.clear_highlight();
            return;
        }

        let total = self.source.line_count();
        for i in 0..total {
            if let Some(line) = self.source.get_line(i) {
                if line.content.contains(term) {
                    self.search_results.push(i);
                }
            }
        }

        if let Some(&first) = self.search_results.first() {
            self.jump_to_original(first);
        } else {
            self.viewport.clear_highlight();
        }
    }

    pub fn next_search_result(&mut self) {
        if self.search_results.is_empty() {
            return;
        }
        self.search_index = (self.search_index + 1) % self.search_results.len();
        self.jump_to_original(self.search_results[self.search_index]);
    }

    pub fn prev_search_result(&mut self) {
        if self.search_results.is_empty() {
            return;
        }
        self.search_index = self
            .search_index
            .checked_sub(1)
            .unwrap_or(self.search_results.len() - 1);
        self.jump_to_original(self.search_results[self.search_index]);
    }

    pub fn clear_search(&mut self) {
        self.search_term.clear();
        self.search_results.clear();
        self.search_index = 0;
        self.viewport.clear_highlight();
    }

    // --- marks -----------------------------------------------------------

    pub fn set_mark(&mut self, mark: char) {
        if mark.is_ascii_lowercase() {
            self.marks.insert(mark, self.current_original_line());
        }
    }

    /// Jump to a mark; unset marks and marks hidden by the filter are
    /// silent no-ops. Returns whether the viewport moved.
    pub fn jump_to_mark(&mut self, mark: char) -> bool {
        let Some(&original) = self.marks.get(&mark) else {
            return false;
        };
        self.jump_to_original(original)
    }

    /// Jump to the next mark by line order, wrapping to the first.
    pub fn next_mark(&mut self) {
        if self.marks.is_empty() {
            return;
        }
        let current = self.current_original_line();
        let lines: Vec<usize> = sorted_mark_lines(&self.marks);
        let target = lines
            .iter()
            .copied()
            .find(|&l| l > current)
            .unwrap_or(lines[0]);
        self.jump_to_original(target);
    }

    /// Jump to the previous mark by line order, wrapping to the last.
    pub fn prev_mark(&mut self) {
        let current = self.current_original_line();
        let lines: Vec<usize> = sorted_mark_lines(&self.marks);
        let Some(&last) = lines.last() else {
            return;
        };
        let target = lines
            .iter()
            .rev()
            .copied()
            .find(|&l| l < current)
            .unwrap_or(last);
        self.jump_to_original(target);
    }

    // --- time jumps ------------------------------------------------------

    /// Jump to the first line at or after the given time.
    pub fn goto_time(&mut self, input: &str) -> Result<TimeJump> {
        let reference = self.source.timestamp(0);
        let target =
            parse_time_input(input, reference).ok_or_else(|| MlessError::time_unresolved(input))?;
        let original = self
            .source
            .find_line_at_time(target)
            .ok_or_else(|| MlessError::time_unresolved(input))?;

        if self.jump_to_original(original) {
            Ok(TimeJump::Jumped { original })
        } else {
            Ok(TimeJump::Hidden { original })
        }
    }

    // --- slices ----------------------------------------------------------

    /// Parse a range expression against the pane's context and slice to it.
    pub fn parse_and_slice(&mut self, expr: &str) -> Result<()> {
        let (start, end) = {
            let ctx = ResolveContext {
                current: self.current_original_line(),
                total: self.source.line_count(),
                marks: &self.marks,
                source: &self.source,
            };
            parse_range(expr, &ctx)?
        };
        self.perform_slice(start, end)
    }

    /// Slice from the current line to the end of the source.
    pub fn slice_from_current(&mut self) -> Result<()> {
        let start = self.current_original_line();
        self.perform_slice(start, self.source.line_count())
    }

    /// Materialize `[start, end)` and swap the pane onto the cache file.
    pub fn perform_slice(&mut self, start: usize, end: usize) -> Result<()> {
        let info = self.slicer.slice_range(&self.source, start, end)?;
        match FileSource::open(&info.cache_path) {
            Ok(new_source) => {
                self.slice_stack.push(info);
                self.install_source(new_source);
                self.is_cached = true;
                Ok(())
            }
            Err(e) => {
                let _ = self.slicer.cleanup(&info);
                Err(e)
            }
        }
    }

    /// Materialize the currently visible (filtered) lines and page them.
    pub fn slice_filtered_view(&mut self) -> Result<()> {
        let info = self.slicer.slice_filtered(&self.source, &self.filtered)?;
        match FileSource::open(&info.cache_path) {
            Ok(new_source) => {
                self.slice_stack.push(info);
                self.install_source(new_source);
                self.is_cached = true;
                Ok(())
            }
            Err(e) => {
                let _ = self.slicer.cleanup(&info);
                Err(e)
            }
        }
    }

    /// Pop the slice stack and reopen the parent file. Marks are preserved.
    pub fn revert_slice(&mut self) -> Result<()> {
        let Some(top) = self.slice_stack.last() else {
            return Ok(());
        };

        // The file that was open when this slice was cut
        let parent_path = top.source_path.clone();
        let new_source = FileSource::open(&parent_path)?;

        if let Some(popped) = self.slice_stack.pop() {
            if let Err(e) = self.slicer.cleanup(&popped) {
                log::debug!("slice cleanup failed: {e}");
            }
        }
        self.install_source(new_source);
        self.is_cached = !self.slice_stack.is_empty()
            || self.cache_path.as_deref() == Some(parent_path.as_path());
        Ok(())
    }

    /// Re-copy the original file over the local cache and reload it.
    pub fn resync_from_source(&mut self) -> Result<()> {
        if !self.is_cached {
            return Ok(());
        }
        let Some(cache_path) = self.cache_path.clone() else {
            return Ok(());
        };

        std::fs::copy(&self.source_path, &cache_path)
            .map_err(|e| MlessError::from_io(&self.source_path, e))?;
        let new_source = FileSource::open(&cache_path)?;
        self.install_source(new_source);
        Ok(())
    }

    /// Swap to a new source: fresh filter, viewport reset, search cleared.
    fn install_source(&mut self, new_source: FileSource) {
        self.source = Arc::new(new_source);
        self.filtered = make_filtered(&self.source, &self.config);
        self.viewport.goto_top();
        self.viewport.reset_horizontal();
        self.clear_search();
        self.end_visual();
    }

    // --- visual selection & yank ----------------------------------------

    pub fn start_visual(&mut self) {
        let current = self.current_original_line();
        self.visual_anchor = Some(current);
        self.visual_end = Some(current);
        self.viewport.set_visual(Some((current, current)));
    }

    /// Extend the selection end to the current line after a motion.
    pub fn update_visual_end(&mut self) {
        if self.visual_anchor.is_none() {
            return;
        }
        self.visual_end = Some(self.current_original_line());
        self.viewport.set_visual(self.visual_range());
    }

    pub fn end_visual(&mut self) {
        self.visual_anchor = None;
        self.visual_end = None;
        self.viewport.set_visual(None);
    }

    /// Inclusive selected range in original line numbers.
    pub fn visual_range(&self) -> Option<(usize, usize)> {
        let (anchor, end) = (self.visual_anchor?, self.visual_end?);
        Some((anchor.min(end), anchor.max(end)))
    }

    /// Collect the visible lines whose original index falls inside the
    /// visual selection.
    pub fn yank_visual(&self) -> Vec<String> {
        let Some((start, end)) = self.visual_range() else {
            return Vec::new();
        };
        let mut lines = Vec::new();
        for k in 0..self.filtered.line_count() {
            let Some(line) = self.filtered.get_line(k) else {
                continue;
            };
            if line.original_index >= start && line.original_index <= end {
                lines.push(line.content);
            }
        }
        lines
    }

    /// Yank `count` visible lines starting at the current position.
    pub fn yank_lines(&self, count: usize) -> Vec<String> {
        self.filtered
            .get_lines(self.viewport.current_line(), count)
            .into_iter()
            .map(|l| l.content)
            .collect()
    }

    /// Yank the visible lines between the current line and a mark,
    /// inclusive on both ends. `None` when the mark is unset.
    pub fn yank_to_mark(&self, mark: char) -> Option<Vec<String>> {
        let &mark_line = self.marks.get(&mark)?;
        let current = self.current_original_line();
        let (start, end) = (current.min(mark_line), current.max(mark_line));

        let mut lines = Vec::new();
        for k in 0..self.filtered.line_count() {
            let line = self.filtered.get_line(k)?;
            if line.original_index >= start && line.original_index <= end {
                lines.push(line.content);
            }
        }
        Some(lines)
    }

    // --- rendering -------------------------------------------------------

    /// Lay the pane out as `height` rows of `width` columns.
    pub fn render(&mut self, width: usize, height: usize) -> Vec<String> {
        self.viewport.set_size(width, height, &self.filtered);
        let reverse: BTreeMap<usize, char> =
            self.marks.iter().map(|(&c, &line)| (line, c)).collect();
        self.viewport.set_marks(reverse);
        self.viewport.render(&self.filtered, self.renderer.as_ref())
    }
}

impl Drop for Pane {
    fn drop(&mut self) {
        for info in self.slice_stack.drain(..) {
            let _ = std::fs::remove_file(&info.cache_path);
        }
        if let Some(cache) = self.cache_path.take() {
            let _ = std::fs::remove_file(cache);
        }
    }
}

fn make_filtered(source: &Arc<FileSource>, config: &Config) -> FilteredProvider {
    FilteredProvider::new(
        Arc::clone(source) as Arc<dyn LineProvider>,
        LevelDetector::new(&config.log_levels),
    )
}

fn cache_file_path(path: &Path) -> PathBuf {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    path.hash(&mut hasher);
    std::env::temp_dir().join(format!(
        "mless-{:08x}-{}",
        hasher.finish() as u32,
        basename(path)
    ))
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string())
}

fn sorted_mark_lines(marks: &BTreeMap<char, usize>) -> Vec<usize> {
    let mut lines: Vec<usize> = marks.values().copied().collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn pane_for(content: &str) -> (NamedTempFile, Pane) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        let pane = Pane::open(file.path(), Arc::new(Config::default()), false).unwrap();
        (file, pane)
    }

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn test_open_missing_file() {
        let result = Pane::open("/no/such/file.log", Arc::new(Config::default()), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_scrolling_and_current_line() {
        let (_f, mut pane) = pane_for(&numbered(100));
        pane.render(80, 10);

        pane.scroll_down(5);
        assert_eq!(pane.current_original_line(), 5);

        pane.scroll_up(2);
        assert_eq!(pane.current_original_line(), 3);

        pane.goto_bottom();
        assert_eq!(pane.viewport().current_line(), 90);

        pane.goto_top();
        assert_eq!(pane.current_original_line(), 0);
    }

    #[test]
    fn test_search_jumps_and_steps() {
        let (_f, mut pane) = pane_for("a\nneedle one\nb\nneedle two\nc\nd\ne\nf\n");
        pane.render(80, 3);

        pane.perform_search("needle");
        assert_eq!(pane.search_results(), &[1, 3]);
        assert_eq!(pane.viewport().current_line(), 1);

        pane.next_search_result();
        assert_eq!(pane.viewport().current_line(), 3);

        // Wraps around
        pane.next_search_result();
        assert_eq!(pane.viewport().current_line(), 1);

        pane.prev_search_result();
        assert_eq!(pane.viewport().current_line(), 3);

        pane.clear_search();
        assert!(pane.search_results().is_empty());
        assert_eq!(pane.search_term(), "");
    }

    #[test]
    fn test_marks_set_jump_traverse() {
        let (_f, mut pane) = pane_for(&numbered(50));
        pane.render(80, 5);

        pane.scroll_down(10);
        pane.set_mark('a');
        pane.scroll_down(20);
        pane.set_mark('b');

        assert!(pane.jump_to_mark('a'));
        assert_eq!(pane.viewport().current_line(), 10);

        // Unset mark is a silent no-op
        assert!(!pane.jump_to_mark('z'));
        assert_eq!(pane.viewport().current_line(), 10);

        pane.next_mark();
        assert_eq!(pane.viewport().current_line(), 30);
        // Wraps to the first mark
        pane.next_mark();
        assert_eq!(pane.viewport().current_line(), 10);

        pane.prev_mark();
        assert_eq!(pane.viewport().current_line(), 30);
    }

    #[test]
    fn test_level_filter_and_clear_preserving_position() {
        let (_f, mut pane) = pane_for(
            "[INF] zero\n[ERR] one\n[INF] two\n[ERR] three\n[INF] four\n",
        );
        pane.render(80, 1);

        pane.set_level_and_above(Level::Error);
        assert_eq!(pane.filtered().line_count(), 2);

        // Move to the second visible line (original 3)
        pane.scroll_down(1);
        assert_eq!(pane.current_original_line(), 3);

        pane.clear_filters_preserving_position();
        assert!(!pane.filtered().is_filtered());
        assert_eq!(pane.current_original_line(), 3);
    }

    #[test]
    fn test_slice_and_revert() {
        let (_f, mut pane) = pane_for(&numbered(1000));
        pane.render(80, 10);

        pane.perform_slice(100, 200).unwrap();
        assert_eq!(pane.source().line_count(), 100);
        assert_eq!(pane.source().get_line(0).unwrap().content, "line 100");
        assert!(pane.is_cached());

        let cache = pane.current_slice().unwrap().cache_path.clone();
        assert!(cache.exists());

        pane.revert_slice().unwrap();
        assert_eq!(pane.source().line_count(), 1000);
        assert!(!cache.exists());
        assert!(pane.current_slice().is_none());
        assert!(!pane.is_cached());
    }

    #[test]
    fn test_nested_slices_revert_in_order() {
        let (_f, mut pane) = pane_for(&numbered(1000));
        pane.render(80, 10);

        pane.perform_slice(0, 500).unwrap();
        pane.perform_slice(100, 200).unwrap();
        assert_eq!(pane.source().line_count(), 100);

        pane.revert_slice().unwrap();
        assert_eq!(pane.source().line_count(), 500);

        pane.revert_slice().unwrap();
        assert_eq!(pane.source().line_count(), 1000);
    }

    #[test]
    fn test_slice_preserves_marks() {
        let (_f, mut pane) = pane_for(&numbered(100));
        pane.render(80, 5);
        pane.scroll_down(42);
        pane.set_mark('a');

        pane.perform_slice(0, 50).unwrap();
        assert_eq!(pane.marks().get(&'a'), Some(&42));
    }

    #[test]
    fn test_invalid_slice_leaves_pane_untouched() {
        let (_f, mut pane) = pane_for(&numbered(10));
        pane.render(80, 5);

        assert!(pane.perform_slice(8, 3).is_err());
        assert_eq!(pane.source().line_count(), 10);
        assert!(pane.current_slice().is_none());
    }

    #[test]
    fn test_parse_and_slice_expression() {
        let (_f, mut pane) = pane_for(&numbered(1000));
        pane.render(80, 10);

        // 1-based inclusive input becomes the 0-based half-open [99, 199)
        pane.parse_and_slice("100-200").unwrap();
        assert_eq!(pane.source().line_count(), 100);
        assert_eq!(pane.source().get_line(0).unwrap().content, "line 99");
    }

    #[test]
    fn test_slice_from_current() {
        let (_f, mut pane) = pane_for(&numbered(100));
        pane.render(80, 5);
        pane.scroll_down(90);

        pane.slice_from_current().unwrap();
        assert_eq!(pane.source().line_count(), 10);
        assert_eq!(pane.source().get_line(0).unwrap().content, "line 90");
    }

    #[test]
    fn test_slice_filtered_view() {
        let (_f, mut pane) = pane_for("[ERR] a\n[INF] b\n[ERR] c\n");
        pane.render(80, 5);
        pane.set_level_and_above(Level::Error);

        pane.slice_filtered_view().unwrap();
        assert_eq!(pane.source().line_count(), 2);
        assert!(!pane.filtered().is_filtered());
        assert_eq!(pane.source().get_line(1).unwrap().content, "[ERR] c");
    }

    #[test]
    fn test_goto_time_hidden_by_filter() {
        let (_f, mut pane) = pane_for(
            "2024-01-15 12:00:00 [ERR] a\n2024-01-15 12:30:00 [INF] b\n2024-01-15 13:00:00 [ERR] c\n",
        );
        pane.render(80, 2);
        pane.filtered().set_only_level(Level::Error);

        // 12:30 resolves to original line 1, which the filter hides
        let outcome = pane.goto_time("12:30").unwrap();
        assert_eq!(outcome, TimeJump::Hidden { original: 1 });
        assert_eq!(pane.viewport().current_line(), 0);

        let outcome = pane.goto_time("13:00").unwrap();
        assert_eq!(outcome, TimeJump::Jumped { original: 2 });
    }

    #[test]
    fn test_goto_time_unresolved() {
        let (_f, mut pane) = pane_for("2024-01-15 12:00:00 only line\n");
        pane.render(80, 2);

        assert!(matches!(
            pane.goto_time("23:59"),
            Err(MlessError::TimeUnresolved { .. })
        ));
        assert!(matches!(
            pane.goto_time("gibberish"),
            Err(MlessError::TimeUnresolved { .. })
        ));
    }

    #[test]
    fn test_follow_growth() {
        let mut file = NamedTempFile::new().unwrap();
        file.flush().unwrap();
        let mut pane = Pane::open(file.path(), Arc::new(Config::default()), false).unwrap();
        pane.render(80, 5);
        assert!(pane.toggle_following());

        // Tick with no growth
        assert!(!pane.check_for_new_lines().unwrap());

        file.write_all(b"X\n").unwrap();
        file.flush().unwrap();

        assert!(pane.check_for_new_lines().unwrap());
        assert_eq!(pane.filtered().line_count(), 1);
        assert_eq!(pane.filtered().get_line(0).unwrap().content, "X");
    }

    #[test]
    fn test_visual_selection_and_yank() {
        let (_f, mut pane) = pane_for(&numbered(20));
        pane.render(80, 5);

        pane.scroll_down(3);
        pane.start_visual();
        pane.scroll_down(2);
        pane.update_visual_end();

        assert_eq!(pane.visual_range(), Some((3, 5)));
        assert_eq!(pane.yank_visual(), vec!["line 3", "line 4", "line 5"]);

        pane.end_visual();
        assert!(pane.visual_range().is_none());
    }

    #[test]
    fn test_yank_lines_and_to_mark() {
        let (_f, mut pane) = pane_for(&numbered(20));
        pane.render(80, 5);

        assert_eq!(pane.yank_lines(2), vec!["line 0", "line 1"]);

        pane.scroll_down(5);
        pane.set_mark('m');
        pane.goto_top();
        assert_eq!(pane.yank_to_mark('m').unwrap().len(), 6);
        assert!(pane.yank_to_mark('q').is_none());
    }

    #[test]
    fn test_cached_pane_and_resync() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"one\n").unwrap();
        file.flush().unwrap();

        let mut pane = Pane::open(file.path(), Arc::new(Config::default()), true).unwrap();
        assert!(pane.is_cached());
        assert_ne!(pane.source().path(), file.path());
        assert_eq!(pane.source().line_count(), 1);

        // Growth of the original is not visible through the cache copy
        file.write_all(b"two\n").unwrap();
        file.flush().unwrap();
        assert!(!pane.refresh().unwrap());

        pane.resync_from_source().unwrap();
        assert_eq!(pane.source().line_count(), 2);
    }

    #[test]
    fn test_drop_removes_slice_caches() {
        let (_f, mut pane) = pane_for(&numbered(100));
        pane.render(80, 5);
        pane.perform_slice(10, 20).unwrap();
        let cache = pane.current_slice().unwrap().cache_path.clone();
        assert!(cache.exists());

        drop(pane);
        assert!(!cache.exists());
    }
}
