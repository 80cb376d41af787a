//! The orchestrating model: pane list, split layout, mode machine, and key
//! dispatch.
//!
//! The model is the sole mutator of all pane and viewport state. Terminal
//! events arrive as discrete messages and each is processed to completion;
//! the follow tick is delivered the same way. Errors surfaced by pane
//! operations become transient status messages and never tear the UI down.

use crate::clipboard;
use crate::config::Config;
use crate::error::{MlessError, Result};
use crate::logformat::Level;
use crate::render;
use crate::source::LineProvider;
use crate::ui::pane::TimeJump;
use crate::ui::{Mode, Pane, SplitDirection};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::sync::Arc;

const MIN_PANE_WIDTH: usize = 10;
const MIN_PANE_HEIGHT: usize = 3;
/// Rows reserved below the panes: status bar and help line.
const RESERVED_ROWS: usize = 2;

const HELP_TEXT: &[&str] = &[
    "Navigation",
    "  j/k, arrows     scroll (count prefix applies)",
    "  ctrl+d/ctrl+u   page down / page up",
    "  f/b, space      page down / page up",
    "  g / G           top / bottom (G refreshes first)",
    "  left/right      horizontal scroll",
    "  :               go to line",
    "  ctrl+t          go to time (HH:MM[:SS])",
    "",
    "Filtering",
    "  t d i w e       toggle trace/debug/info/warn/error",
    "  alt+f           toggle fatal",
    "  T D I W E       show level and above",
    "  ?               live text filter",
    "  0               clear filters (keeps position)",
    "",
    "Search & marks",
    "  /               search, n/N next/previous match",
    "  m<a-z> '<a-z>   set / jump to mark, [ ] traverse marks",
    "",
    "Slices",
    "  S               slice range (100-500, .-$, 'a-'b, 13:00-14:00)",
    "  ctrl+s          slice from current line",
    "  x               slice to the filtered view",
    "  R               revert slice / resync cache",
    "",
    "Other",
    "  v               visual selection, y yanks it",
    "  y               yank: yy lines, y'x to mark",
    "  F               follow mode",
    "  ctrl+w v/s/w/q  split / switch / close pane, < > resize",
    "  l / ctrl+l      toggle line numbers / wrap",
    "  =               file info",
    "  q               quit",
];

/// Startup options collected by the CLI.
#[derive(Debug, Default)]
pub struct ModelOptions {
    pub paths: Vec<PathBuf>,
    pub cache_files: bool,
    pub initial_slice: Option<String>,
    pub initial_time: Option<String>,
}

/// The application model. Owns one or two panes and all UI state.
pub struct Model {
    config: Arc<Config>,
    panes: Vec<Pane>,
    active: usize,
    split: SplitDirection,
    split_ratio: f64,
    mode: Mode,
    /// Single-line text input shared by all modal prompts
    input: String,
    status: Option<String>,
    count: Option<usize>,
    pending_yank_mark: bool,
    width: usize,
    height: usize,
    should_quit: bool,
}

impl Model {
    pub fn new(opts: ModelOptions) -> Result<Self> {
        Self::with_config(opts, Config::load())
    }

    pub fn with_config(opts: ModelOptions, config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let mut panes = Vec::new();
        for path in opts.paths.iter().take(2) {
            panes.push(Pane::open(path, Arc::clone(&config), opts.cache_files)?);
        }
        if panes.is_empty() {
            return Err(MlessError::FileNotFound {
                path: PathBuf::new(),
            });
        }

        let split = if panes.len() == 2 {
            SplitDirection::Vertical
        } else {
            SplitDirection::None
        };

        let mut model = Self {
            config,
            panes,
            active: 0,
            split,
            split_ratio: 0.5,
            mode: Mode::Normal,
            input: String::new(),
            status: None,
            count: None,
            pending_yank_mark: false,
            width: 80,
            height: 24,
            should_quit: false,
        };

        if let Some(expr) = &opts.initial_slice {
            model.panes[0].parse_and_slice(expr)?;
        }
        if let Some(time) = &opts.initial_time {
            match model.panes[0].goto_time(time) {
                Ok(TimeJump::Jumped { .. }) => {}
                Ok(TimeJump::Hidden { original }) => {
                    model.status = Some(format!(
                        "Line {} is hidden by the active filter",
                        original + 1
                    ));
                }
                Err(e) => model.status = Some(e.to_string()),
            }
        }

        Ok(model)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn active_pane(&self) -> &Pane {
        &self.panes[self.active]
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    pub fn split(&self) -> SplitDirection {
        self.split
    }

    pub fn any_following(&self) -> bool {
        self.panes.iter().any(Pane::is_following)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    fn pane(&mut self) -> &mut Pane {
        &mut self.panes[self.active]
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            self.status = Some(e.to_string());
        }
    }

    /// Follow tick: poll the active pane for growth.
    pub fn on_tick(&mut self) {
        if self.pane().is_following() {
            let result = self.pane().check_for_new_lines().map(|_| ());
            self.report(result);
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(width, height) => self.resize(width as usize, height as usize),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status = None;

        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Search | Mode::Goto | Mode::GotoTime | Mode::Filter | Mode::Slice => {
                self.handle_prompt_key(key)
            }
            Mode::MarkSet | Mode::MarkJump => self.handle_mark_key(key),
            Mode::SplitCmd => self.handle_split_key(key),
            Mode::Visual => self.handle_visual_key(key),
            Mode::Yank => self.handle_yank_key(key),
            Mode::Help | Mode::FileInfo => self.mode = Mode::Normal,
        }
    }

    fn take_count(&mut self) -> usize {
        self.count.take().unwrap_or(1)
    }

    /// Accumulate a count digit; an isolated `0` clears all filters while
    /// preserving the original-line position. Returns whether the key was
    /// consumed as a digit.
    fn handle_count_digit(&mut self, c: char) -> bool {
        let Some(digit) = c.to_digit(10) else {
            return false;
        };
        if digit == 0 && self.count.is_none() {
            self.pane().clear_filters_preserving_position();
            return true;
        }
        self.count = Some(
            self.count
                .unwrap_or(0)
                .saturating_mul(10)
                .saturating_add(digit as usize),
        );
        true
    }

    fn enter_prompt(&mut self, mode: Mode) {
        self.mode = mode;
        self.input.clear();
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('d') | KeyCode::Char('f') => self.pane().page_down(),
                KeyCode::Char('u') | KeyCode::Char('b') => self.pane().page_up(),
                KeyCode::Char('t') => self.enter_prompt(Mode::GotoTime),
                KeyCode::Char('s') => {
                    let result = self.pane().slice_from_current();
                    self.report(result);
                }
                KeyCode::Char('w') => self.mode = Mode::SplitCmd,
                KeyCode::Char('l') => {
                    self.pane().toggle_wrap();
                }
                _ => {}
            }
            self.count = None;
            return;
        }

        if key.modifiers.contains(KeyModifiers::ALT) {
            if key.code == KeyCode::Char('f') {
                self.pane().toggle_level(Level::Fatal);
            }
            self.count = None;
            return;
        }

        if let KeyCode::Char(c) = key.code {
            if self.handle_count_digit(c) {
                return;
            }
        }

        let n = self.count.unwrap_or(1);
        match key.code {
            // The pending count survives into yank mode ("3yy")
            KeyCode::Char('y') => {
                self.pending_yank_mark = false;
                self.mode = Mode::Yank;
                return;
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                self.pane().stop_following();
                if self.pane().filtered().has_text_filter() {
                    self.pane().clear_text_filter();
                }
                self.pane().clear_search();
            }

            KeyCode::Char('j') | KeyCode::Down => self.pane().scroll_down(n),
            KeyCode::Char('k') | KeyCode::Up => self.pane().scroll_up(n),
            KeyCode::Char('f') | KeyCode::Char(' ') | KeyCode::PageDown => self.pane().page_down(),
            KeyCode::Char('b') | KeyCode::PageUp => self.pane().page_up(),
            KeyCode::Char('g') | KeyCode::Home => self.pane().goto_top(),
            KeyCode::Char('G') | KeyCode::End => {
                let result = self.pane().refresh().map(|_| ());
                self.report(result);
                self.pane().goto_bottom();
            }
            KeyCode::Left => self.pane().scroll_left(10),
            KeyCode::Right => self.pane().scroll_right(10),

            KeyCode::Char('/') => self.enter_prompt(Mode::Search),
            KeyCode::Char(':') => self.enter_prompt(Mode::Goto),
            KeyCode::Char('?') => self.enter_prompt(Mode::Filter),
            KeyCode::Char('S') => self.enter_prompt(Mode::Slice),
            KeyCode::Char('n') => self.pane().next_search_result(),
            KeyCode::Char('N') => self.pane().prev_search_result(),

            KeyCode::Char('t') => self.pane().toggle_level(Level::Trace),
            KeyCode::Char('d') => self.pane().toggle_level(Level::Debug),
            KeyCode::Char('i') => self.pane().toggle_level(Level::Info),
            KeyCode::Char('w') => self.pane().toggle_level(Level::Warn),
            KeyCode::Char('e') => self.pane().toggle_level(Level::Error),
            KeyCode::Char('T') => self.pane().set_level_and_above(Level::Trace),
            KeyCode::Char('D') => self.pane().set_level_and_above(Level::Debug),
            KeyCode::Char('I') => self.pane().set_level_and_above(Level::Info),
            KeyCode::Char('W') => self.pane().set_level_and_above(Level::Warn),
            KeyCode::Char('E') => self.pane().set_level_and_above(Level::Error),

            KeyCode::Char('F') => {
                self.pane().toggle_following();
            }
            KeyCode::Char('R') => {
                let result = if self.pane().current_slice().is_some() {
                    self.pane().revert_slice()
                } else {
                    self.pane().resync_from_source()
                };
                self.report(result);
            }
            KeyCode::Char('x') => {
                let result = self.pane().slice_filtered_view();
                self.report(result);
            }

            KeyCode::Char('m') => self.mode = Mode::MarkSet,
            KeyCode::Char('\'') => self.mode = Mode::MarkJump,
            KeyCode::Char('[') => self.pane().prev_mark(),
            KeyCode::Char(']') => self.pane().next_mark(),

            KeyCode::Char('v') => {
                self.pane().start_visual();
                self.mode = Mode::Visual;
            }

            KeyCode::Char('l') => {
                self.pane().toggle_line_numbers();
            }
            KeyCode::Char('H') => self.mode = Mode::Help,
            KeyCode::Char('=') => self.mode = Mode::FileInfo,
            _ => {}
        }
        self.count = None;
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let input = std::mem::take(&mut self.input);
                self.commit_prompt(&input);
                self.mode = Mode::Normal;
            }
            KeyCode::Esc => {
                if self.mode == Mode::Filter {
                    self.pane().clear_text_filter();
                }
                self.input.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                self.input.pop();
                if self.mode == Mode::Filter {
                    let text = self.input.clone();
                    self.pane().set_text_filter(&text);
                }
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                if self.mode == Mode::Filter {
                    // Live filtering on every keystroke
                    let text = self.input.clone();
                    self.pane().set_text_filter(&text);
                }
            }
            _ => {}
        }
    }

    fn commit_prompt(&mut self, input: &str) {
        match self.mode {
            Mode::Search => {
                self.pane().perform_search(input);
                if !input.is_empty() && self.pane().search_results().is_empty() {
                    self.status = Some(format!("Pattern not found: {input}"));
                }
            }
            Mode::Goto => {
                if let Ok(n) = input.trim().parse::<usize>() {
                    if n > 0 {
                        self.pane().goto_line(n - 1);
                    }
                }
            }
            Mode::GotoTime => match self.pane().goto_time(input) {
                Ok(TimeJump::Jumped { .. }) => {}
                Ok(TimeJump::Hidden { original }) => {
                    self.status = Some(format!(
                        "Line {} is hidden by the active filter",
                        original + 1
                    ));
                }
                Err(e) => self.status = Some(e.to_string()),
            },
            Mode::Filter => {
                // Already applied live; Enter just keeps it
            }
            Mode::Slice => {
                let result = self.pane().parse_and_slice(input);
                self.report(result);
            }
            _ => {}
        }
    }

    fn handle_mark_key(&mut self, key: KeyEvent) {
        if let KeyCode::Char(c) = key.code {
            if c.is_ascii_lowercase() {
                match self.mode {
                    Mode::MarkSet => self.pane().set_mark(c),
                    Mode::MarkJump => {
                        // Unset marks are a silent no-op
                        self.pane().jump_to_mark(c);
                    }
                    _ => {}
                }
            }
        }
        self.mode = Mode::Normal;
    }

    fn handle_split_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('v') => self.split_pane(SplitDirection::Vertical),
            KeyCode::Char('s') => self.split_pane(SplitDirection::Horizontal),
            KeyCode::Char('w') => {
                if self.panes.len() > 1 {
                    self.active = (self.active + 1) % self.panes.len();
                }
            }
            KeyCode::Char('q') => self.close_active_pane(),
            KeyCode::Char('<') => self.set_split_ratio(self.split_ratio - 0.1),
            KeyCode::Char('>') => self.set_split_ratio(self.split_ratio + 0.1),
            _ => {}
        }
        self.mode = Mode::Normal;
    }

    fn split_pane(&mut self, direction: SplitDirection) {
        if self.panes.len() < 2 {
            let twin = self.panes[self.active].duplicate();
            self.panes.push(twin);
        }
        self.split = direction;
    }

    fn close_active_pane(&mut self) {
        if self.panes.len() < 2 {
            return;
        }
        // Dropping the pane releases its FileSource unless shared
        self.panes.remove(self.active);
        self.active = 0;
        self.split = SplitDirection::None;
    }

    fn set_split_ratio(&mut self, ratio: f64) {
        self.split_ratio = ratio.clamp(0.1, 0.9);
    }

    fn handle_visual_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('d') | KeyCode::Char('f') => self.pane().page_down(),
                KeyCode::Char('u') | KeyCode::Char('b') => self.pane().page_up(),
                _ => {}
            }
            self.pane().update_visual_end();
            return;
        }

        if let KeyCode::Char(c) = key.code {
            if self.handle_count_digit(c) {
                return;
            }
        }

        let n = self.take_count();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.pane().scroll_down(n),
            KeyCode::Char('k') | KeyCode::Up => self.pane().scroll_up(n),
            KeyCode::Char('g') | KeyCode::Home => self.pane().goto_top(),
            KeyCode::Char('G') | KeyCode::End => self.pane().goto_bottom(),
            KeyCode::PageDown => self.pane().page_down(),
            KeyCode::PageUp => self.pane().page_up(),
            KeyCode::Char('y') => {
                let lines = self.pane().yank_visual();
                self.yank_to_clipboard(&lines);
                self.pane().end_visual();
                self.mode = Mode::Normal;
                return;
            }
            KeyCode::Char('v') | KeyCode::Esc => {
                self.pane().end_visual();
                self.mode = Mode::Normal;
                return;
            }
            _ => return,
        }
        self.pane().update_visual_end();
    }

    fn handle_yank_key(&mut self, key: KeyEvent) {
        if self.pending_yank_mark {
            if let KeyCode::Char(c) = key.code {
                if let Some(lines) = self.pane().yank_to_mark(c) {
                    self.yank_to_clipboard(&lines);
                }
            }
            self.pending_yank_mark = false;
            self.mode = Mode::Normal;
            return;
        }

        match key.code {
            KeyCode::Char('y') => {
                let n = self.take_count();
                let lines = self.pane().yank_lines(n);
                self.yank_to_clipboard(&lines);
                self.mode = Mode::Normal;
            }
            KeyCode::Char('\'') => self.pending_yank_mark = true,
            _ => {
                self.count = None;
                self.mode = Mode::Normal;
            }
        }
    }

    fn yank_to_clipboard(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        let mut text = lines.join("\n");
        text.push('\n');
        clipboard::copy(&text);
        self.status = Some(format!("Yanked {} lines", lines.len()));
    }

    // --- rendering -------------------------------------------------------

    /// Produce the full frame: pane rows, status bar, help line.
    pub fn render(&mut self) -> Vec<String> {
        let width = self.width;
        let content_height = self.height.saturating_sub(RESERVED_ROWS);

        let mut rows = match self.mode {
            Mode::Help => overlay_rows(HELP_TEXT, width, content_height),
            Mode::FileInfo => {
                let info = self.file_info_lines();
                let refs: Vec<&str> = info.iter().map(String::as_str).collect();
                overlay_rows(&refs, width, content_height)
            }
            _ => self.render_panes(width, content_height),
        };

        rows.push(self.render_status(width));
        rows.push(self.render_help_line(width));
        rows
    }

    fn render_panes(&mut self, width: usize, height: usize) -> Vec<String> {
        if self.panes.len() < 2 || self.split == SplitDirection::None {
            let active = self.active;
            return self.panes[active].render(width, height);
        }

        match self.split {
            SplitDirection::Vertical => {
                let left_width = split_size(width, self.split_ratio, MIN_PANE_WIDTH);
                let right_width = width.saturating_sub(left_width + 1);
                let sep = if self.active == 1 { '┃' } else { '│' };

                let left = self.panes[0].render(left_width, height);
                let right = self.panes[1].render(right_width, height);

                left.into_iter()
                    .zip(right)
                    .map(|(l, r)| format!("{l}{sep}{r}"))
                    .collect()
            }
            SplitDirection::Horizontal => {
                let top_height = split_size(height, self.split_ratio, MIN_PANE_HEIGHT);
                let bottom_height = height.saturating_sub(top_height + 1);
                let sep = if self.active == 1 { '━' } else { '─' };

                let mut rows = self.panes[0].render(width, top_height);
                rows.push(sep.to_string().repeat(width));
                rows.extend(self.panes[1].render(width, bottom_height));
                rows
            }
            SplitDirection::None => unreachable!(),
        }
    }

    fn render_status(&mut self, width: usize) -> String {
        let text = match self.mode {
            Mode::Search => format!("/{}", self.input),
            Mode::Goto => format!(":{}", self.input),
            Mode::GotoTime => format!("t:{}", self.input),
            Mode::Filter => format!("?{}", self.input),
            Mode::Slice => format!("S:{}", self.input),
            Mode::MarkSet => "m".to_string(),
            Mode::MarkJump => "'".to_string(),
            _ => self.status_summary(),
        };

        let theme = &self.config.theme;
        let bg = render::parse_color(&theme.status_bar).unwrap_or(236);
        let fg = render::parse_color(&theme.status_bar_text).unwrap_or(252);

        // Status text carries no escapes of its own, so plain char
        // truncation keeps the background unbroken across the padding
        let truncated: String = text.chars().take(width).collect();
        let pad = width.saturating_sub(truncated.chars().count());
        render::bg_fg(bg, fg, &format!("{truncated}{}", " ".repeat(pad)))
    }

    fn status_summary(&self) -> String {
        let pane = self.active_pane();
        let filtered = pane.filtered();

        let pane_info = if self.panes.len() == 2 {
            format!("[{}/2] ", self.active + 1)
        } else {
            String::new()
        };

        let slice_info = if let Some(slice) = pane.current_slice() {
            format!(" [slice:{}-{}]", slice.start_line + 1, slice.end_line)
        } else if pane.is_cached() {
            " [cached]".to_string()
        } else {
            String::new()
        };

        let follow_info = if pane.is_following() {
            " [following]"
        } else {
            ""
        };

        let total = pane.source().line_count();
        let line_info = if filtered.is_filtered() {
            format!(
                "L{}/{} (of {})",
                pane.viewport().current_line() + 1,
                filtered.line_count(),
                total
            )
        } else {
            format!("L{}/{}", pane.viewport().current_line() + 1, total)
        };

        let time_info = pane
            .current_timestamp()
            .map(|ts| format!("  {}", ts.format("%H:%M:%S")))
            .unwrap_or_default();

        let search_info = if pane.search_term().is_empty() {
            String::new()
        } else {
            format!(" [{} matches]", pane.search_results().len())
        };

        let mut filter_parts = Vec::new();
        let levels = filtered.active_levels();
        if !levels.is_empty() {
            let names: Vec<&str> = levels.iter().map(|l| l.short_name()).collect();
            filter_parts.push(names.join(","));
        }
        if let Some(text) = filtered.text_filter() {
            let shown = if text.chars().count() > 15 {
                let head: String = text.chars().take(15).collect();
                format!("{head}...")
            } else {
                text
            };
            filter_parts.push(format!("\"{shown}\""));
        }
        let filter_info = if filter_parts.is_empty() {
            String::new()
        } else {
            format!(" [{}]", filter_parts.join(" "))
        };

        let percent = format!("{:.0}%", pane.percent_scrolled());

        let message = self
            .status
            .as_ref()
            .map(|m| format!(" | {m}"))
            .unwrap_or_default();

        format!(
            " {pane_info}{}{slice_info}{follow_info}  {line_info}{time_info}  {percent}{search_info}{filter_info}{message}",
            pane.filename()
        )
    }

    fn render_help_line(&self, width: usize) -> String {
        let help = "j/k:scroll  /:search  ?:filter  t/d/i/w/e:level  S:slice  m:mark  H:help  q:quit";
        let truncated: String = help.chars().take(width).collect();
        let pad = width.saturating_sub(truncated.chars().count());
        render::fg(240, &format!("{truncated}{}", " ".repeat(pad)))
    }

    fn file_info_lines(&self) -> Vec<String> {
        let pane = self.active_pane();
        let source = pane.source();
        let total = source.line_count();

        let mut lines = vec![
            format!("File: {}", source.path().display()),
            format!("Size: {} bytes", source.size()),
            format!("Lines: {total}"),
            format!("Visible: {}", pane.filtered().line_count()),
            String::new(),
        ];

        if let Some(slice) = pane.current_slice() {
            lines.push("Current slice:".to_string());
            lines.push(format!(
                "  [slice:{}-{}] {}",
                slice.start_line + 1,
                slice.end_line,
                slice.cache_path.display()
            ));
            lines.push(String::new());
        }

        if !pane.marks().is_empty() {
            lines.push("Marks:".to_string());
            for (mark, line) in pane.marks() {
                lines.push(format!("  '{mark} -> line {}", line + 1));
            }
        }

        lines
    }
}

/// Size of the first pane given the split ratio, honoring the minimum size
/// for both sides where the space allows it.
fn split_size(total: usize, ratio: f64, min: usize) -> usize {
    let usable = total.saturating_sub(1);
    let first = (usable as f64 * ratio).round() as usize;
    if usable <= min * 2 {
        return first.min(usable);
    }
    first.clamp(min, usable - min)
}

/// Lay overlay text (help, file info) out as full-width rows.
fn overlay_rows(lines: &[&str], width: usize, height: usize) -> Vec<String> {
    let mut rows: Vec<String> = lines
        .iter()
        .take(height)
        .map(|line| {
            let truncated: String = line.chars().take(width).collect();
            let pad = width.saturating_sub(truncated.chars().count());
            format!("{truncated}{}", " ".repeat(pad))
        })
        .collect();
    while rows.len() < height {
        rows.push(" ".repeat(width));
    }
    rows
}
