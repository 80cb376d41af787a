//! The visible window over a line provider.
//!
//! The viewport knows nothing about log formats, filters, or file sources;
//! it lays out lines from any [`LineProvider`] into terminal rows: scroll
//! clamping, a line-number gutter with mark / visual-selection / highlight
//! decoration, wrapping or horizontal scrolling, and `~` padding below EOF.
//!
//! All column accounting is ANSI-aware. An escape sequence begins at `\x1b`
//! and ends at the first ASCII letter; escape bytes pass through without
//! counting toward width, and every truncation is sealed with `ESC[0m` so
//! styles cannot bleed across rows or panes. Rows are padded with spaces to
//! the exact viewport width so two panes compose side by side without any
//! screen clearing.

use crate::config::{Config, ThemeConfig};
use crate::render::{self, Renderer, RESET};
use crate::source::LineProvider;
use std::collections::BTreeMap;

/// Scrollable, decorated window over a provider.
#[derive(Debug)]
pub struct Viewport {
    width: usize,
    height: usize,
    scroll_offset: usize,
    horizontal_offset: usize,
    show_line_numbers: bool,
    wrap_lines: bool,
    highlighted_line: Option<usize>,
    marks: BTreeMap<usize, char>,
    visual: Option<(usize, usize)>,
    line_number_color: u8,
    highlight_color: u8,
    visual_color: u8,
}

impl Viewport {
    pub fn new(width: usize, height: usize, config: &Config) -> Self {
        let theme = &config.theme;
        Self {
            width,
            height,
            scroll_offset: 0,
            horizontal_offset: 0,
            show_line_numbers: config.display.show_line_numbers,
            wrap_lines: config.display.wrap_lines,
            highlighted_line: None,
            marks: BTreeMap::new(),
            visual: None,
            line_number_color: theme_color(theme, |t| &t.line_numbers, 240),
            highlight_color: theme_color(theme, |t| &t.highlight, 226),
            visual_color: theme_color(theme, |t| &t.visual_marker, 51),
        }
    }

    pub fn set_size(&mut self, width: usize, height: usize, provider: &dyn LineProvider) {
        self.width = width;
        self.height = height;
        self.clamp_scroll(provider);
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Top visible filtered index.
    pub fn current_line(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_down(&mut self, n: usize, provider: &dyn LineProvider) {
        self.scroll_offset = self.scroll_offset.saturating_add(n);
        self.clamp_scroll(provider);
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    pub fn page_down(&mut self, provider: &dyn LineProvider) {
        self.scroll_down(self.height.saturating_sub(1).max(1), provider);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.height.saturating_sub(1).max(1));
    }

    pub fn goto_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn goto_bottom(&mut self, provider: &dyn LineProvider) {
        self.scroll_offset = provider.line_count();
        self.clamp_scroll(provider);
    }

    pub fn goto_line(&mut self, line: usize, provider: &dyn LineProvider) {
        self.scroll_offset = line;
        self.clamp_scroll(provider);
    }

    fn clamp_scroll(&mut self, provider: &dyn LineProvider) {
        let max = provider.line_count().saturating_sub(self.height);
        self.scroll_offset = self.scroll_offset.min(max);
    }

    pub fn scroll_left(&mut self, n: usize) {
        self.horizontal_offset = self.horizontal_offset.saturating_sub(n);
    }

    pub fn scroll_right(&mut self, n: usize) {
        self.horizontal_offset = self.horizontal_offset.saturating_add(n);
    }

    pub fn reset_horizontal(&mut self) {
        self.horizontal_offset = 0;
    }

    pub fn horizontal_offset(&self) -> usize {
        self.horizontal_offset
    }

    pub fn toggle_wrap(&mut self) -> bool {
        self.wrap_lines = !self.wrap_lines;
        if self.wrap_lines {
            self.horizontal_offset = 0;
        }
        self.wrap_lines
    }

    pub fn is_wrapping(&self) -> bool {
        self.wrap_lines
    }

    pub fn toggle_line_numbers(&mut self) -> bool {
        self.show_line_numbers = !self.show_line_numbers;
        self.show_line_numbers
    }

    pub fn set_highlight(&mut self, original_index: usize) {
        self.highlighted_line = Some(original_index);
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted_line = None;
    }

    /// Reverse mark index (original line -> mark char), pushed from the pane.
    pub fn set_marks(&mut self, marks: BTreeMap<usize, char>) {
        self.marks = marks;
    }

    /// Visual selection overlay as inclusive original-line bounds.
    pub fn set_visual(&mut self, range: Option<(usize, usize)>) {
        self.visual = range;
    }

    pub fn percent_scrolled(&self, provider: &dyn LineProvider) -> f64 {
        let total = provider.line_count();
        if total == 0 {
            return 0.0;
        }
        if total <= self.height {
            return 100.0;
        }
        self.scroll_offset as f64 / (total - self.height) as f64 * 100.0
    }

    /// Lay the visible lines out as `height` rows of exactly `width` visible
    /// columns each.
    pub fn render(&self, provider: &dyn LineProvider, renderer: &dyn Renderer) -> Vec<String> {
        let mut rows = Vec::with_capacity(self.height);
        if self.width == 0 || self.height == 0 {
            return rows;
        }

        let line_count = provider.line_count();
        let lines = provider.get_lines(self.scroll_offset, self.height);
        let num_width = decimal_width(line_count);
        let gutter_width = if self.show_line_numbers {
            num_width + 2
        } else {
            0
        };
        let avail = self.width.saturating_sub(gutter_width).max(1);

        'lines: for line in &lines {
            if rows.len() >= self.height {
                break;
            }
            let gutter = self.gutter_for(line.original_index, num_width);
            let content = renderer.render(line);

            if self.wrap_lines {
                for (i, segment) in wrap_visible(&content, avail).into_iter().enumerate() {
                    if rows.len() >= self.height {
                        break 'lines;
                    }
                    let prefix = if i == 0 {
                        gutter.clone()
                    } else {
                        " ".repeat(gutter_width)
                    };
                    rows.push(pad_row(prefix, segment, avail));
                }
            } else {
                let body = if self.horizontal_offset > 0 {
                    skip_columns(&content, self.horizontal_offset)
                } else {
                    content
                };
                rows.push(pad_row(gutter, truncate_visible(&body, avail), avail));
            }
        }

        while rows.len() < self.height {
            let mut row = String::from("~");
            row.push_str(&" ".repeat(self.width.saturating_sub(1)));
            rows.push(row);
        }
        rows
    }

    fn gutter_for(&self, original: usize, num_width: usize) -> String {
        if !self.show_line_numbers {
            return String::new();
        }

        let num = format!("{:>num_width$}", original + 1);
        let mark = self.marks.get(&original).copied();
        let highlighted = self.highlighted_line == Some(original);
        let in_visual = self
            .visual
            .is_some_and(|(start, end)| original >= start && original <= end);

        if highlighted {
            let mark = mark.unwrap_or(' ');
            return render::bold_fg(self.highlight_color, &format!("{mark}{num} "));
        }
        if in_visual {
            let marker = render::bold_fg(self.visual_color, ">");
            return format!(
                "{marker}{}",
                render::fg(self.line_number_color, &format!("{num} "))
            );
        }
        if let Some(mark) = mark {
            let badge = render::bold_fg(self.highlight_color, &mark.to_string());
            return format!(
                "{badge}{}",
                render::fg(self.line_number_color, &format!("{num} "))
            );
        }
        render::fg(self.line_number_color, &format!(" {num} "))
    }
}

fn theme_color(theme: &ThemeConfig, pick: impl Fn(&ThemeConfig) -> &String, fallback: u8) -> u8 {
    render::parse_color(pick(theme)).unwrap_or(fallback)
}

fn decimal_width(n: usize) -> usize {
    n.max(1).to_string().len()
}

fn pad_row(prefix: String, body: String, avail: usize) -> String {
    let pad = avail.saturating_sub(visible_width(&body));
    let mut row = prefix;
    row.push_str(&body);
    row.push_str(&" ".repeat(pad));
    row
}

/// Number of columns the string occupies, counting only non-escape chars.
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for ch in s.chars() {
        if ch == '\x1b' {
            in_escape = true;
        } else if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else {
            width += 1;
        }
    }
    width
}

/// Truncate to at most `max` visible columns, passing escapes through and
/// sealing the result with a reset.
pub fn truncate_visible(s: &str, max: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max + 16));
    let mut width = 0;
    let mut in_escape = false;

    for ch in s.chars() {
        if ch == '\x1b' {
            in_escape = true;
            out.push(ch);
            continue;
        }
        if in_escape {
            out.push(ch);
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }
        if width >= max {
            break;
        }
        out.push(ch);
        width += 1;
    }

    out.push_str(RESET);
    out
}

/// Skip the first `n` visible columns.
///
/// Escape sequences completed before the first retained column are dropped;
/// otherwise a single opening color would style the entire remainder without
/// its matching subsequent segments. Escapes from the retained region on are
/// preserved verbatim.
pub fn skip_columns(s: &str, n: usize) -> String {
    let mut out = String::new();
    let mut escape_buf = String::new();
    let mut in_escape = false;
    let mut skipped = 0;

    for ch in s.chars() {
        if ch == '\x1b' {
            in_escape = true;
            escape_buf.push(ch);
            continue;
        }
        if in_escape {
            escape_buf.push(ch);
            if ch.is_ascii_alphabetic() {
                in_escape = false;
                if skipped >= n {
                    out.push_str(&escape_buf);
                }
                escape_buf.clear();
            }
            continue;
        }
        if skipped < n {
            skipped += 1;
            continue;
        }
        out.push(ch);
    }
    out
}

/// Break into segments of at most `width` visible columns; each segment is
/// sealed with a reset.
pub fn wrap_visible(s: &str, width: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut col = 0;
    let mut in_escape = false;

    for ch in s.chars() {
        if ch == '\x1b' {
            in_escape = true;
            current.push(ch);
            continue;
        }
        if in_escape {
            current.push(ch);
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }
        if col >= width {
            current.push_str(RESET);
            segments.push(std::mem::take(&mut current));
            col = 0;
        }
        current.push(ch);
        col += 1;
    }

    current.push_str(RESET);
    segments.push(current);
    segments
}

/// Remove all escape sequences (tests and width assertions).
pub fn strip_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;
    for ch in s.chars() {
        if ch == '\x1b' {
            in_escape = true;
        } else if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else {
            out.push(ch);
        }
    }
    out
}
