//! Range expression parsing for slice commands.
//!
//! A range is `start-end` where each side can be an absolute 1-based line
//! number, `.` (current line), `$` (end of file), a mark like `'a`, a time
//! like `13:00`, or `$`/`.` with a signed offset (`$-100`, `.+5`). The
//! separator is the first `-` whose left neighbor is not `$` or `.`, so
//! `$-100` and `.-5` stay single atoms. A missing end means `$`.

use crate::error::{MlessError, Result};
use crate::logformat::parse_time_input;
use crate::source::FileSource;
use std::collections::BTreeMap;

/// Everything an expression can reference during resolution.
pub struct ResolveContext<'a> {
    /// Current original line (viewport position mapped through the filter)
    pub current: usize,
    /// Total line count of the source
    pub total: usize,
    /// Pane marks (original line numbers)
    pub marks: &'a BTreeMap<char, usize>,
    /// Source used for time lookups
    pub source: &'a FileSource,
}

/// Parse and resolve a range expression to `[start, end)` original lines.
///
/// The start is floored at 0 and the end capped at the total; an empty
/// range after clamping is reported by the slicer, not here.
pub fn parse_range(expr: &str, ctx: &ResolveContext) -> Result<(usize, usize)> {
    let expr = expr.trim();
    let (start_str, end_str) = split_range(expr);

    let start = resolve_atom(start_str, ctx)?;
    let end = resolve_atom(end_str, ctx)?;

    let start = start.max(0) as usize;
    let end = end.clamp(0, ctx.total as i64) as usize;
    Ok((start, end))
}

/// Split on the first `-` whose left neighbor is not `$` or `.`.
fn split_range(expr: &str) -> (&str, &str) {
    let bytes = expr.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'-' {
            continue;
        }
        if i > 0 && (bytes[i - 1] == b'$' || bytes[i - 1] == b'.') {
            continue;
        }
        return (&expr[..i], &expr[i + 1..]);
    }
    (expr, "$")
}

fn resolve_atom(atom: &str, ctx: &ResolveContext) -> Result<i64> {
    let atom = atom.trim();

    if atom.is_empty() {
        return Ok(0);
    }
    if atom == "." {
        return Ok(ctx.current as i64);
    }
    if atom == "$" {
        return Ok(ctx.total as i64);
    }

    // Mark reference: 'a
    if let Some(rest) = atom.strip_prefix('\'') {
        let mark = rest.chars().next().unwrap_or(' ');
        if mark.is_ascii_lowercase() {
            if let Some(&line) = ctx.marks.get(&mark) {
                return Ok(line as i64);
            }
        }
        return Err(MlessError::MarkNotSet { mark });
    }

    // Time reference: 13:00 or 13:00:00 (but not $:/.: offset forms)
    if atom.contains(':') && !atom.starts_with('$') && !atom.starts_with('.') {
        let reference = ctx.source.timestamp(0);
        let target = parse_time_input(atom, reference)
            .ok_or_else(|| MlessError::time_unresolved(atom))?;
        return ctx
            .source
            .find_line_at_time(target)
            .map(|line| line as i64)
            .ok_or_else(|| MlessError::time_unresolved(atom));
    }

    if let Some(rest) = atom.strip_prefix('$') {
        return Ok(ctx.total as i64 + parse_offset(rest));
    }
    if let Some(rest) = atom.strip_prefix('.') {
        return Ok(ctx.current as i64 + parse_offset(rest));
    }

    // Absolute line number: 1-based input, 0-based result
    let n: i64 = atom
        .parse()
        .map_err(|_| MlessError::invalid_range(atom))?;
    Ok(n - 1)
}

/// Signed offset after `$` or `.`; malformed offsets resolve to 0.
fn parse_offset(s: &str) -> i64 {
    s.parse().unwrap_or(0)
}
