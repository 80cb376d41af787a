//! Timestamp extraction from log lines and parsing of user time input.
//!
//! A fixed, ordered list of (regex, layout) pairs is tried against each line;
//! the first match wins. Missing date components use defaults: syslog lines
//! get the current year, time-only lines get today's local date.

use chrono::{DateTime, Datelike, Local, LocalResult, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Rfc3339,
    CommonMs,
    Common,
    Syslog,
    Apache,
    UnixSeconds,
    UnixMillis,
    Bracketed,
    TimeOnly,
}

/// Detects and parses timestamps from log lines.
#[derive(Debug)]
pub struct TimestampParser {
    patterns: Vec<(Regex, Layout)>,
}

impl TimestampParser {
    /// Create a parser covering the common timestamp formats.
    pub fn new() -> Self {
        let table: [(&str, Layout); 9] = [
            // 2024-01-15T10:30:45.123Z / 2024-01-15T10:30:45+02:00
            (
                r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d{3})?(?:Z|[+-]\d{2}:\d{2})?)",
                Layout::Rfc3339,
            ),
            // 2024-01-15 10:30:45.123
            (
                r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3})",
                Layout::CommonMs,
            ),
            // 2024-01-15 10:30:45
            (r"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})", Layout::Common),
            // Jan 15 10:30:45
            (
                r"([A-Z][a-z]{2} \d{1,2} \d{2}:\d{2}:\d{2})",
                Layout::Syslog,
            ),
            // 15/Jan/2024:10:30:45 +0000
            (
                r"(\d{2}/[A-Z][a-z]{2}/\d{4}:\d{2}:\d{2}:\d{2} [+-]\d{4})",
                Layout::Apache,
            ),
            // 1705315845
            (r"^(\d{10})(?:\D|$)", Layout::UnixSeconds),
            // 1705315845123
            (r"^(\d{13})(?:\D|$)", Layout::UnixMillis),
            // [2024-01-15 10:30:45.123]
            (
                r"\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\.\d{3})?)\]",
                Layout::Bracketed,
            ),
            // 10:30:45.123 at the start of the line only
            (r"^(\d{2}:\d{2}:\d{2}(?:\.\d{3})?)", Layout::TimeOnly),
        ];

        let patterns = table
            .iter()
            .map(|(pattern, layout)| {
                let regex = Regex::new(pattern).expect("timestamp pattern must compile");
                (regex, *layout)
            })
            .collect();

        Self { patterns }
    }

    /// Attempt to extract a timestamp from a log line.
    pub fn parse(&self, content: &str) -> Option<DateTime<Local>> {
        for (regex, layout) in &self.patterns {
            let Some(captures) = regex.captures(content) else {
                continue;
            };
            let text = captures.get(1)?.as_str();
            if let Some(ts) = parse_with_layout(text, *layout) {
                return Some(ts);
            }
        }
        None
    }
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_with_layout(text: &str, layout: Layout) -> Option<DateTime<Local>> {
    match layout {
        Layout::Rfc3339 => {
            if let Ok(t) = DateTime::parse_from_rfc3339(text) {
                return Some(t.with_timezone(&Local));
            }
            // No zone designator: interpret in the local zone
            let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
            local_from_naive(naive)
        }
        Layout::CommonMs | Layout::Common | Layout::Bracketed => {
            let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok()?;
            local_from_naive(naive)
        }
        Layout::Syslog => {
            let with_year = format!("{} {}", Local::now().year(), text);
            let naive = NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S").ok()?;
            local_from_naive(naive)
        }
        Layout::Apache => {
            let t = DateTime::parse_from_str(text, "%d/%b/%Y:%H:%M:%S %z").ok()?;
            Some(t.with_timezone(&Local))
        }
        Layout::UnixSeconds => {
            let secs: i64 = text.parse().ok()?;
            Local.timestamp_opt(secs, 0).single()
        }
        Layout::UnixMillis => {
            let millis: i64 = text.parse().ok()?;
            Local.timestamp_millis_opt(millis).single()
        }
        Layout::TimeOnly => {
            let time = NaiveTime::parse_from_str(text, "%H:%M:%S%.f").ok()?;
            let naive = Local::now().date_naive().and_time(time);
            local_from_naive(naive)
        }
    }
}

fn local_from_naive(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        // DST fold: pick the earlier instant
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}

/// Parse interactive time input (`HH:MM`, `HH:MM:SS`, `YYYY-MM-DD HH:MM[:SS]`,
/// `YYYY-MM-DDTHH:MM:SS`).
///
/// Time-only inputs borrow the date of `reference` (typically the file's
/// first parsed timestamp), falling back to today in the local zone.
pub fn parse_time_input(
    input: &str,
    reference: Option<DateTime<Local>>,
) -> Option<DateTime<Local>> {
    let input = input.trim();

    for layout in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(input, layout) {
            let date = reference
                .map(|r| r.date_naive())
                .unwrap_or_else(|| Local::now().date_naive());
            return local_from_naive(date.and_time(time));
        }
    }

    for layout in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, layout) {
            return local_from_naive(naive);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn parser() -> TimestampParser {
        TimestampParser::new()
    }

    #[test]
    fn test_rfc3339_with_zone() {
        let ts = parser()
            .parse("2024-01-15T10:30:45.123Z INFO started")
            .unwrap();
        assert_eq!(ts.with_timezone(&chrono::Utc).hour(), 10);
        assert_eq!(ts.with_timezone(&chrono::Utc).minute(), 30);
    }

    #[test]
    fn test_rfc3339_without_zone() {
        let ts = parser().parse("2024-01-15T10:30:45 worker up").unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.second(), 45);
    }

    #[test]
    fn test_common_formats() {
        let p = parser();
        let with_ms = p.parse("2024-01-15 10:30:45.123 request done").unwrap();
        assert_eq!(with_ms.minute(), 30);

        let without_ms = p.parse("2024-01-15 10:30:45 request done").unwrap();
        assert_eq!(without_ms.second(), 45);
    }

    #[test]
    fn test_syslog_uses_current_year() {
        let ts = parser().parse("Jan 15 10:30:45 myhost app: up").unwrap();
        assert_eq!(ts.year(), Local::now().year());
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_apache_clf() {
        let ts = parser()
            .parse(r#"15/Jan/2024:10:30:45 +0000 "GET / HTTP/1.1" 200"#)
            .unwrap();
        assert_eq!(ts.with_timezone(&chrono::Utc).hour(), 10);
    }

    #[test]
    fn test_unix_seconds_anchored() {
        let p = parser();
        let ts = p.parse("1705315845 request served").unwrap();
        assert_eq!(ts.timestamp(), 1705315845);

        // Not at the start of the line: no match
        assert!(p.parse("id 1705315845 request served").is_none());
    }

    #[test]
    fn test_unix_millis() {
        let ts = parser().parse("1705315845123 request served").unwrap();
        assert_eq!(ts.timestamp_millis(), 1705315845123);
    }

    #[test]
    fn test_bracketed() {
        let ts = parser().parse("[2024-01-15 10:30:45.123] worker 3").unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn test_time_only_anchored_at_start() {
        let p = parser();
        let ts = p.parse("10:30:45.123 tick").unwrap();
        assert_eq!(ts.date_naive(), Local::now().date_naive());
        assert_eq!(ts.hour(), 10);

        assert!(p.parse("at 10:30:45 something happened").is_none());
    }

    #[test]
    fn test_no_timestamp() {
        assert!(parser().parse("no time in this line").is_none());
        assert!(parser().parse("").is_none());
    }

    #[test]
    fn test_parse_time_input_time_only_uses_reference_date() {
        let reference = Local.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let t = parse_time_input("13:45", Some(reference)).unwrap();
        assert_eq!(t.date_naive(), reference.date_naive());
        assert_eq!(t.hour(), 13);
        assert_eq!(t.minute(), 45);

        let t = parse_time_input("13:45:30", Some(reference)).unwrap();
        assert_eq!(t.second(), 30);
    }

    #[test]
    fn test_parse_time_input_full_dates() {
        let t = parse_time_input("2024-03-10 13:45:30", None).unwrap();
        assert_eq!(t.year(), 2024);
        assert_eq!(t.second(), 30);

        let t = parse_time_input("2024-03-10T13:45:30", None).unwrap();
        assert_eq!(t.hour(), 13);

        let t = parse_time_input("2024-03-10 13:45", None).unwrap();
        assert_eq!(t.second(), 0);
    }

    #[test]
    fn test_parse_time_input_rejects_garbage() {
        assert!(parse_time_input("not a time", None).is_none());
        assert!(parse_time_input("", None).is_none());
    }
}
