//! End-to-end scenarios across the whole pipeline: index, filter, slice,
//! time navigation, and follow mode, driven through the public API.

use mless::config::Config;
use mless::logformat::{Level, LevelDetector};
use mless::range::{parse_range, ResolveContext};
use mless::source::{FileSource, FilteredProvider, LineProvider};
use mless::ui::pane::TimeJump;
use mless::ui::Pane;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn fixture(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn numbered(n: usize) -> String {
    (0..n).map(|i| format!("line {i}\n")).collect()
}

fn pane_for(file: &NamedTempFile) -> Pane {
    Pane::open(file.path(), Arc::new(Config::default()), false).unwrap()
}

#[test]
fn scenario_basic_index() {
    // No trailing newline: the final fragment is still a line
    let file = fixture("A\nB\nC");
    let source = FileSource::open(file.path()).unwrap();

    assert_eq!(source.line_count(), 3);
    assert_eq!(source.get_line(0).unwrap().content, "A");
    assert_eq!(source.get_line(2).unwrap().content, "C");
}

#[test]
fn scenario_level_filter() {
    let file = fixture("[INF] hi\n[WRN] hi\n[ERR] hi\n");
    let source = Arc::new(FileSource::open(file.path()).unwrap());
    let filtered = FilteredProvider::new(
        Arc::clone(&source) as Arc<dyn LineProvider>,
        LevelDetector::new(&Config::default().log_levels),
    );

    filtered.set_level_and_above(Level::Warn);

    let visible: Vec<usize> = (0..filtered.line_count())
        .map(|k| filtered.original_line_number(k).unwrap())
        .collect();
    assert_eq!(visible, vec![1, 2]);
    assert_eq!(filtered.filtered_index_for(0), None);

    // Every visible line matches its source line
    for k in 0..filtered.line_count() {
        let line = filtered.get_line(k).unwrap();
        let original = source.get_line(line.original_index).unwrap();
        assert_eq!(line.content, original.content);
    }
}

#[test]
fn scenario_slice_revert() {
    let file = fixture(&numbered(1000));
    let mut pane = pane_for(&file);
    pane.render(80, 24);

    pane.perform_slice(100, 200).unwrap();
    assert_eq!(pane.source().line_count(), 100);
    let cache = pane.current_slice().unwrap().cache_path.clone();
    assert!(cache.exists());

    pane.revert_slice().unwrap();
    assert_eq!(pane.source().line_count(), 1000);
    assert!(!cache.exists());
}

#[test]
fn scenario_slice_stack_leaves_no_cache_files() {
    let file = fixture(&numbered(500));
    let mut pane = pane_for(&file);
    pane.render(80, 24);

    let mut caches = Vec::new();
    for _ in 0..3 {
        pane.perform_slice(10, 400).unwrap();
        caches.push(pane.current_slice().unwrap().cache_path.clone());
    }
    for _ in 0..3 {
        pane.revert_slice().unwrap();
    }

    assert!(pane.current_slice().is_none());
    for cache in caches {
        assert!(!cache.exists(), "leftover slice cache: {}", cache.display());
    }
}

#[test]
fn scenario_time_jump_across_filter() {
    // Line 1 (0-based) carries 12:30:00 but is INFO while only errors pass
    let file = fixture(
        "2024-01-15 12:00:00 [ERR] a\n2024-01-15 12:30:00 [INF] b\n2024-01-15 13:00:00 [ERR] c\n",
    );
    let mut pane = pane_for(&file);
    pane.render(80, 24);
    pane.set_level_and_above(Level::Error);

    let before = pane.viewport().current_line();
    let outcome = pane.goto_time("12:30:00").unwrap();

    assert_eq!(outcome, TimeJump::Hidden { original: 1 });
    assert_eq!(pane.filtered().filtered_index_for(1), None);
    assert_eq!(pane.viewport().current_line(), before);
}

#[test]
fn scenario_follow_growth() {
    let mut file = NamedTempFile::new().unwrap();
    file.flush().unwrap();

    let mut pane = Pane::open(file.path(), Arc::new(Config::default()), false).unwrap();
    pane.render(80, 10);
    pane.toggle_following();

    // First tick: nothing grew
    assert!(!pane.check_for_new_lines().unwrap());
    assert_eq!(pane.filtered().line_count(), 0);

    // External append, then the next tick picks it up
    file.write_all(b"X\n").unwrap();
    file.flush().unwrap();

    assert!(pane.check_for_new_lines().unwrap());
    assert_eq!(pane.filtered().line_count(), 1);
    assert_eq!(pane.filtered().get_line(0).unwrap().content, "X");
    // Bottom of a one-line file is the top
    assert_eq!(pane.viewport().current_line(), 0);
}

#[test]
fn scenario_range_parse_last_thousand() {
    let file = fixture(&numbered(5000));
    let source = FileSource::open(file.path()).unwrap();
    let marks = BTreeMap::new();
    let ctx = ResolveContext {
        current: 0,
        total: source.line_count(),
        marks: &marks,
        source: &source,
    };

    assert_eq!(parse_range("$-1000-$", &ctx).unwrap(), (4000, 5000));
}

#[test]
fn scenario_filter_survives_growth_refresh() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[ERR] first\n[INF] noise\n").unwrap();
    file.flush().unwrap();

    let mut pane = pane_for_path(file.path());
    pane.render(80, 10);
    pane.set_level_and_above(Level::Error);
    assert_eq!(pane.filtered().line_count(), 1);

    file.write_all(b"[ERR] second\n").unwrap();
    file.flush().unwrap();

    // refresh marks the filter dirty; the next read rebuilds it
    assert!(pane.refresh().unwrap());
    assert_eq!(pane.filtered().line_count(), 2);
    assert_eq!(pane.filtered().original_line_number(1), Some(2));
}

fn pane_for_path(path: &std::path::Path) -> Pane {
    Pane::open(path, Arc::new(Config::default()), false).unwrap()
}

#[test]
fn scenario_search_then_slice_to_marks() {
    let content: String = (0..100)
        .map(|i| {
            if i == 20 || i == 60 {
                format!("checkpoint {i}\n")
            } else {
                format!("line {i}\n")
            }
        })
        .collect();
    let file = fixture(&content);
    let mut pane = pane_for(&file);
    pane.render(80, 24);

    pane.perform_search("checkpoint");
    assert_eq!(pane.search_results(), &[20, 60]);
    pane.set_mark('a');
    pane.next_search_result();
    pane.set_mark('b');

    pane.parse_and_slice("'a-'b").unwrap();
    assert_eq!(pane.source().line_count(), 40);
    assert_eq!(pane.source().get_line(0).unwrap().content, "checkpoint 20");
}
