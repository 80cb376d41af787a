//! Consolidating multiple log files into a single tailed view.
//!
//! A [`Writer`] merges N sources into one output file in the temp
//! directory: it primes the output with the last lines of each source, then
//! polls for growth on a background thread, appending new lines prefixed
//! with `[basename:lineno] `. The pager opens the output file like any other
//! log and follows it.

use crate::error::{MlessError, Result};
use crate::source::{FileSource, LineProvider};
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Poll cadence for source growth.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// How many trailing lines of each source seed the output.
pub const DEFAULT_PRIME_LINES: usize = 100;

struct SourceWatcher {
    source: FileSource,
    name: String,
    /// Next line to copy out
    position: usize,
}

/// Merges multiple sources into one growing output file.
pub struct Writer {
    output_path: PathBuf,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Writer {
    /// Open the sources, prime the output, and start the polling thread.
    pub fn spawn(paths: &[PathBuf], prime_lines: usize) -> Result<Self> {
        if paths.is_empty() {
            return Err(MlessError::config("no files to consolidate"));
        }

        let output_path = output_path_for(paths);
        let mut output = File::create(&output_path)
            .map_err(|e| MlessError::file_error("Failed to create consolidated output", e))?;

        let mut watchers = Vec::with_capacity(paths.len());
        for path in paths {
            let source = FileSource::open(path)?;
            watchers.push(SourceWatcher {
                name: basename(path),
                position: 0,
                source,
            });
        }

        for watcher in &mut watchers {
            prime(watcher, &mut output, prime_lines)?;
        }
        output
            .flush()
            .map_err(|e| MlessError::file_error("Failed to flush consolidated output", e))?;

        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            let output_path = output_path.clone();
            std::thread::spawn(move || poll_loop(watchers, output_path, stop))
        };

        Ok(Self {
            output_path,
            stop,
            handle: Some(handle),
        })
    }

    /// The merged output file the pager should open.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Stop polling and remove the output file.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let _ = std::fs::remove_file(&self.output_path);
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown();
        }
    }
}

fn poll_loop(mut watchers: Vec<SourceWatcher>, output_path: PathBuf, stop: Arc<AtomicBool>) {
    let output = OpenOptions::new().append(true).open(&output_path);
    let Ok(mut output) = output else {
        log::warn!("consolidated output vanished: {}", output_path.display());
        return;
    };

    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);

        let mut wrote = false;
        for watcher in &mut watchers {
            match watcher.source.refresh() {
                Ok(0) => {}
                Ok(_) => {
                    if write_new_lines(watcher, &mut output).is_ok() {
                        wrote = true;
                    }
                }
                Err(err) => log::debug!("consolidate refresh {}: {err}", watcher.name),
            }
        }
        if wrote {
            let _ = output.flush();
        }
    }
}

fn prime(watcher: &mut SourceWatcher, output: &mut File, prime_lines: usize) -> Result<()> {
    let total = watcher.source.line_count();
    watcher.position = total.saturating_sub(prime_lines);
    write_new_lines(watcher, output)
}

fn write_new_lines(watcher: &mut SourceWatcher, output: &mut File) -> Result<()> {
    let total = watcher.source.line_count();
    for i in watcher.position..total {
        let Some(line) = watcher.source.get_line(i) else {
            continue;
        };
        writeln!(output, "[{}:{}] {}", watcher.name, i + 1, line.content)
            .map_err(|e| MlessError::file_error("Failed to write consolidated line", e))?;
    }
    watcher.position = total;
    Ok(())
}

fn output_path_for(paths: &[PathBuf]) -> PathBuf {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    paths.hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    std::env::temp_dir().join(format!("mless-consolidated-{:08x}.log", hasher.finish() as u32))
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn fixture(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_priming_merges_tails_with_prefixes() {
        let a = fixture("a1\na2\na3\n");
        let b = fixture("b1\n");

        let writer = Writer::spawn(
            &[a.path().to_path_buf(), b.path().to_path_buf()],
            2,
        )
        .unwrap();
        let output = std::fs::read_to_string(writer.output_path()).unwrap();

        let name_a = a.path().file_name().unwrap().to_string_lossy();
        let name_b = b.path().file_name().unwrap().to_string_lossy();
        // Only the last 2 lines of each source are primed
        assert!(!output.contains("a1"));
        assert!(output.contains(&format!("[{name_a}:2] a2")));
        assert!(output.contains(&format!("[{name_a}:3] a3")));
        assert!(output.contains(&format!("[{name_b}:1] b1")));

        writer.close();
    }

    #[test]
    fn test_close_removes_output() {
        let a = fixture("x\n");
        let writer = Writer::spawn(&[a.path().to_path_buf()], 10).unwrap();
        let path = writer.output_path().to_path_buf();
        assert!(path.exists());

        writer.close();
        assert!(!path.exists());
    }

    #[test]
    fn test_spawn_rejects_empty_input() {
        assert!(Writer::spawn(&[], 10).is_err());
    }

    #[test]
    fn test_appended_lines_are_polled_in() {
        let mut a = fixture("start\n");
        let writer = Writer::spawn(&[a.path().to_path_buf()], 10).unwrap();

        a.write_all(b"appended\n").unwrap();
        a.flush().unwrap();

        // Wait out at least one poll cycle
        let deadline = std::time::Instant::now() + Duration::from_secs(3);
        loop {
            let output = std::fs::read_to_string(writer.output_path()).unwrap();
            if output.contains("appended") {
                assert!(output.contains(":2] appended"));
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "appended line never reached the consolidated output"
            );
            std::thread::sleep(Duration::from_millis(50));
        }

        writer.close();
    }
}
