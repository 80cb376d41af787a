//! mless - Interactive terminal pager for large, growing log files.

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use mless::consolidate;
use mless::ui::ModelOptions;
use mless::{Application, Model};
use std::io::{IsTerminal, Read, Write};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging for development (RUST_LOG gated, silent by default)
    env_logger::init();

    let matches = Command::new("mless")
        .version(mless::VERSION)
        .disable_version_flag(true)
        .about("An interactive terminal pager for large log files")
        .long_about(
            "mless is a less-style pager for multi-gigabyte log files that may grow \
             while being read, with level/text filtering, time navigation, slicing, \
             and split views.",
        )
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::Version),
        )
        .arg(
            Arg::new("file")
                .help("Log files to view (two files open a split view)")
                .num_args(0..)
                .index(1),
        )
        .arg(
            Arg::new("cache")
                .short('c')
                .help("Cache files locally (useful for network mounts)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("consolidate")
                .short('C')
                .long("consolidate")
                .help("Consolidate multiple files into a single merged view")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("slice")
                .short('S')
                .long("slice")
                .value_name("RANGE")
                .help("Apply an initial slice (e.g. 1000-5000, 100-$, .-500)"),
        )
        .arg(
            Arg::new("time")
                .short('t')
                .long("time")
                .value_name("TIME")
                .help("Jump to a time at startup (e.g. 14:00, 14:30:00)"),
        )
        .get_matches();

    let mut paths: Vec<PathBuf> = matches
        .get_many::<String>("file")
        .map(|files| files.map(PathBuf::from).collect())
        .unwrap_or_default();

    // Keep temp spools alive for the program's lifetime
    let mut _stdin_spool = None;
    let mut _consolidator = None;

    if paths.is_empty() {
        if std::io::stdin().is_terminal() {
            anyhow::bail!("no input: pass a file or pipe data on stdin");
        }
        let spool = spool_stdin()?;
        paths.push(spool.path().to_path_buf());
        _stdin_spool = Some(spool);
    }

    for path in &paths {
        if !path.exists() {
            anyhow::bail!("File does not exist: {}", path.display());
        }
    }

    if matches.get_flag("consolidate") && paths.len() > 1 {
        let writer = consolidate::Writer::spawn(&paths, consolidate::DEFAULT_PRIME_LINES)?;
        paths = vec![writer.output_path().to_path_buf()];
        _consolidator = Some(writer);
    }

    let opts = ModelOptions {
        paths,
        cache_files: matches.get_flag("cache"),
        initial_slice: matches.get_one::<String>("slice").cloned(),
        initial_time: matches.get_one::<String>("time").cloned(),
    };

    let model = Model::new(opts)?;
    Application::new(model).run()?;

    if let Some(writer) = _consolidator.take() {
        writer.close();
    }

    Ok(())
}

/// Read piped stdin into a temp file the pager can mmap.
fn spool_stdin() -> Result<tempfile::NamedTempFile> {
    let mut spool = tempfile::Builder::new()
        .prefix("mless-stdin-")
        .suffix(".log")
        .tempfile()?;

    let mut stdin = std::io::stdin().lock();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = stdin.read(&mut buf)?;
        if n == 0 {
            break;
        }
        spool.write_all(&buf[..n])?;
    }
    spool.flush()?;
    Ok(spool)
}
