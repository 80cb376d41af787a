//! Clipboard shell-out for yank operations.
//!
//! The first available system clipboard tool receives the text on stdin.
//! The spawn is fire-and-forget: completion does not feed back into the
//! state machine, and failures only show up in the debug log.

use std::io::Write;
use std::process::{Command, Stdio};

const CLIPBOARD_COMMANDS: &[&[&str]] = &[
    &["wl-copy"],
    &["xclip", "-selection", "clipboard"],
    &["xsel", "-b"],
    &["pbcopy"],
];

/// Pipe text to the system clipboard, if any known tool is present.
pub fn copy(text: &str) {
    for command in CLIPBOARD_COMMANDS {
        let (program, args) = (command[0], &command[1..]);
        let spawned = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let Ok(mut child) = spawned else {
            continue;
        };

        if let Some(stdin) = child.stdin.take() {
            let mut stdin = stdin;
            if stdin.write_all(text.as_bytes()).is_err() {
                log::debug!("clipboard write to {program} failed");
            }
        }
        // Dropping the child handle leaves it running; no completion wait
        return;
    }
    log::debug!("no clipboard tool found");
}
