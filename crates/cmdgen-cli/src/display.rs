//! stderr presentation: separator rules, saved-file preview, diff coloring.
//!
//! stdout is reserved for the shell wrapper, so everything here goes to
//! stderr.

use std::path::Path;
use std::process::Command;

use colored::Colorize;

use crate::clipboard::which;

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| usize::from(cols))
        .unwrap_or(80)
}

fn rule() -> String {
    "_".repeat(terminal_width())
}

/// Prints `text` between full-width separator rules.
pub fn show_block(text: &str) {
    let line = rule();
    eprintln!("{line}");
    eprintln!("{text}");
    eprintln!("{line}");
}

/// Pretty-prints a saved file via bat (when available) or a plain dump.
pub fn show_file(path: &Path) {
    if let Some(bat) = which("bat").or_else(|| which("batcat")) {
        let status = Command::new(bat)
            .args(["--paging=never", "--style=-numbers"])
            .arg(path)
            .status();
        if status.map(|s| s.success()).unwrap_or(false) {
            eprintln!();
            return;
        }
    }
    match std::fs::read_to_string(path) {
        Ok(content) => show_block(&content),
        Err(err) => eprintln!("could not display {}: {err}", path.display()),
    }
}

/// Writes a review line to stderr, coloring unified-diff markers.
pub fn show_review_line(text: &str) {
    for line in text.lines() {
        if line.starts_with("+++") || line.starts_with("---") || line.starts_with("@@") {
            eprintln!("{}", line.dimmed());
        } else if line.starts_with('+') {
            eprintln!("{}", line.green());
        } else if line.starts_with('-') {
            eprintln!("{}", line.red());
        } else {
            eprintln!("{line}");
        }
    }
}
