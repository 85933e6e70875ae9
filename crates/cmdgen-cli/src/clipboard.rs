//! Clipboard copy via the first available system utility.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Finds a clipboard copy command available on this system.
fn detect_clipboard_cmd() -> Option<Vec<&'static str>> {
    if std::env::consts::OS == "macos" && which("pbcopy").is_some() {
        return Some(vec!["pbcopy"]);
    }
    if std::env::var_os("WAYLAND_DISPLAY").is_some() && which("wl-copy").is_some() {
        return Some(vec!["wl-copy"]);
    }
    if which("xclip").is_some() {
        return Some(vec!["xclip", "-selection", "clipboard"]);
    }
    if which("xsel").is_some() {
        return Some(vec!["xsel", "--clipboard", "--input"]);
    }
    None
}

/// Copies `text` to the system clipboard. Returns true on success.
pub fn copy(text: &str) -> bool {
    let Some(cmd) = detect_clipboard_cmd() else {
        return false;
    };
    let spawned = Command::new(cmd[0])
        .args(&cmd[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let Ok(mut child) = spawned else {
        return false;
    };
    if let Some(stdin) = child.stdin.as_mut()
        && stdin.write_all(text.as_bytes()).is_err()
    {
        return false;
    }
    drop(child.stdin.take());
    child.wait().map(|status| status.success()).unwrap_or(false)
}

/// Minimal PATH lookup, enough for clipboard and pager detection.
pub fn which(bin: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}
