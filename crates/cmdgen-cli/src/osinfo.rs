//! Short OS description for the system prompt.

use std::fs;

/// Returns something like `linux / Ubuntu 24.04.1 LTS / x86_64`.
pub fn detect_os() -> String {
    let mut parts: Vec<String> = vec![std::env::consts::OS.to_string()];
    if std::env::consts::OS == "linux"
        && let Some(pretty) = os_release_pretty_name()
    {
        parts.push(pretty);
    }
    parts.push(std::env::consts::ARCH.to_string());
    parts.join(" / ")
}

fn os_release_pretty_name() -> Option<String> {
    let release = fs::read_to_string("/etc/os-release").ok()?;
    release
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|value| value.trim().trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_os_has_os_and_arch() {
        let description = detect_os();
        assert!(description.contains(std::env::consts::OS));
        assert!(description.contains(std::env::consts::ARCH));
        assert!(description.contains(" / "));
    }
}
