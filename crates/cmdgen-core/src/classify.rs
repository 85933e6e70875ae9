//! Response cleaning and one-liner/script classification.

/// One-liner ceiling. Anything at or above this, or anything with a
/// newline, is materialized as a script. The shell wrapper depends on this
/// exact predicate, so do not tune it.
pub const ONELINER_MAX_CHARS: usize = 512;

/// Classifier outcome for cleaned model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Short, single-line output meant for direct readline injection.
    OneLiner,
    /// Multi-line output, materialized as a file.
    Script,
}

/// Removes markdown fence lines and trims whitespace.
///
/// Every line whose trimmed form starts with a fence marker is dropped
/// (with or without a language tag), remaining lines are right-trimmed, and
/// surrounding blank lines are stripped. This is the only form ever written
/// to disk or classified.
pub fn clean(raw: &str) -> String {
    let kept: Vec<&str> = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .map(str::trim_end)
        .collect();
    kept.join("\n").trim().to_string()
}

/// Heuristic: fits comfortably in a readline prompt.
pub fn classify(text: &str) -> ReplyKind {
    if !text.contains('\n') && text.chars().count() < ONELINER_MAX_CHARS {
        ReplyKind::OneLiner
    } else {
        ReplyKind::Script
    }
}
