//! Edit/append workflow.
//!
//! Backup the target, apply the model's output, show a unified diff, ask
//! for confirmation, then commit or revert. A revert can be followed by a
//! retry of the whole pipeline at a lowered sampling temperature; the retry
//! is a bounded loop, not recursion, so it always terminates.

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use similar::TextDiff;
use tracing::info;

use crate::error::Error;

/// File-targeted operation kind. The two flags are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    /// Overwrite the target with the model's output.
    Edit,
    /// Append the model's output to the target.
    Append,
}

/// Ceiling on regenerate-and-review rounds, so a scripted stdin that keeps
/// answering "retry" cannot spin the workflow forever.
pub const MAX_RETRY_ROUNDS: u32 = 10;

/// Terminal state of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The new content was kept.
    Committed,
    /// The original content was restored and no further retry requested.
    Reverted,
}

/// One backup/mutate/confirm cycle against a target file.
///
/// The backup is created before any mutation and is the sole rollback
/// source; it exists for the whole window between "file mutated" and "user
/// decision obtained". Correctness assumes no concurrent writer touches the
/// target inside that window.
#[derive(Debug)]
pub struct EditSession {
    target: PathBuf,
    backup: Option<PathBuf>,
    original: String,
    op: FileOp,
}

impl EditSession {
    /// Reads the target (absent file reads as empty) and records the
    /// operation. No mutation happens yet.
    pub fn begin(target: &Path, op: FileOp) -> Result<Self, Error> {
        let original = match fs::read_to_string(target) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            target: target.to_path_buf(),
            backup: None,
            original,
            op,
        })
    }

    /// Content of the target as it was when the session began.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Backs the target up to a `.bak` sibling (when it exists) and writes
    /// the new content: a full overwrite for edit, or the original plus the
    /// additions for append.
    pub fn apply(&mut self, cleaned: &str) -> Result<(), Error> {
        if self.target.exists() {
            let backup = backup_path(&self.target);
            fs::copy(&self.target, &backup)?;
            self.backup = Some(backup);
        }
        let new_content = match self.op {
            FileOp::Edit => format!("{cleaned}\n"),
            FileOp::Append => {
                let mut text = self.original.clone();
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(cleaned);
                text.push('\n');
                text
            }
        };
        fs::write(&self.target, new_content)?;
        Ok(())
    }

    /// Unified diff between the original content and the target as written.
    pub fn unified_diff(&self) -> Result<String, Error> {
        let new_content = fs::read_to_string(&self.target)?;
        let diff = TextDiff::from_lines(self.original.as_str(), new_content.as_str());
        Ok(diff
            .unified_diff()
            .context_radius(3)
            .header("before", "after")
            .to_string())
    }

    /// Keeps the new content and drops the backup.
    pub fn commit(mut self) {
        if let Some(backup) = self.backup.take() {
            let _ = fs::remove_file(backup);
        }
    }

    /// Restores the target byte-for-byte from the backup and removes the
    /// backup. A target that did not exist before the session is removed.
    pub fn revert(mut self) -> Result<(), Error> {
        match self.backup.take() {
            Some(backup) => {
                fs::copy(&backup, &self.target)?;
                fs::remove_file(backup)?;
            }
            None => {
                if self.target.exists() {
                    fs::remove_file(&self.target)?;
                }
            }
        }
        Ok(())
    }
}

fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Empty input or a yes-family token keeps the change.
pub fn accepts_change(input: &str) -> bool {
    let token = input.trim().to_ascii_lowercase();
    token.is_empty() || is_yes(&token)
}

/// Only an explicit yes-family token triggers a retry.
pub fn wants_retry(input: &str) -> bool {
    is_yes(&input.trim().to_ascii_lowercase())
}

fn is_yes(token: &str) -> bool {
    matches!(token, "y" | "yes" | "yeah" | "yep")
}

/// Next sampling temperature after a revert: a 0.1 step above 0.2, a 0.01
/// step below, clamped at zero. The 0.2 threshold is deliberate and must
/// not be "fixed".
pub fn lowered_temperature(temperature: f64) -> f64 {
    if temperature > 0.2 {
        temperature - 0.1
    } else {
        (temperature - 0.01).max(0.0)
    }
}

/// Drives the whole workflow: query, mutate, review, confirm, and possibly
/// retry at a lowered temperature.
///
/// `query` maps (temperature, original content) to the cleaned model reply;
/// `input` supplies the user's confirmation answers; `show` receives every
/// review line (diff and questions) for display.
pub fn run_edit_workflow<Q, R, D>(
    target: &Path,
    op: FileOp,
    mut temperature: f64,
    mut query: Q,
    input: &mut R,
    mut show: D,
) -> Result<EditOutcome, Error>
where
    Q: FnMut(f64, &str) -> Result<String, Error>,
    R: BufRead,
    D: FnMut(&str),
{
    for _ in 0..MAX_RETRY_ROUNDS {
        let mut session = EditSession::begin(target, op)?;
        let cleaned = query(temperature, session.original())?;
        session.apply(&cleaned)?;

        show(&session.unified_diff()?);
        show("Keep these changes? [Y/n] ");
        if accepts_change(&read_line(input)?) {
            session.commit();
            info!("changes kept in {}", target.display());
            return Ok(EditOutcome::Committed);
        }

        session.revert()?;
        info!("reverted {}", target.display());
        show("Retry with a lower temperature? [y/N] ");
        if !wants_retry(&read_line(input)?) {
            return Ok(EditOutcome::Reverted);
        }
        temperature = lowered_temperature(temperature);
    }
    Ok(EditOutcome::Reverted)
}

fn read_line<R: BufRead>(input: &mut R) -> Result<String, Error> {
    let mut buf = String::new();
    input.read_line(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn target_in(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("notes.sh")
    }

    #[test]
    fn test_edit_overwrites_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);
        fs::write(&target, "A").unwrap();

        let mut session = EditSession::begin(&target, FileOp::Edit).unwrap();
        session.apply("B").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "B\n");
        assert!(backup_path(&target).exists());

        session.commit();
        assert_eq!(fs::read_to_string(&target).unwrap(), "B\n");
        assert!(!backup_path(&target).exists());
    }

    #[test]
    fn test_revert_restores_exact_original_and_removes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);
        fs::write(&target, "A").unwrap();

        let mut session = EditSession::begin(&target, FileOp::Edit).unwrap();
        session.apply("B").unwrap();
        session.revert().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"A");
        assert!(!backup_path(&target).exists());
    }

    #[test]
    fn test_append_separates_with_single_newline() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);
        fs::write(&target, "line one").unwrap();

        let mut session = EditSession::begin(&target, FileOp::Append).unwrap();
        session.apply("line two").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "line one\nline two\n");
    }

    #[test]
    fn test_append_to_newline_terminated_file_adds_nothing_extra() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);
        fs::write(&target, "line one\n").unwrap();

        let mut session = EditSession::begin(&target, FileOp::Append).unwrap();
        session.apply("line two").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "line one\nline two\n");
    }

    #[test]
    fn test_missing_target_reads_as_empty_and_revert_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);

        let mut session = EditSession::begin(&target, FileOp::Edit).unwrap();
        assert_eq!(session.original(), "");
        session.apply("fresh content").unwrap();
        assert!(target.exists());

        session.revert().unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_unified_diff_shows_change() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);
        fs::write(&target, "old line\n").unwrap();

        let mut session = EditSession::begin(&target, FileOp::Edit).unwrap();
        session.apply("new line").unwrap();
        let diff = session.unified_diff().unwrap();
        assert!(diff.contains("-old line"));
        assert!(diff.contains("+new line"));
    }

    #[test]
    fn test_accepts_change_tokens() {
        assert!(accepts_change(""));
        assert!(accepts_change("\n"));
        assert!(accepts_change("y\n"));
        assert!(accepts_change("YES"));
        assert!(!accepts_change("n"));
        assert!(!accepts_change("no thanks"));
    }

    #[test]
    fn test_wants_retry_requires_explicit_yes() {
        assert!(wants_retry("y"));
        assert!(wants_retry("Yes\n"));
        assert!(!wants_retry(""));
        assert!(!wants_retry("\n"));
        assert!(!wants_retry("n"));
    }

    #[test]
    fn test_temperature_decay() {
        assert!((lowered_temperature(0.5) - 0.4).abs() < 1e-9);
        assert!((lowered_temperature(0.15) - 0.14).abs() < 1e-9);
        assert!((lowered_temperature(0.21) - 0.11).abs() < 1e-9);
        assert!((lowered_temperature(0.2) - 0.19).abs() < 1e-9);
        assert!(lowered_temperature(0.005) >= 0.0);
    }

    #[test]
    fn test_workflow_commit_on_first_round() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);
        fs::write(&target, "A\n").unwrap();

        let mut input = Cursor::new(b"\n".to_vec());
        let outcome = run_edit_workflow(
            &target,
            FileOp::Edit,
            0.5,
            |_, _| Ok("B".to_string()),
            &mut input,
            |_| {},
        )
        .unwrap();

        assert_eq!(outcome, EditOutcome::Committed);
        assert_eq!(fs::read_to_string(&target).unwrap(), "B\n");
    }

    #[test]
    fn test_workflow_revert_then_retry_lowers_temperature() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);
        fs::write(&target, "A\n").unwrap();

        // round 1: reject, retry; round 2: accept
        let mut input = Cursor::new(b"n\ny\n\n".to_vec());
        let mut temps: Vec<f64> = Vec::new();
        let outcome = run_edit_workflow(
            &target,
            FileOp::Edit,
            0.5,
            |temperature, original| {
                temps.push(temperature);
                assert_eq!(original, "A\n");
                Ok(format!("attempt {}", temps.len()))
            },
            &mut input,
            |_| {},
        )
        .unwrap();

        assert_eq!(outcome, EditOutcome::Committed);
        assert_eq!(temps.len(), 2);
        assert!((temps[0] - 0.5).abs() < 1e-9);
        assert!((temps[1] - 0.4).abs() < 1e-9);
        assert_eq!(fs::read_to_string(&target).unwrap(), "attempt 2\n");
    }

    #[test]
    fn test_workflow_revert_without_retry_restores_original() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);
        fs::write(&target, "A").unwrap();

        let mut input = Cursor::new(b"n\nn\n".to_vec());
        let outcome = run_edit_workflow(
            &target,
            FileOp::Edit,
            0.3,
            |_, _| Ok("B".to_string()),
            &mut input,
            |_| {},
        )
        .unwrap();

        assert_eq!(outcome, EditOutcome::Reverted);
        assert_eq!(fs::read(&target).unwrap(), b"A");
        assert!(!backup_path(&target).exists());
    }

    #[test]
    fn test_workflow_gives_up_at_the_round_cap() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);
        fs::write(&target, "A\n").unwrap();

        // reject and ask for another round every time
        let mut input = Cursor::new(b"n\ny\n".repeat(MAX_RETRY_ROUNDS as usize));
        let mut rounds = 0u32;
        let outcome = run_edit_workflow(
            &target,
            FileOp::Edit,
            0.5,
            |_, _| {
                rounds += 1;
                Ok("B".to_string())
            },
            &mut input,
            |_| {},
        )
        .unwrap();

        assert_eq!(outcome, EditOutcome::Reverted);
        assert_eq!(rounds, MAX_RETRY_ROUNDS);
        assert_eq!(fs::read_to_string(&target).unwrap(), "A\n");
        assert!(!backup_path(&target).exists());
    }

    #[test]
    fn test_workflow_query_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_in(&dir);

        let mut input = Cursor::new(Vec::new());
        let result = run_edit_workflow(
            &target,
            FileOp::Edit,
            0.3,
            |_, _| Err(Error::NoResponse),
            &mut input,
            |_| {},
        );
        assert!(matches!(result, Err(Error::NoResponse)));
    }
}
