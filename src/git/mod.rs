use crate::ChangeSet;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

/// Substituted for the changed-files summary when git cannot produce it.
pub const CHANGED_FILES_PLACEHOLDER: &str = "Error getting changed files";

const COMMIT_LOG_FORMAT: &str = "--pretty=format:%h - %s (%an, %ar)";

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git command failed: {0}")]
    CommandFailed(String),
    #[error("invalid git ref: {0}")]
    InvalidRef(String),
    #[error("failed to run git")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GitError>;

/// Read-only queries the collector needs from version control.
pub trait ChangeSource {
    /// Unified diff of `head` against its merge base with `base`.
    fn diff(&self, base: &str, head: &str) -> Result<String>;
    /// Name and status of every path changed between `base` and `head`.
    fn changed_files(&self, base: &str, head: &str) -> Result<String>;
    /// One line per commit reachable from `head` but not from `base`.
    fn commit_log(&self, base: &str, head: &str) -> Result<String>;
}

/// [`ChangeSource`] backed by the `git` executable in the current directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl ChangeSource for GitCli {
    fn diff(&self, base: &str, head: &str) -> Result<String> {
        run_git(&["diff", &format!("{}...{}", base, head)])
    }

    fn changed_files(&self, base: &str, head: &str) -> Result<String> {
        let output = run_git(&["diff", "--name-status", &format!("{}...{}", base, head)])?;
        Ok(output.trim().to_string())
    }

    fn commit_log(&self, base: &str, head: &str) -> Result<String> {
        let output = run_git(&["log", &format!("{}..{}", base, head), COMMIT_LOG_FORMAT])?;
        Ok(output.trim().to_string())
    }
}

/// Gather the diff and its supporting context.
///
/// A diff failure is returned as an error. The changed-files summary and
/// commit log are supplementary: if either query fails a warning is logged
/// and a placeholder is used instead.
pub fn collect_changes(source: &dyn ChangeSource, base: &str, head: &str) -> Result<ChangeSet> {
    validate_git_ref(base)?;
    validate_git_ref(head)?;

    let diff = source.diff(base, head)?;

    let changed_files = source.changed_files(base, head).unwrap_or_else(|err| {
        warn!(error = %err, "could not list changed files");
        CHANGED_FILES_PLACEHOLDER.to_string()
    });

    let commit_log = source.commit_log(base, head).unwrap_or_else(|err| {
        warn!(error = %err, "could not read commit log");
        String::new()
    });

    Ok(ChangeSet {
        diff,
        changed_files,
        commit_log,
    })
}

fn run_git(args: &[&str]) -> Result<String> {
    debug!(?args, "running git");
    let output = Command::new("git").args(args).output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::CommandFailed(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or_default(),
            stderr.trim()
        )));
    }

    Ok(decode(output.stdout))
}

/// Diffs of non-UTF-8 files still go to the reviewer; invalid bytes become U+FFFD.
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

/// Validate a user-supplied git ref.
///
/// Git is spawned without a shell, so only option injection and malformed
/// input matter: a leading `-`, whitespace and control characters are rejected.
/// Anything else is left for git to judge.
pub fn validate_git_ref(ref_str: &str) -> Result<()> {
    if ref_str.is_empty() {
        return Err(GitError::InvalidRef("Empty git ref".to_string()));
    }

    if ref_str.starts_with('-') {
        return Err(GitError::InvalidRef(format!(
            "git ref may not start with '-': {}",
            ref_str
        )));
    }

    if let Some(ch) = ref_str
        .chars()
        .find(|ch| ch.is_whitespace() || ch.is_control())
    {
        return Err(GitError::InvalidRef(format!(
            "Invalid character in git ref: {:?}",
            ch
        )));
    }

    Ok(())
}

/// Detect the default branch (origin/HEAD -> main -> master fallback).
pub fn detect_default_branch() -> Result<String> {
    let output = Command::new("git")
        .arg("symbolic-ref")
        .arg("refs/remotes/origin/HEAD")
        .output()?;

    if output.status.success() {
        let symbolic = decode(output.stdout);
        if let Some(branch) = symbolic.trim().strip_prefix("refs/remotes/origin/") {
            if !branch.is_empty() {
                return Ok(branch.to_string());
            }
        }
    }

    let output = Command::new("git")
        .arg("rev-parse")
        .arg("--verify")
        .arg("--quiet")
        .arg("main")
        .output()?;

    if output.status.success() {
        return Ok("main".to_string());
    }

    Ok("master".to_string())
}

/// Get the current branch name (None for detached HEAD).
pub fn current_branch() -> Result<Option<String>> {
    let branch = run_git(&["branch", "--show-current"])?.trim().to_string();
    if branch.is_empty() {
        Ok(None)
    } else {
        Ok(Some(branch))
    }
}
