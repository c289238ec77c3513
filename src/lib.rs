pub mod cli;
pub mod client;
pub mod config;
pub mod git;
pub mod output;
pub mod prompt;

/// Everything the collector gathered about the changes under review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Unified diff between the base ref and HEAD.
    pub diff: String,
    /// `git diff --name-status` summary, or a placeholder if it could not be read.
    pub changed_files: String,
    /// One line per commit reachable from HEAD but not from the base ref.
    pub commit_log: String,
}

impl ChangeSet {
    /// True when there is nothing to review.
    pub fn is_empty(&self) -> bool {
        self.diff.trim().is_empty()
    }
}
