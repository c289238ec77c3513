use crate::client::Usage;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const RULE_WIDTH: usize = 79;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to rotate {} to {}", from.display(), to.display())]
    Rotate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OutputError>;

/// Where a review was saved and where its predecessor went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: PathBuf,
    pub backup: Option<PathBuf>,
}

/// Path of numbered backup `n` for `path`, e.g. `REVIEW.md.~2~`.
pub fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".~{}~", n));
    PathBuf::from(name)
}

/// Move `path` into its numbered backup chain.
///
/// Existing backups each move up one slot, then the live file becomes `~1~`.
/// Returns `None` when `path` does not exist. Renames run from the highest
/// slot down so each one targets a free name, and the live file moves last:
/// a failure partway leaves every earlier version on disk.
pub fn rotate_backups(path: &Path) -> Result<Option<PathBuf>> {
    rotate_with(path, |from, to| fs::rename(from, to))
}

fn rotate_with<F>(path: &Path, mut rename: F) -> Result<Option<PathBuf>>
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    if fs::symlink_metadata(path).is_err() {
        return Ok(None);
    }

    let mut free = 1;
    while fs::symlink_metadata(backup_path(path, free)).is_ok() {
        free += 1;
    }

    let mut shift = |from: &Path, to: &Path| {
        rename(from, to).map_err(|source| OutputError::Rotate {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
    };

    for slot in (1..free).rev() {
        shift(&backup_path(path, slot), &backup_path(path, slot + 1))?;
    }

    let first = backup_path(path, 1);
    shift(path, &first)?;
    debug!(path = %path.display(), backups = free, "rotated backups");

    Ok(Some(first))
}

/// Save `content` to `path`, keeping any previous version as a numbered backup.
///
/// If rotation fails nothing is written.
pub fn write_review(path: &Path, content: &str) -> Result<WriteOutcome> {
    write_review_with(path, content, |from, to| fs::rename(from, to))
}

fn write_review_with<F>(path: &Path, content: &str, rename: F) -> Result<WriteOutcome>
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    let backup = rotate_with(path, rename)?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let write_err = |source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = options.open(path).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;

    info!(path = %path.display(), bytes = content.len(), "saved review");
    Ok(WriteOutcome {
        path: path.to_path_buf(),
        backup,
    })
}

/// Echo the review to `out`, then save it to `path`.
///
/// The file is written even when the echo fails (a closed stdout, say);
/// terminal errors are logged and only file errors are returned.
pub fn publish_review<W: Write>(
    out: &mut W,
    path: &Path,
    review: &str,
    usage: &Usage,
) -> Result<WriteOutcome> {
    if let Err(err) = print_review(out, review, usage) {
        warn!(error = %err, "could not print review");
    }

    let outcome = write_review(path, review)?;

    let saved = match &outcome.backup {
        Some(backup) => writeln!(
            out,
            "💾 Review saved to {} (previous version kept as {})",
            outcome.path.display(),
            backup.display()
        ),
        None => writeln!(out, "💾 Review saved to {}", outcome.path.display()),
    };
    if let Err(err) = saved {
        warn!(error = %err, "could not report saved review");
    }

    Ok(outcome)
}

/// Print the framed review and token usage.
pub fn print_review<W: Write>(out: &mut W, review: &str, usage: &Usage) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{}", rule)?;
    writeln!(out, "CODE REVIEW")?;
    writeln!(out, "{}", rule)?;
    writeln!(out)?;
    writeln!(out, "{}", review)?;
    writeln!(out)?;
    writeln!(out, "{}", rule)?;
    writeln!(
        out,
        "📊 Token Usage: Input: {} | Output: {} | Total: {}",
        usage.input_tokens,
        usage.output_tokens,
        usage.total()
    )?;
    writeln!(out, "{}", rule)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_appends_suffix_to_file_name() {
        assert_eq!(
            backup_path(Path::new("out/REQUESTED_CHANGES.md"), 1),
            PathBuf::from("out/REQUESTED_CHANGES.md.~1~")
        );
        assert_eq!(
            backup_path(Path::new("review"), 12),
            PathBuf::from("review.~12~")
        );
    }

    #[test]
    fn test_print_review_frames_text_and_usage() {
        let mut out = Vec::new();
        let usage = Usage {
            input_tokens: 100,
            output_tokens: 25,
        };
        print_review(&mut out, "All good.", &usage).unwrap();

        let text = String::from_utf8(out).unwrap();
        let rule = "=".repeat(RULE_WIDTH);
        assert!(text.starts_with(&format!("{}\nCODE REVIEW\n{}\n\nAll good.\n", rule, rule)));
        assert!(text.contains("Input: 100 | Output: 25 | Total: 125"));
        assert!(text.ends_with(&format!("{}\n", rule)));
    }

    #[test]
    fn test_failed_rotation_keeps_live_file_and_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("REVIEW.md");
        fs::write(&path, "live").unwrap();
        fs::write(backup_path(&path, 1), "one").unwrap();
        fs::write(backup_path(&path, 2), "two").unwrap();

        // First rename (~2~ -> ~3~) succeeds, the second (~1~ -> ~2~) fails.
        let mut calls = 0;
        let err = write_review_with(&path, "new", |from, to| {
            calls += 1;
            if calls == 1 {
                fs::rename(from, to)
            } else {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        })
        .unwrap_err();

        match err {
            OutputError::Rotate { from, to, .. } => {
                assert_eq!(from, backup_path(&path, 1));
                assert_eq!(to, backup_path(&path, 2));
            }
            other => panic!("expected rotate error, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "live");
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "one");
        assert_eq!(fs::read_to_string(backup_path(&path, 3)).unwrap(), "two");
        assert!(!backup_path(&path, 2).exists());
    }

    #[test]
    fn test_failed_live_rename_leaves_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("REVIEW.md");
        fs::write(&path, "live").unwrap();

        let err = write_review_with(&path, "new", |_, _| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        })
        .unwrap_err();

        assert!(matches!(err, OutputError::Rotate { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "live");
        assert!(!backup_path(&path, 1).exists());
    }
}
