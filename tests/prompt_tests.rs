use pr_review::ChangeSet;
use pr_review::prompt::{REVIEW_RUBRIC, build_review_prompt, load_context_files};
use std::fs;
use std::path::PathBuf;

fn changes(diff: &str, changed_files: &str, commit_log: &str) -> ChangeSet {
    ChangeSet {
        diff: diff.to_string(),
        changed_files: changed_files.to_string(),
        commit_log: commit_log.to_string(),
    }
}

#[test]
fn prompt_contains_rubric_files_and_diff() {
    let prompt = build_review_prompt(&changes("+foo", "M file.go", ""), "");

    assert!(prompt.starts_with(REVIEW_RUBRIC));
    assert_eq!(prompt.matches(REVIEW_RUBRIC).count(), 1);
    assert!(prompt.contains("## Changed Files\n```\nM file.go\n```\n"));
    assert!(!prompt.contains("## Recent Commit Messages"));
    assert!(prompt.contains("## Full Diff\n```diff\n+foo\n```\n"));
    assert!(!prompt.contains("## Additional Context"));
    assert!(prompt.ends_with("\n\nPlease provide your comprehensive code review."));
}

#[test]
fn prompt_is_deterministic() {
    let input = changes("+foo\n-bar", "M a.rs\nA b.rs", "abc - msg (me, now)");
    let first = build_review_prompt(&input, "ctx");
    let second = build_review_prompt(&input.clone(), "ctx");
    assert_eq!(first, second);
}

#[test]
fn prompt_exact_layout_with_every_section() {
    let prompt = build_review_prompt(
        &changes("+foo", "M file.go", "abc1234 - add foo (dev, 2 hours ago)"),
        "\n\n--- Context from notes.md ---\nnotes\n",
    );

    let expected = format!(
        "{}## Changed Files\n```\nM file.go\n```\n\n\
         ## Recent Commit Messages\n```\nabc1234 - add foo (dev, 2 hours ago)\n```\n\n\
         ## Full Diff\n```diff\n+foo\n```\n\
         \n## Additional Context\n\n\n--- Context from notes.md ---\nnotes\n\n\
         \n\nPlease provide your comprehensive code review.",
        REVIEW_RUBRIC
    );
    assert_eq!(prompt, expected);
}

#[test]
fn changed_files_section_always_rendered() {
    let prompt = build_review_prompt(&changes("+foo", "", ""), "");
    assert!(prompt.contains("## Changed Files\n```\n\n```\n\n## Full Diff"));
}

#[test]
fn commit_section_only_when_present() {
    let with = build_review_prompt(&changes("+foo", "M f", "abc - msg"), "");
    let without = build_review_prompt(&changes("+foo", "M f", ""), "");

    assert!(with.contains("## Recent Commit Messages\n```\nabc - msg\n```\n\n"));
    assert!(!without.contains("Recent Commit Messages"));
}

#[test]
fn diff_is_included_verbatim() {
    let diff = "diff --git a/x b/x\n@@ -1 +1 @@\n-old\n+new\n```\n";
    let prompt = build_review_prompt(&changes(diff, "M x", ""), "");
    assert!(prompt.contains(diff));
}

#[test]
fn context_files_concatenated_with_headers() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("design.md");
    let second = dir.path().join("notes.txt");
    fs::write(&first, "# Design").unwrap();
    fs::write(&second, "remember the cache").unwrap();

    let context = load_context_files(&[first.clone(), second.clone()]);

    assert_eq!(
        context,
        format!(
            "\n\n--- Context from {} ---\n# Design\n\n\n--- Context from {} ---\nremember the cache\n",
            first.display(),
            second.display()
        )
    );
}

#[test]
fn unreadable_context_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present.md");
    let missing = dir.path().join("missing.md");
    fs::write(&present, "here").unwrap();

    let context = load_context_files(&[missing.clone(), present.clone()]);

    assert!(!context.contains(&missing.display().to_string()));
    assert!(context.contains("here"));
}

#[test]
fn non_utf8_context_file_is_kept_with_replacement_chars() {
    let dir = tempfile::tempdir().unwrap();
    let latin1 = dir.path().join("latin1.txt");
    fs::write(&latin1, b"caf\xe9 au lait").unwrap();

    let context = load_context_files(&[latin1.clone()]);

    assert_eq!(
        context,
        format!(
            "\n\n--- Context from {} ---\ncaf\u{FFFD} au lait\n",
            latin1.display()
        )
    );
}

#[test]
fn no_context_files_yields_empty_context() {
    let context = load_context_files::<PathBuf>(&[]);
    assert!(context.is_empty());

    let prompt = build_review_prompt(&changes("+foo", "M f", ""), &context);
    assert!(!prompt.contains("## Additional Context"));
}
