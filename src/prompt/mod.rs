use crate::ChangeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Fixed instructions that open every review prompt.
pub const REVIEW_RUBRIC: &str = "You are an expert code reviewer. Please perform a thorough and comprehensive review of this Pull Request.

Your review should cover:

1. **Code Quality & Best Practices**
   - Design patterns and architecture
   - Code organization and structure
   - Naming conventions and readability
   - DRY principle adherence
   - SOLID principles where applicable

2. **Potential Issues**
   - Bugs or logic errors
   - Edge cases not handled
   - Race conditions or concurrency issues
   - Memory leaks or performance problems
   - Security vulnerabilities

3. **Testing**
   - Test coverage adequacy
   - Missing test cases
   - Test quality and effectiveness

4. **Performance**
   - Algorithmic complexity
   - Database query efficiency
   - Resource usage (memory, CPU, network)
   - Caching opportunities

5. **Security**
   - Input validation
   - Authentication/authorization issues
   - SQL injection, XSS, or other vulnerabilities
   - Secrets or sensitive data exposure

6. **Maintainability**
   - Documentation quality
   - Code complexity
   - Technical debt introduced
   - Future extensibility

7. **Specific Suggestions**
   - Concrete code improvements
   - Alternative approaches
   - Refactoring opportunities

Please be thorough but constructive. Highlight both concerns and things done well.

---

";

const CLOSING_INSTRUCTION: &str = "Please provide your comprehensive code review.";

/// Assemble the review prompt.
///
/// Output is a pure function of the inputs. The changed-files and diff
/// sections are always present; commit messages and additional context
/// appear only when non-empty. Nothing is truncated.
pub fn build_review_prompt(changes: &ChangeSet, extra_context: &str) -> String {
    let mut prompt = String::with_capacity(
        REVIEW_RUBRIC.len()
            + changes.diff.len()
            + changes.changed_files.len()
            + changes.commit_log.len()
            + extra_context.len()
            + 256,
    );

    prompt.push_str(REVIEW_RUBRIC);

    prompt.push_str("## Changed Files\n```\n");
    prompt.push_str(&changes.changed_files);
    prompt.push_str("\n```\n\n");

    if !changes.commit_log.is_empty() {
        prompt.push_str("## Recent Commit Messages\n```\n");
        prompt.push_str(&changes.commit_log);
        prompt.push_str("\n```\n\n");
    }

    prompt.push_str("## Full Diff\n```diff\n");
    prompt.push_str(&changes.diff);
    prompt.push_str("\n```\n");

    if !extra_context.is_empty() {
        prompt.push_str("\n## Additional Context\n");
        prompt.push_str(extra_context);
        prompt.push('\n');
    }

    prompt.push_str("\n\n");
    prompt.push_str(CLOSING_INSTRUCTION);

    debug!(bytes = prompt.len(), "built review prompt");
    prompt
}

/// Concatenate the given files, each under a header naming its path.
///
/// Unreadable files are skipped with a warning. Invalid UTF-8 is replaced
/// with U+FFFD rather than dropping the file.
pub fn load_context_files<P: AsRef<Path>>(paths: &[P]) -> String {
    let mut context = String::new();

    for path in paths {
        let path = path.as_ref();
        match fs::read(path) {
            Ok(bytes) => {
                context.push_str(&format!(
                    "\n\n--- Context from {} ---\n{}\n",
                    path.display(),
                    String::from_utf8_lossy(&bytes)
                ));
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "could not read context file, skipping"
                );
            }
        }
    }

    context
}
