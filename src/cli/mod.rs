use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_OUTPUT: &str = "REQUESTED_CHANGES.md";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pr-review",
    version,
    about = "AI-assisted code review of the current branch's changes"
)]
pub struct Cli {
    /// Target branch to compare against (default: origin/HEAD, then main, then master).
    #[arg(long)]
    pub branch: Option<String>,

    /// Base branch or commit to compare from. Takes precedence over --branch.
    #[arg(long)]
    pub base: Option<String>,

    /// Model to use for the review.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Disable extended thinking mode.
    #[arg(long = "no-ultrathink")]
    pub no_ultrathink: bool,

    /// Extended thinking token budget.
    #[arg(long, default_value_t = 10_000)]
    pub thinking_budget: u32,

    /// Maximum number of output tokens.
    #[arg(long, default_value_t = 16_000)]
    pub max_tokens: u32,

    /// Comma-separated list of additional context files to include.
    #[arg(long, default_value = "")]
    pub context: String,

    /// File to save the review to. An existing file is kept as a numbered backup (FILE.~N~).
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Base URL of the Messages API.
    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
