use anyhow::{Context, Result};
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

use pr_review::cli::{self, Cli};
use pr_review::client::ReviewClient;
use pr_review::config::Config;
use pr_review::git::{self, GitCli};
use pr_review::output::publish_review;
use pr_review::prompt::{build_review_prompt, load_context_files};

fn main() -> Result<()> {
    let args = cli::parse_args();
    init_tracing(&args);

    let config = Config::resolve(&args, |name| std::env::var(name).ok())?;
    run(&config)
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(args: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "pr_review=debug,warn" } else { "warn" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

/// Collect changes, ask for a review, then print and save it.
fn run(config: &Config) -> Result<()> {
    let target = match &config.target_branch {
        Some(branch) => branch.clone(),
        None => git::detect_default_branch().context("Failed to detect default branch")?,
    };
    let base = config.diff_base(&target);

    let current = git::current_branch()
        .ok()
        .flatten()
        .unwrap_or_else(|| "unknown".to_string());
    println!("🔍 Reviewing changes on '{}' against '{}'\n", current, target);

    let changes = git::collect_changes(&GitCli, base, "HEAD").context("Error getting diff")?;
    if changes.is_empty() {
        println!("No changes found.");
        return Ok(());
    }

    let extra_context = load_context_files(&config.context_files);
    let prompt = build_review_prompt(&changes, &extra_context);

    let thinking = if config.review.thinking_budget.is_some() {
        "enabled"
    } else {
        "disabled"
    };
    println!("🤖 Analyzing PR with Claude (ultrathink mode: {})...", thinking);
    println!("⏳ This may take a moment for deep analysis...\n");

    let client = ReviewClient::new(&config.api_key, &config.api_url, config.timeout)
        .context("Failed to create API client")?;
    let review = client
        .review(&config.review, &prompt)
        .context("Error calling Claude API")?;

    publish_review(
        &mut io::stdout().lock(),
        &config.output,
        &review.text,
        &review.usage,
    )
    .with_context(|| format!("Failed to save review to {}", config.output.display()))?;

    Ok(())
}
