use crate::cli::Cli;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// The API rejects thinking budgets below this.
pub const MIN_THINKING_BUDGET: u32 = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ANTHROPIC_API_KEY environment variable not set")]
    MissingApiKey,
    #[error(
        "invalid thinking budget {budget}: must be at least 1024 and below max tokens ({max_tokens})"
    )]
    InvalidThinkingBudget { budget: u32, max_tokens: u32 },
    #[error("max tokens must be greater than zero")]
    ZeroMaxTokens,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for the single review request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOptions {
    pub model: String,
    pub max_tokens: u32,
    /// `Some(budget)` when extended thinking is enabled.
    pub thinking_budget: Option<u32>,
}

/// Fully resolved run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub timeout: Duration,
    pub review: ReviewOptions,
    /// `--branch`. `None` means detect the default branch.
    pub target_branch: Option<String>,
    /// `--base`, when the diff should start somewhere other than the target branch.
    pub base_ref: Option<String>,
    pub context_files: Vec<PathBuf>,
    pub output: PathBuf,
}

impl Config {
    /// Resolve the CLI arguments and environment into a validated config.
    ///
    /// `env` looks up environment variables so callers can substitute a fake.
    pub fn resolve<F>(cli: &Cli, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = env(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        if cli.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }

        let thinking_budget = if cli.no_ultrathink {
            None
        } else {
            if cli.thinking_budget < MIN_THINKING_BUDGET || cli.thinking_budget >= cli.max_tokens {
                return Err(ConfigError::InvalidThinkingBudget {
                    budget: cli.thinking_budget,
                    max_tokens: cli.max_tokens,
                });
            }
            Some(cli.thinking_budget)
        };

        Ok(Self {
            api_key,
            api_url: cli.api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(cli.timeout),
            review: ReviewOptions {
                model: cli.model.clone(),
                max_tokens: cli.max_tokens,
                thinking_budget,
            },
            target_branch: cli.branch.clone(),
            base_ref: cli.base.clone(),
            context_files: parse_context_list(&cli.context),
            output: cli.output.clone(),
        })
    }

    /// Ref the collector diffs against: `--base` if given, else `target`.
    pub fn diff_base<'a>(&'a self, target: &'a str) -> &'a str {
        self.base_ref.as_deref().unwrap_or(target)
    }
}

/// Split a comma-separated list of paths, dropping blank entries.
pub fn parse_context_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}
