//! Minimal blocking client for the Anthropic Messages API.
//!
//! One request per call and no retries. Any non-2xx status is an error
//! carrying the raw response body.

use crate::config::ReviewOptions;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const API_VERSION: &str = "2023-06-01";
pub const MESSAGES_PATH: &str = "/v1/messages";
pub const USER_AGENT: &str = concat!("pr-review/", env!("CARGO_PKG_VERSION"));

/// Extended thinking requires a temperature of exactly 1.
const TEMPERATURE: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client")]
    Build(#[source] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("error making request")]
    Transport(#[source] reqwest::Error),
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("error decoding response")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReviewRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
}

impl ReviewRequest {
    /// A request holding `prompt` as its single user message.
    pub fn new(options: &ReviewOptions, prompt: &str) -> Self {
        Self {
            model: options.model.clone(),
            max_tokens: options.max_tokens,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            thinking: options.thinking_budget.map(|budget_tokens| ThinkingConfig {
                kind: "enabled".to_string(),
                budget_tokens,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ThinkingConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub budget_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Usage,
}

impl ReviewResponse {
    /// Concatenated text of every `text` block, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// The rendered review and what it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: String,
    pub text: String,
    pub usage: Usage,
}

pub struct ReviewClient {
    http: Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl ReviewClient {
    /// Build a client for the API rooted at `base_url`.
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), MESSAGES_PATH),
            timeout,
        })
    }

    /// Send one review request and return the text of the answer.
    pub fn review(&self, options: &ReviewOptions, prompt: &str) -> Result<Review> {
        let request = ReviewRequest::new(options, prompt);
        debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            prompt_bytes = prompt.len(),
            thinking = request.thinking.is_some(),
            "sending review request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        let body = response.text().map_err(|err| self.classify(err))?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ReviewResponse = serde_json::from_str(&body)?;
        info!(
            id = %parsed.id,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "review received"
        );

        Ok(Review {
            text: parsed.text(),
            id: parsed.id,
            usage: parsed.usage,
        })
    }

    fn classify(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Transport(err)
        }
    }
}
