//! HTTP client for an OpenAI-compatible chat completions endpoint.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{Oracle, OracleError, OracleFuture};
use crate::prompt::OraclePrompt;
use crate::{APP_TITLE, DEFAULT_MODEL, DEFAULT_TEMPERATURE, Message, OPENROUTER_URL};

/// Transport-level timeout; expiry surfaces as [`OracleError::Transport`].
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Endpoint and sampling settings for [`OpenRouterOracle`].
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    /// Chat completions URL. Default: OpenRouter.
    pub endpoint: String,
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// Sampling temperature. Default: `0.7`.
    pub temperature: f32,
    /// Optional cap on completion tokens.
    pub max_tokens: Option<u32>,
    /// `HTTP-Referer` header value.
    pub referer: String,
    /// Application title, sent percent-encoded in `X-Title`.
    pub title: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: OPENROUTER_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            referer: "https://github.com/haigui-rs/haigui".to_string(),
            title: APP_TITLE.to_string(),
        }
    }
}

// ── Wire types ─────────────────────────────────────────────────────

/// Chat completion request body.
#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Pull the first completion's text out of a response body.
fn extract_reply(body: &str) -> Result<String, OracleError> {
    let parsed: RawChatResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::Malformed(format!("failed to parse response: {e}")))?;

    if let Some(err) = parsed.error {
        return Err(OracleError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message.content)
        .ok_or_else(|| OracleError::Malformed("no completion text in response".to_string()))
}

/// `encodeURIComponent`: keep unreserved ASCII, percent-encode every other byte.
fn encode_header_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ── Client ─────────────────────────────────────────────────────────

/// Async oracle backed by an OpenRouter-style chat completions API.
pub struct OpenRouterOracle {
    client: reqwest::Client,
    api_key: String,
    config: OracleConfig,
}

impl OpenRouterOracle {
    /// Create a client with the given bearer credential and settings.
    pub fn new(api_key: impl Into<String>, config: OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .user_agent("haigui/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OracleError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    async fn exchange(&self, prompt: &OraclePrompt) -> Result<String, OracleError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: prompt.messages(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        debug!(
            "Oracle request: kind={:?}, model={}, messages={}, temp={}",
            prompt.kind,
            body.model,
            body.messages.len(),
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(&body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", encode_header_value(&self.config.title))
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| OracleError::Transport(format!("failed to read response: {e}")))?;

        debug!(
            "Oracle response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(OracleError::Status {
                code: status.as_u16(),
                body: text,
            });
        }

        let reply = extract_reply(&text)?;
        debug!("Oracle output: {} chars", reply.chars().count());
        Ok(reply)
    }
}

impl Oracle for OpenRouterOracle {
    fn send<'a>(&'a self, prompt: &'a OraclePrompt) -> OracleFuture<'a> {
        Box::pin(self.exchange(prompt))
    }
}
