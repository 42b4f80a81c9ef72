use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

// ── Conversation message types ────────────────────────────────────────────────

/// Every agent call is a two-message exchange, so assistant turns never
/// appear in requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ── Model configuration ───────────────────────────────────────────────────────

/// Resolved once at startup and passed by value to whoever needs it.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Near-deterministic sampling; the pipeline wants reproducible answers.
const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 4096;

// ── OpenAI-compatible wire types ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Deserialize)]
struct ApiChoiceMessage {
    content: Option<String>,
}

// ── HTTP client builder ───────────────────────────────────────────────────────

pub fn build_http_client() -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if let Ok(proxy_url) = std::env::var("HTTP_PROXY") {
        builder = builder.proxy(reqwest::Proxy::all(&proxy_url)?);
    }

    if let Ok(ms) = std::env::var("API_TIMEOUT_MS") {
        if let Ok(ms) = ms.parse::<u64>() {
            builder = builder
                .timeout(std::time::Duration::from_millis(ms))
                .connect_timeout(std::time::Duration::from_secs(10));
        }
    }

    builder.build().map_err(Into::into)
}

// ── LLM call ─────────────────────────────────────────────────────────────────

/// Send one two-message exchange to the model and return its raw reply text.
pub async fn chat(
    client: &reqwest::Client,
    config: &ModelConfig,
    messages: &[Message],
) -> Result<String> {
    let body = build_request(config, messages);

    let resp = client
        .post(format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        ))
        .header("Authorization", format!("Bearer {}", config.api_key))
        .json(&body)
        .send()
        .await
        .context("HTTP request failed")?;

    parse_response(resp).await
}

fn build_request(config: &ModelConfig, messages: &[Message]) -> ApiRequest {
    let api_messages: Vec<ApiMessage> = messages
        .iter()
        .map(|m| ApiMessage {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
            },
            content: m.content.clone(),
        })
        .collect();

    ApiRequest {
        model: config.model.clone(),
        messages: api_messages,
        temperature: TEMPERATURE,
        max_tokens: Some(MAX_TOKENS),
    }
}

async fn parse_response(resp: reqwest::Response) -> Result<String> {
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(anyhow!("API error {status}: {text}"));
    }
    let parsed: ApiResponse = resp.json().await.context("failed to parse API response")?;
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    if text.is_empty() {
        return Err(anyhow!("API returned empty content"));
    }
    Ok(text)
}
