//! Text generation seam and an OpenAI-compatible chat-completions client.
//!
//! The same client talks to OpenAI, OpenRouter (any `/v1/chat/completions`
//! endpoint with bearer auth) and Azure OpenAI deployments.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("generator returned no content")]
    EmptyResponse,
    #[error("generator misconfigured: {0}")]
    Config(String),
}

/// A prompt → text function backed by a language model.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Which wire dialect the chat endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// `POST {base}/v1/chat/completions` with a bearer token (OpenAI, OpenRouter).
    #[default]
    OpenAi,
    /// `POST {base}/openai/deployments/{deployment}/chat/completions?api-version=…`
    /// with an `api-key` header.
    Azure,
}

impl FromStr for Provider {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "openrouter" => Ok(Self::OpenAi),
            "azure" => Ok(Self::Azure),
            other => Err(GenerationError::Config(format!(
                "unknown provider '{other}' (expected openai or azure)"
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
        })
    }
}

/// Connection and sampling settings for [`ChatGenerator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub provider: Provider,
    /// API root without the `/v1` path, e.g. `https://api.openai.com`,
    /// `https://openrouter.ai/api` or an Azure resource endpoint.
    pub base_url: String,
    /// Azure deployment name; ignored for [`Provider::OpenAi`].
    pub deployment: Option<String>,
    /// Azure `api-version` query value.
    pub api_version: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            base_url: "https://api.openai.com".into(),
            deployment: None,
            api_version: "2025-01-01-preview".into(),
            model: "gpt-4o-mini".into(),
            api_key: String::new(),
            temperature: 0.3,
            timeout_secs: 120,
        }
    }
}

impl GeneratorConfig {
    /// The chat-completions URL for this provider.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.provider {
            Provider::OpenAi => format!("{base}/v1/chat/completions"),
            Provider::Azure => {
                let deployment = self
                    .deployment
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .unwrap_or(self.model.as_str());
                format!(
                    "{base}/openai/deployments/{deployment}/chat/completions?api-version={}",
                    self.api_version
                )
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn request_body<'a>(config: &'a GeneratorConfig, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        // Azure routes by deployment, not by model name.
        model: match config.provider {
            Provider::OpenAi => Some(config.model.as_str()),
            Provider::Azure => None,
        },
        messages: [ChatMessage {
            role: "user",
            content: prompt,
        }],
        temperature: config.temperature,
    }
}

/// Extract the first choice's message text from a chat-completions body.
fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

/// HTTP client for chat-completions endpoints.
#[cfg(feature = "http")]
pub struct ChatGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
    url: String,
}

#[cfg(feature = "http")]
impl ChatGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerationError> {
        if config.api_key.is_empty() {
            return Err(GenerationError::Config("API key is empty".into()));
        }
        let url = config.endpoint();
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            url,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Generator for ChatGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = request_body(&self.config, prompt);
        let request = self.client.post(&self.url).json(&body);
        let request = match self.config.provider {
            Provider::OpenAi => request.bearer_auth(&self.config.api_key),
            Provider::Azure => request.header("api-key", &self.config.api_key),
        };

        tracing::debug!(url = %self.url, prompt_chars = prompt.len(), "calling chat completions");
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(GenerationError::Server {
                status: status.as_u16(),
                body: text,
            });
        }

        let content = parse_completion(&text)?;
        tracing::info!(
            provider = %self.config.provider,
            model = %self.config.model,
            chars = content.len(),
            "generation complete"
        );
        Ok(content)
    }
}
