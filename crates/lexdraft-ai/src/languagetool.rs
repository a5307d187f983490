//! LanguageTool HTTP grammar checker.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::score::{GrammarChecker, GrammarError};

/// Public LanguageTool endpoint; rate-limited, so self-hosting is preferred
/// for batch scoring.
pub const DEFAULT_LANGUAGETOOL_URL: &str = "https://api.languagetool.org";

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<serde_json::Value>,
}

/// Counts issues via a LanguageTool server's `POST /v2/check`.
pub struct LanguageToolChecker {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl LanguageToolChecker {
    /// `base_url` should be like `http://localhost:8081` (no trailing slash).
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            language: "en-US".into(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

fn count_matches(body: &str) -> Result<usize, GrammarError> {
    let response: CheckResponse = serde_json::from_str(body)?;
    Ok(response.matches.len())
}

#[async_trait]
impl GrammarChecker for LanguageToolChecker {
    async fn check(&self, text: &str) -> Result<usize, GrammarError> {
        let url = format!("{}/v2/check", self.base_url);
        debug!(url = %url, chars = text.len(), "checking grammar");
        let resp = self
            .client
            .post(&url)
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GrammarError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let issues = count_matches(&body)?;
        info!(issues, "grammar check complete");
        Ok(issues)
    }
}
