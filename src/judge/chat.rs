//! Chat-completion judge over HTTP
//!
//! Requires the `ai` feature to be enabled:
//! ```toml
//! gauge = { version = "0.4", features = ["ai"] }
//! ```

use super::{parse_judge_score, JudgeError, JudgeRequest, QualityJudge};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable checked first for every provider
pub const API_KEY_ENV: &str = "GAUGE_API_KEY";

/// Default request timeout for one judge call
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Which chat API the judge talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum JudgeProvider {
    /// Hugging Face router (OpenAI-compatible chat completions)
    #[default]
    HuggingFace,
    /// Azure OpenAI deployment (endpoint must be the full deployment URL)
    AzureOpenai,
    /// Anthropic messages API
    Anthropic,
}

impl JudgeProvider {
    pub fn default_endpoint(self) -> &'static str {
        match self {
            JudgeProvider::HuggingFace => "https://router.huggingface.co/v1/chat/completions",
            JudgeProvider::AzureOpenai => "",
            JudgeProvider::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            JudgeProvider::HuggingFace => "meta-llama/Llama-3.1-8B-Instruct",
            JudgeProvider::AzureOpenai => "gpt-4o-mini",
            JudgeProvider::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    /// Conventional API key variable for the provider
    pub fn key_env(self) -> &'static str {
        match self {
            JudgeProvider::HuggingFace => "HF_TOKEN",
            JudgeProvider::AzureOpenai => "AZURE_OPENAI_API_KEY",
            JudgeProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::fmt::Display for JudgeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JudgeProvider::HuggingFace => write!(f, "hugging-face"),
            JudgeProvider::AzureOpenai => write!(f, "azure-openai"),
            JudgeProvider::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Chat API client acting as a [`QualityJudge`]
#[cfg_attr(not(feature = "ai"), allow(dead_code))]
pub struct ChatJudge {
    provider: JudgeProvider,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl ChatJudge {
    /// Create a judge reading the API key from `GAUGE_API_KEY` or the provider's variable
    pub fn from_env(provider: JudgeProvider) -> Result<Self, JudgeError> {
        let api_key = std::env::var(API_KEY_ENV)
            .or_else(|_| std::env::var(provider.key_env()))
            .map_err(|_| {
                JudgeError::NoApiKey(format!("{} or {}", API_KEY_ENV, provider.key_env()))
            })?;
        Ok(Self::with_key(provider, api_key))
    }

    /// Create a judge with a specific API key
    pub fn with_key(provider: JudgeProvider, api_key: String) -> Self {
        Self {
            provider,
            api_key,
            model: provider.default_model().to_string(),
            endpoint: provider.default_endpoint().to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the model to use
    pub fn model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Override the endpoint URL
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> JudgeProvider {
        self.provider
    }

    /// Send the rendered request and return the raw reply text
    #[cfg(feature = "ai")]
    pub fn send_request(&self, prompt: &str) -> Result<String, JudgeError> {
        use serde_json::json;

        if self.endpoint.is_empty() {
            return Err(JudgeError::Unavailable(format!(
                "no endpoint configured for {}",
                self.provider
            )));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| JudgeError::RequestFailed(e.to_string()))?;

        let request = match self.provider {
            JudgeProvider::HuggingFace => client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "model": self.model,
                    "max_tokens": 512,
                    "temperature": 0.1,
                    "messages": [{ "role": "user", "content": prompt }]
                })),
            JudgeProvider::AzureOpenai => client
                .post(&self.endpoint)
                .header("api-key", &self.api_key)
                .json(&json!({
                    "max_tokens": 512,
                    "temperature": 0.1,
                    "messages": [{ "role": "user", "content": prompt }]
                })),
            JudgeProvider::Anthropic => client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&json!({
                    "model": self.model,
                    "max_tokens": 512,
                    "messages": [{ "role": "user", "content": prompt }]
                })),
        };

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                JudgeError::Timeout
            } else {
                JudgeError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(JudgeError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(JudgeError::ApiError(format!("{}: {}", status, error_text)));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| JudgeError::InvalidResponse(e.to_string()))?;

        extract_reply(self.provider, &json)
            .map(str::to_string)
            .ok_or_else(|| JudgeError::InvalidResponse("No content in response".to_string()))
    }

    /// Stub implementation when ai feature is disabled
    #[cfg(not(feature = "ai"))]
    pub fn send_request(&self, _prompt: &str) -> Result<String, JudgeError> {
        Err(JudgeError::Unavailable(
            "AI feature not enabled. Rebuild with: cargo build --features ai".to_string(),
        ))
    }
}

/// Pull the reply text out of a provider response body
#[cfg_attr(not(feature = "ai"), allow(dead_code))]
fn extract_reply(provider: JudgeProvider, json: &serde_json::Value) -> Option<&str> {
    match provider {
        JudgeProvider::HuggingFace | JudgeProvider::AzureOpenai => {
            json["choices"][0]["message"]["content"].as_str()
        }
        JudgeProvider::Anthropic => json["content"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|item| item["text"].as_str()),
    }
}

impl QualityJudge for ChatJudge {
    fn judge(&self, request: &JudgeRequest) -> Result<Option<f64>, JudgeError> {
        let reply = self.send_request(&request.render())?;
        let score = parse_judge_score(&reply);
        if score.is_none() {
            tracing::debug!(provider = %self.provider, "judge reply had no NN/100 grade");
        }
        Ok(score)
    }
}

/// Check if the AI feature is available
pub fn is_ai_available() -> bool {
    cfg!(feature = "ai")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let judge = ChatJudge::with_key(JudgeProvider::Anthropic, "k".to_string())
            .model("claude-test")
            .endpoint("http://localhost:1/v1/messages")
            .timeout(Duration::from_secs(3));
        assert_eq!(judge.model, "claude-test");
        assert_eq!(judge.endpoint, "http://localhost:1/v1/messages");
        assert_eq!(judge.timeout, Duration::from_secs(3));
        assert_eq!(judge.provider(), JudgeProvider::Anthropic);
    }

    #[test]
    fn test_extract_reply_shapes() {
        let openai = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Good. 80/100" } }]
        });
        let anthropic = serde_json::json!({ "content": [{ "type": "text", "text": "61/100" }] });
        assert_eq!(
            extract_reply(JudgeProvider::HuggingFace, &openai),
            Some("Good. 80/100")
        );
        assert_eq!(
            extract_reply(JudgeProvider::AzureOpenai, &openai),
            Some("Good. 80/100")
        );
        assert_eq!(extract_reply(JudgeProvider::Anthropic, &anthropic), Some("61/100"));
        assert_eq!(extract_reply(JudgeProvider::Anthropic, &openai), None);
    }

    #[test]
    fn test_provider_deserializes_kebab_case() {
        let p: JudgeProvider = serde_json::from_str(r#""azure-openai""#).unwrap();
        assert_eq!(p, JudgeProvider::AzureOpenai);
        assert_eq!(p.to_string(), "azure-openai");
    }

    #[cfg(not(feature = "ai"))]
    #[test]
    fn test_judge_unavailable_without_feature() {
        let judge = ChatJudge::with_key(JudgeProvider::HuggingFace, "k".to_string());
        assert!(matches!(
            judge.judge(&super::super::JudgeRequest::prompt("x")),
            Err(JudgeError::Unavailable(_))
        ));
    }
}
