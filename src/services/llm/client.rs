//! Language-model gateway
//!
//! The engine only sees the `LanguageModelGateway` trait. `HttpGateway` is the
//! reqwest-backed implementation; it picks the provider from the model id
//! prefix and speaks that provider's JSON format.

use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifyOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_output_tokens: 16,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub usage: Option<Usage>,
}

/// Sends one prompt to one model and returns the raw text answer.
///
/// Failures come back as `GatewayError`; implementations must not panic on
/// provider errors.
#[async_trait]
pub trait LanguageModelGateway: Send + Sync {
    async fn classify(
        &self,
        prompt: &str,
        model_id: &str,
        credential: &str,
        options: &ClassifyOptions,
    ) -> Result<Completion, GatewayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Anthropic,
    Gemini,
    DeepSeek,
}

impl Provider {
    pub fn from_model(model_id: &str) -> Option<Self> {
        let id = model_id.trim().to_ascii_lowercase();
        if id.starts_with("gpt-") {
            Some(Provider::OpenAI)
        } else if id.starts_with("claude") {
            Some(Provider::Anthropic)
        } else if id.starts_with("gemini-") {
            Some(Provider::Gemini)
        } else if id.starts_with("deepseek") {
            Some(Provider::DeepSeek)
        } else {
            None
        }
    }

    /// Environment variable conventionally holding this provider's key.
    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

/// Provider base URLs. Overridable so tests and proxies can redirect traffic.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub openai: String,
    pub anthropic: String,
    pub gemini: String,
    pub deepseek: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openai: "https://api.openai.com/v1/chat/completions".into(),
            anthropic: "https://api.anthropic.com/v1/messages".into(),
            gemini: "https://generativelanguage.googleapis.com/v1beta/models".into(),
            deepseek: "https://api.deepseek.com/v1/chat/completions".into(),
        }
    }
}

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    endpoints: Endpoints,
}

impl HttpGateway {
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            // Network-level ceiling; the resolver applies its own, tighter one.
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            endpoints,
        }
    }

    async fn call_chat_completions(
        &self,
        url: &str,
        prompt: &str,
        model_id: &str,
        credential: &str,
        options: &ClassifyOptions,
    ) -> Result<Completion, GatewayError> {
        let request = ChatRequest {
            model: model_id.to_string(),
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(credential)
            .json(&request)
            .send()
            .await?;
        let body = check_status(response).await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        parsed.into_completion(model_id)
    }

    async fn call_anthropic(
        &self,
        prompt: &str,
        model_id: &str,
        credential: &str,
        options: &ClassifyOptions,
    ) -> Result<Completion, GatewayError> {
        let request = AnthropicRequest {
            model: model_id.to_string(),
            max_tokens: options.max_output_tokens,
            temperature: options.temperature,
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
        };

        let response = self
            .client
            .post(&self.endpoints.anthropic)
            .header("x-api-key", credential)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;
        let body = check_status(response).await?;
        let parsed: AnthropicResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        parsed.into_completion(model_id)
    }

    async fn call_gemini(
        &self,
        prompt: &str,
        model_id: &str,
        credential: &str,
        options: &ClassifyOptions,
    ) -> Result<Completion, GatewayError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt.into() }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
            },
        };

        let url = format!("{}/{}:generateContent", self.endpoints.gemini, model_id);
        let response = self
            .client
            .post(url)
            .query(&[("key", credential)])
            .json(&request)
            .send()
            .await?;
        let body = check_status(response).await?;
        let parsed: GeminiResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        parsed.into_completion(model_id)
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModelGateway for HttpGateway {
    async fn classify(
        &self,
        prompt: &str,
        model_id: &str,
        credential: &str,
        options: &ClassifyOptions,
    ) -> Result<Completion, GatewayError> {
        let provider = Provider::from_model(model_id)
            .ok_or_else(|| GatewayError::UnsupportedModel(model_id.to_string()))?;
        debug!(?provider, model_id, "gateway call");

        match provider {
            Provider::OpenAI => {
                self.call_chat_completions(&self.endpoints.openai, prompt, model_id, credential, options)
                    .await
            }
            Provider::DeepSeek => {
                self.call_chat_completions(&self.endpoints.deepseek, prompt, model_id, credential, options)
                    .await
            }
            Provider::Anthropic => self.call_anthropic(prompt, model_id, credential, options).await,
            Provider::Gemini => self.call_gemini(prompt, model_id, credential, options).await,
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<String, GatewayError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

// OpenAI-compatible format (OpenAI, DeepSeek)
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl ChatResponse {
    fn into_completion(self, requested_model: &str) -> Result<Completion, GatewayError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::Malformed("no choices in response".into()))?;
        Ok(Completion {
            content,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            usage: self.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

// Anthropic format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    model: Option<String>,
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

impl AnthropicResponse {
    fn into_completion(self, requested_model: &str) -> Result<Completion, GatewayError> {
        let content = self
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| GatewayError::Malformed("no text block in response".into()))?;
        Ok(Completion {
            content,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            usage: self.usage.map(|u| Usage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: match (u.input_tokens, u.output_tokens) {
                    (Some(i), Some(o)) => Some(i + o),
                    _ => None,
                },
            }),
        })
    }
}

// Gemini format
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

impl GeminiResponse {
    // Gemini does not report token usage in a comparable shape.
    fn into_completion(self, requested_model: &str) -> Result<Completion, GatewayError> {
        let content = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| GatewayError::Malformed("no candidates in response".into()))?;
        Ok(Completion {
            content,
            model: requested_model.to_string(),
            usage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_model_prefix() {
        assert_eq!(Provider::from_model("gpt-4o"), Some(Provider::OpenAI));
        assert_eq!(Provider::from_model("claude-3-haiku-20240307"), Some(Provider::Anthropic));
        assert_eq!(Provider::from_model("gemini-1.5-pro"), Some(Provider::Gemini));
        assert_eq!(Provider::from_model("deepseek-chat"), Some(Provider::DeepSeek));
        assert_eq!(Provider::from_model("llama-3"), None);
    }

    #[tokio::test]
    async fn test_unsupported_model_fails_before_network() {
        let gateway = HttpGateway::new();
        let err = gateway
            .classify("prompt", "llama-3", "key", &ClassifyOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedModel(_)));
    }

    #[test]
    fn test_chat_response_parsing() {
        let body = r#"{
            "model": "gpt-4o-2024-08-06",
            "choices": [{"message": {"role": "assistant", "content": "generate_test"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 3, "total_tokens": 123}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let completion = parsed.into_completion("gpt-4o").unwrap();
        assert_eq!(completion.content, "generate_test");
        assert_eq!(completion.model, "gpt-4o-2024-08-06");
        assert_eq!(completion.usage.unwrap().total_tokens, Some(123));
    }

    #[test]
    fn test_chat_response_without_choices_is_malformed() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(parsed.into_completion("gpt-4o"), Err(GatewayError::Malformed(_))));
    }

    #[test]
    fn test_anthropic_response_parsing() {
        let body = r#"{
            "model": "claude-3-haiku-20240307",
            "content": [{"type": "text", "text": "flashcards"}],
            "usage": {"input_tokens": 100, "output_tokens": 2}
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        let completion = parsed.into_completion("claude-3-haiku-20240307").unwrap();
        assert_eq!(completion.content, "flashcards");
        assert_eq!(completion.usage.unwrap().total_tokens, Some(102));
    }

    #[test]
    fn test_gemini_response_parsing() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "lesson_plan"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        let completion = parsed.into_completion("gemini-1.5-pro").unwrap();
        assert_eq!(completion.content, "lesson_plan");
        assert!(completion.usage.is_none());
    }

    #[test]
    fn test_gemini_request_uses_camel_case_config() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: "hi".into() }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: 16,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 16);
    }
}
