use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM provider is not configured")]
    NotConfigured,
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("LLM response had no message content")]
    EmptyResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub json_mode: bool,
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            json_mode: true,
            max_tokens: None,
        }
    }
}

impl CompletionOptions {
    pub fn json(temperature: f32) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;

    fn model(&self) -> &str;
}

pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";

    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_body(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": options.temperature,
        });
        if options.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured);
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages, options))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: Value = response.json().await?;
        if let Some(usage) = result.get("usage") {
            log::debug!(
                "LLM usage: prompt={} completion={}",
                usage["prompt_tokens"],
                usage["completion_tokens"]
            );
        }

        result["choices"][0]["message"]["content"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Extract JSON from response (handles code blocks and plain JSON)
pub fn extract_json(response: &str) -> String {
    let response = response.trim();

    if let Some(start) = response.find("```") {
        if let Some(json_start) = response[start..].find('{') {
            let json_part = &response[start + json_start..];
            if let Some(end) = json_part.find("```") {
                return json_part[..end].trim().to_string();
            }
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end > start {
                return response[start..=end].to_string();
            }
        }
    }

    response.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_code_fence() {
        let raw = "Here you go:\n```json\n{\"a\": 1}\n```\nthanks";
        assert_eq!(extract_json(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_from_prose() {
        assert_eq!(extract_json("result: {\"ok\": true} done"), "{\"ok\": true}");
        assert_eq!(extract_json("no json here"), "no json here");
    }

    #[test]
    fn test_request_body_json_mode() {
        let client = OpenAIClient::new("k".into(), None);
        let body = client.request_body(&[ChatMessage::user("hi")], &CompletionOptions::json(0.2));
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(body.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn test_generate_returns_message_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"{\"score\": 70}"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = OpenAIClient::new("test-key".into(), Some(server.url()));
        let content = client
            .generate(&[ChatMessage::user("score it")], &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(content, "{\"score\": 70}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = OpenAIClient::new("test-key".into(), Some(server.url()));
        let err = client
            .generate(&[ChatMessage::user("x")], &CompletionOptions::default())
            .await
            .unwrap_err();

        match err {
            LlmError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_without_key_is_not_configured() {
        let client = OpenAIClient::new(String::new(), None);
        let err = client
            .generate(&[ChatMessage::user("x")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }
}
