//! OpenAI-compatible HTTP client for chat completions.
//!
//! The client speaks the `/v1/chat/completions` and `/v1/models` endpoints of
//! any OpenAI-compatible server. It implements [`CompletionBackend`], the seam
//! the analysis engine and the suggestion generator are written against, so
//! tests can substitute a canned backend.

use crate::constants::{COMPLETION_TEMPERATURE, HTTP_TIMEOUT_SECS, REDACTED_PLACEHOLDER};
use crate::errors::{AIError, AppResult};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Produces a completion for a single-turn prompt.
pub trait CompletionBackend: Send + Sync {
    /// Sends `prompt` as a user message and returns the model's text reply.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AI` if the endpoint is unreachable, answers with a
    /// non-success status, or returns an envelope without content.
    fn complete(&self, prompt: &str, max_tokens: u32) -> AppResult<String>;
}

/// A message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender (system, user, assistant)
    pub role: String,
    /// The content of the message
    pub content: String,
}

impl ChatMessage {
    /// Creates a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for chat completion.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

/// Response from chat completion.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible API.
///
/// A fresh blocking HTTP client is built for each request, which keeps the
/// client usable from a `spawn_blocking` worker inside a tokio runtime.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &REDACTED_PLACEHOLDER)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the API (e.g., "https://api.openai.com")
    /// * `api_key` - Bearer credential
    /// * `model` - Chat model name (e.g., "gpt-4o")
    ///
    /// # Examples
    ///
    /// ```
    /// use daybook::ai::OpenAiClient;
    ///
    /// let client = OpenAiClient::new("https://api.openai.com/", "sk-test", "gpt-4o");
    /// assert_eq!(client.base_url(), "https://api.openai.com");
    /// assert!(!format!("{:?}", client).contains("sk-test"));
    /// ```
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn http(&self) -> AppResult<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AIError::Unreachable(e).into())
    }

    /// Checks the credential against `GET /v1/models`.
    ///
    /// Returns `Ok(true)` for a success status and `Ok(false)` for any other
    /// status.
    ///
    /// # Errors
    ///
    /// Returns `AIError::Unreachable` if the request could not be sent.
    pub fn validate_key(&self) -> AppResult<bool> {
        let url = format!("{}/v1/models", self.base_url);
        debug!("Validating API key against {}", url);

        let response = self
            .http()?
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(AIError::Unreachable)?;

        let valid = response.status().is_success();
        debug!("Key validation returned HTTP {}", response.status());
        Ok(valid)
    }

    /// Sends a chat completion request.
    ///
    /// # Arguments
    ///
    /// * `messages` - Conversation messages
    /// * `max_tokens` - Completion token budget
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The API is not reachable
    /// - The API returns a non-success status
    /// - The response has no `choices[0].message.content`
    pub fn chat(&self, messages: &[ChatMessage], max_tokens: u32) -> AppResult<String> {
        debug!("Sending chat request with model: {}", self.model);

        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature: COMPLETION_TEMPERATURE,
        };

        let response = self
            .http()?
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(AIError::Unreachable)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(AIError::HttpStatus { status, body }.into());
        }

        let chat_response: ChatResponse = response.json().map_err(|e| {
            AIError::InvalidResponse(format!("Failed to parse chat response: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AIError::InvalidResponse("Response has no choices".to_string()))?;

        debug!("Received chat response ({} chars)", content.len());
        Ok(content)
    }
}

impl CompletionBackend for OpenAiClient {
    fn complete(&self, prompt: &str, max_tokens: u32) -> AppResult<String> {
        self.chat(&[ChatMessage::user(prompt)], max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
        .to_string()
    }

    #[test]
    fn test_user_message() {
        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "Hello");
    }

    #[test]
    fn test_chat_sends_expected_request() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 500,
                "messages": [{ "role": "user", "content": "hi" }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("hello back"))
            .create();

        let client = OpenAiClient::new(server.url(), "sk-test", "gpt-4o");
        let reply = client.complete("hi", 500).unwrap();

        assert_eq!(reply, "hello back");
        mock.assert();
    }

    #[test]
    fn test_chat_reports_http_status() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create();

        let client = OpenAiClient::new(server.url(), "sk-test", "gpt-4o");
        match client.complete("hi", 500) {
            Err(AppError::AI(AIError::HttpStatus { status, body })) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("Expected HttpStatus error, got {:?}", other),
        }
    }

    #[test]
    fn test_chat_rejects_empty_choices() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create();

        let client = OpenAiClient::new(server.url(), "sk-test", "gpt-4o");
        assert!(matches!(
            client.complete("hi", 500),
            Err(AppError::AI(AIError::InvalidResponse(_)))
        ));
    }

    #[test]
    fn test_validate_key() {
        let mut server = mockito::Server::new();
        let _ok = server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-good")
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create();
        let _bad = server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-bad")
            .with_status(401)
            .create();

        let good = OpenAiClient::new(server.url(), "sk-good", "gpt-4o");
        assert!(good.validate_key().unwrap());

        let bad = OpenAiClient::new(server.url(), "sk-bad", "gpt-4o");
        assert!(!bad.validate_key().unwrap());
    }

    #[test]
    fn test_unreachable_server() {
        let client = OpenAiClient::new("http://127.0.0.1:1", "sk-test", "gpt-4o")
            .with_timeout(Duration::from_millis(500));
        assert!(matches!(
            client.complete("hi", 10),
            Err(AppError::AI(AIError::Unreachable(_)))
        ));
    }
}
