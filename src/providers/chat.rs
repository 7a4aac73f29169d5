/*!
 * Client for OpenAI-compatible chat-completion servers.
 *
 * The specialized translation models are served by llama.cpp-style servers
 * that speak the OpenAI chat protocol and report model metadata through the
 * model listing endpoint. The client is built without a request timeout:
 * long generations run until they finish or the task's cancellation token
 * fires.
 */

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::providers::ChatApi;

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user or assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model name; servers hosting a single model accept an empty string
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Sampling temperature
    temperature: f32,
    /// Nucleus sampling probability mass
    top_p: f32,
    /// Token budget for the completion
    max_tokens: u32,
    /// Penalty applied to repeated tokens
    frequency_penalty: f32,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 1.0,
            top_p: 1.0,
            max_tokens: 1024,
            frequency_penalty: 0.0,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set top_p (nucleus sampling)
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the completion token budget
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the frequency penalty
    pub fn frequency_penalty(mut self, frequency_penalty: f32) -> Self {
        self.frequency_penalty = frequency_penalty;
        self
    }

    /// Messages of the request (used by scripted test doubles)
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Token budget of the request (used by scripted test doubles)
    pub fn max_tokens_value(&self) -> u32 {
        self.max_tokens
    }
}

/// One completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: ChatMessage,
}

/// Token usage counts reported by the server
#[derive(Debug, Clone, Deserialize)]
pub struct TokenUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u32,
    /// Number of completion tokens
    pub completion_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Completion choices; the first one is used
    pub choices: Vec<ChatChoice>,
    /// Token usage counts
    pub usage: TokenUsage,
}

/// One entry of the model listing
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    /// Model id as the server reports it (usually the weights file name)
    pub id: String,
    /// Fingerprint metadata (vocabulary size, embedding size, ...)
    #[serde(default)]
    pub meta: HashMap<String, i64>,
}

/// Model listing response
#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

/// Client for an OpenAI-compatible chat server
pub struct ChatClient {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the server
    base_url: String,
    /// API key, empty for servers that do not check one
    api_key: String,
}

impl ChatClient {
    /// Create a new client for the given endpoint
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = endpoint.into().trim_end_matches('/').to_string();
        Self {
            // No timeout: generation length is unbounded, cancellation is
            // the only way to stop a running completion early.
            client: Client::builder().build().unwrap_or_default(),
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Map a non-success HTTP status to a typed provider error
    fn error_for_status(status: reqwest::StatusCode, message: String) -> ProviderError {
        match status.as_u16() {
            429 => ProviderError::RateLimitExceeded(message),
            401 | 403 => ProviderError::AuthenticationError(message),
            code => ProviderError::ApiError { status_code: code, message },
        }
    }

    /// Attach the bearer header when an API key is configured
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.api_key)
        }
    }
}

#[async_trait]
impl ChatApi for ChatClient {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, ProviderError> {
        let url = format!("{}/v1/models", self.base_url);
        let response = self
            .authorized(self.client.get(&url))
            // Servers exposed through ngrok tunnels interpose a browser
            // warning page unless this header is present.
            .header("ngrok-skip-browser-warning", "69420")
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(status, message));
        }

        let listing: ModelList = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(listing.data)
    }

    async fn create_chat_completions(
        &self,
        request: ChatRequest,
        token: &CancellationToken,
    ) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let send = self.authorized(self.client.post(&url)).json(&request).send();

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ProviderError::Cancelled),
            result = send => {
                result.map_err(|e| {
                    if e.is_connect() {
                        ProviderError::ConnectionError(e.to_string())
                    } else {
                        ProviderError::RequestFailed(e.to_string())
                    }
                })?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(status, message));
        }

        let body = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ProviderError::Cancelled),
            result = response.text() => {
                result.map_err(|e| ProviderError::RequestFailed(e.to_string()))?
            }
        };

        serde_json::from_str(&body).map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}
