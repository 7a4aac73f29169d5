/*!
 * Client for the generic web machine-translation service.
 *
 * The service streams its answer as server-sent-event style chunks, each
 * carrying an event tag and a list of `(paragraph index, fragment)` pairs.
 * One paragraph can be spread over several chunks, so the client only
 * collects the chunks; reassembly into lines is backend policy.
 */

use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::providers::WebMtApi;

/// One translated fragment tagged with the paragraph it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParagraphFragment {
    /// Index of the source paragraph this fragment continues
    #[serde(rename = "paraIdx")]
    pub para_idx: usize,
    /// Translated fragment text
    pub dst: String,
}

/// One streamed response chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateChunk {
    /// Event tag; only `Translating` chunks carry output fragments
    #[serde(default)]
    pub event: Option<String>,
    /// Fragments delivered by this chunk
    #[serde(default)]
    pub list: Vec<ParagraphFragment>,
}

/// Request body of the translate call
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    query: &'a str,
    from: &'a str,
    to: &'a str,
}

/// Client for the web machine-translation API
pub struct WebMtClient {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the service
    base_url: String,
}

impl WebMtClient {
    /// Create a new client for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            base_url: endpoint.into().trim_end_matches('/').to_string(),
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

    /// Parse one event-stream line into a chunk, skipping keep-alives
    fn parse_line(line: &str) -> Option<TranslateChunk> {
        let payload = line.strip_prefix("data:")?.trim();
        if payload.is_empty() {
            return None;
        }
        serde_json::from_str(payload).ok()
    }
}

#[async_trait]
impl WebMtApi for WebMtClient {
    async fn suggest(&self) -> Result<(), ProviderError> {
        let url = format!("{}/sug", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[("kw", "hello")])
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(status, message));
        }
        Ok(())
    }

    async fn translate(
        &self,
        query: &str,
        from: &str,
        to: &str,
        token: &CancellationToken,
    ) -> Result<Vec<TranslateChunk>, ProviderError> {
        let url = format!("{}/ait/text/translate", self.base_url);
        let request = TranslateRequest { query, from, to };

        let send = self.client.post(&url).json(&request).send();
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

        let mut chunks = Vec::new();
        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ProviderError::Cancelled),
                item = stream.next() => item,
            };
            let Some(item) = next else { break };
            let piece = item.map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
            buffer.extend_from_slice(&piece);

            // Drain complete lines; a partial line stays buffered for the
            // next chunk of the body.
            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line = buffer.split_to(pos + 1);
                let line = String::from_utf8_lossy(&line[..pos]);
                if let Some(chunk) = Self::parse_line(line.trim_end_matches('\r')) {
                    chunks.push(chunk);
                }
            }
        }

        if let Some(chunk) = Self::parse_line(String::from_utf8_lossy(&buffer).trim()) {
            chunks.push(chunk);
        }

        Ok(chunks)
    }
}
