/*!
 * Low-level clients for the remote translation services.
 *
 * This module contains the HTTP clients the backends are built on:
 * - `chat`: OpenAI-compatible chat-completion API (model listing included)
 * - `webmt`: generic web machine-translation API with streamed responses
 *
 * Each client sits behind a small async trait so the backends can be
 * exercised in tests with scripted implementations instead of a live server.
 */

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;

use self::chat::{ChatRequest, ChatResponse, ModelEntry};
use self::webmt::TranslateChunk;

/// Interface of an OpenAI-compatible chat-completion service
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// List the models the server currently serves
    async fn list_models(&self) -> Result<Vec<ModelEntry>, ProviderError>;

    /// Run one chat completion
    async fn create_chat_completions(
        &self,
        request: ChatRequest,
        token: &CancellationToken,
    ) -> Result<ChatResponse, ProviderError>;
}

/// Interface of the generic web machine-translation service
#[async_trait]
pub trait WebMtApi: Send + Sync {
    /// Non-translating warm-up call; must succeed before the first translation
    async fn suggest(&self) -> Result<(), ProviderError>;

    /// Translate a query string, returning the raw response chunks
    async fn translate(
        &self,
        query: &str,
        from: &str,
        to: &str,
        token: &CancellationToken,
    ) -> Result<Vec<TranslateChunk>, ProviderError>;
}

pub mod chat;
pub mod webmt;
