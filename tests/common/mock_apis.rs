/*!
 * Mock API implementations for testing
 *
 * Scripted implementations of the low-level API traits so backend logic can
 * be exercised without a live server. Each mock records the requests it
 * receives and replays a queue of predetermined outcomes.
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use noveltrans::errors::{ProviderError, TranslationError};
use noveltrans::providers::chat::{
    ChatChoice, ChatMessage, ChatRequest, ChatResponse, ModelEntry, TokenUsage,
};
use noveltrans::providers::webmt::TranslateChunk;
use noveltrans::providers::{ChatApi, WebMtApi};
use noveltrans::translation::segment::LengthSegmentor;
use noveltrans::translation::{SegmentContext, SegmentTranslator};

/// One scripted chat completion outcome
#[derive(Debug, Clone)]
pub struct ScriptedCompletion {
    /// Completion text the mock returns
    pub text: String,
    /// Whether the completion should look degenerate (budget exhausted)
    pub degenerate: bool,
}

impl ScriptedCompletion {
    pub fn clean(text: impl Into<String>) -> Self {
        Self { text: text.into(), degenerate: false }
    }

    pub fn degenerate(text: impl Into<String>) -> Self {
        Self { text: text.into(), degenerate: true }
    }
}

/// Scripted OpenAI-compatible chat API
pub struct ScriptedChatApi {
    /// Model listing outcome; `Err` scripts a failed listing
    models: Result<Vec<ModelEntry>, String>,
    /// Completions replayed in order; the last entry repeats when drained
    completions: Mutex<VecDeque<ScriptedCompletion>>,
    /// Every chat request received, in order
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatApi {
    pub fn new(models: Vec<ModelEntry>, completions: Vec<ScriptedCompletion>) -> Self {
        Self {
            models: Ok(models),
            completions: Mutex::new(completions.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock whose model listing fails
    pub fn with_failed_listing(completions: Vec<ScriptedCompletion>) -> Self {
        Self {
            models: Err("listing unavailable".to_string()),
            completions: Mutex::new(completions.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatApi for ScriptedChatApi {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, ProviderError> {
        match &self.models {
            Ok(models) => Ok(models.clone()),
            Err(message) => Err(ProviderError::RequestFailed(message.clone())),
        }
    }

    async fn create_chat_completions(
        &self,
        request: ChatRequest,
        token: &CancellationToken,
    ) -> Result<ChatResponse, ProviderError> {
        if token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let budget = request.max_tokens_value();
        self.requests.lock().unwrap().push(request);

        let scripted = {
            let mut queue = self.completions.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        }
        .expect("ScriptedChatApi ran out of completions");

        // Degeneration is detected through budget exhaustion, so the mock
        // reports usage relative to the request's own budget.
        let completion_tokens = if scripted.degenerate { budget } else { budget.saturating_sub(1) };
        Ok(ChatResponse {
            choices: vec![ChatChoice {
                message: ChatMessage::assistant(scripted.text),
            }],
            usage: TokenUsage { prompt_tokens: 1, completion_tokens },
        })
    }
}

/// Scripted web-MT API
pub struct ScriptedWebMtApi {
    /// Whether the warm-up call fails
    pub suggest_fails: bool,
    /// Chunks returned by every translate call
    pub chunks: Vec<TranslateChunk>,
    /// Every `(query, from, to)` received
    pub requests: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedWebMtApi {
    pub fn new(chunks: Vec<TranslateChunk>) -> Self {
        Self { suggest_fails: false, chunks, requests: Mutex::new(Vec::new()) }
    }

    pub fn failing_warmup() -> Self {
        Self { suggest_fails: true, chunks: Vec::new(), requests: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl WebMtApi for ScriptedWebMtApi {
    async fn suggest(&self) -> Result<(), ProviderError> {
        if self.suggest_fails {
            Err(ProviderError::ConnectionError("warm-up refused".to_string()))
        } else {
            Ok(())
        }
    }

    async fn translate(
        &self,
        query: &str,
        from: &str,
        to: &str,
        _token: &CancellationToken,
    ) -> Result<Vec<TranslateChunk>, ProviderError> {
        self.requests
            .lock()
            .unwrap()
            .push((query.to_string(), from.to_string(), to.to_string()));
        Ok(self.chunks.clone())
    }
}

/// Backend stub that echoes its input unchanged
pub struct EchoTranslator {
    segmentor: LengthSegmentor,
    upload_allowed: bool,
    /// Number of translate calls received
    pub calls: Mutex<usize>,
}

impl EchoTranslator {
    pub fn new(max_length: usize) -> Self {
        Self {
            segmentor: LengthSegmentor::new(max_length),
            upload_allowed: true,
            calls: Mutex::new(0),
        }
    }

    pub fn with_upload_denied(max_length: usize) -> Self {
        Self {
            segmentor: LengthSegmentor::new(max_length),
            upload_allowed: false,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl SegmentTranslator for EchoTranslator {
    fn id(&self) -> &'static str {
        "echo"
    }

    fn segmentor(&self) -> &LengthSegmentor {
        &self.segmentor
    }

    fn allow_upload(&self) -> bool {
        self.upload_allowed
    }

    async fn translate(
        &self,
        seg: &[String],
        _ctx: SegmentContext<'_>,
    ) -> Result<Vec<String>, TranslationError> {
        *self.calls.lock().unwrap() += 1;
        Ok(seg.to_vec())
    }
}
