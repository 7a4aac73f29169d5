/*!
 * Segmented translation pipeline.
 *
 * The pipeline splits a document into length-bounded segments, routes each
 * segment through the configured backend, and re-assembles a line-aligned
 * translation. The module is organized as:
 * - `segment`: length-bounded batching of document lines
 * - `glossary`: user glossary and literal pre-substitution
 * - `web_backend`: generic web machine-translation backend
 * - `llm_backend`: specialized fine-tuned LLM backend with quality gating
 * - `local_backend`: offline peer backend (engine supplied by the host)
 * - `dispatcher`: task descriptors, upload gate and segment-walking drivers
 */

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::errors::TranslationError;
use crate::providers::chat::ChatClient;
use crate::providers::webmt::WebMtClient;

use self::glossary::Glossary;
use self::llm_backend::{LlmConfig, LlmTranslator};
use self::local_backend::{LocalTranslator, OfflineEngine};
use self::segment::LengthSegmentor;
use self::web_backend::WebMtTranslator;

pub mod dispatcher;
pub mod glossary;
pub mod llm_backend;
pub mod local_backend;
pub mod segment;
pub mod web_backend;

/// Task-scoped logging callback: a message plus optional detail lines
pub type Logger = Arc<dyn Fn(&str, Option<Vec<String>>) + Send + Sync>;

/// Invoke a task logger
pub(crate) fn emit(log: &Logger, message: &str, detail: Option<Vec<String>>) {
    log.as_ref()(message, detail);
}

/// Per-segment translation input
pub struct SegmentContext<'a> {
    /// Active glossary for the task
    pub glossary: &'a Glossary,
    /// Previously translated segments, oldest first; backends that carry
    /// context across segments take a trailing window of these
    pub prev_segs: &'a [Vec<String>],
    /// Cancellation signal threaded through every network call
    pub token: &'a CancellationToken,
}

/// Capability contract every translation backend implements.
///
/// The dispatcher only ever holds this trait, never a concrete backend.
#[async_trait]
pub trait SegmentTranslator: Send + Sync {
    /// Stable backend identifier
    fn id(&self) -> &'static str;

    /// Line batching policy for this backend
    fn segmentor(&self) -> &LengthSegmentor;

    /// Whether the backend's output is trusted enough to be shared.
    /// Derived from configuration and detected model state, not static.
    fn allow_upload(&self) -> bool {
        true
    }

    /// Translate one segment. On success the result is line-aligned with
    /// the input; a mismatch inside the backend is a recoverable failure,
    /// not a success.
    async fn translate(
        &self,
        seg: &[String],
        ctx: SegmentContext<'_>,
    ) -> Result<Vec<String>, TranslationError>;
}

/// Backend selection and settings for one translation task
pub enum TranslatorConfig {
    /// Generic web machine-translation service
    WebMt {
        /// Service endpoint
        endpoint: String,
    },
    /// Specialized fine-tuned LLM behind an OpenAI-compatible server
    Llm {
        /// Server endpoint
        endpoint: String,
        /// Segment length override, reference default when absent
        seg_length: Option<usize>,
        /// Previous-context length override, reference default when absent
        prev_seg_length: Option<usize>,
    },
    /// Local offline engine supplied by the host application
    Local {
        /// Engine implementation
        engine: Arc<dyn OfflineEngine>,
    },
}

/// Construct and initialize the configured backend.
///
/// Backends are built once per task; initialization performs the backend's
/// warm-up or model detection calls.
pub async fn build_translator(
    config: TranslatorConfig,
    log: Logger,
) -> Result<Box<dyn SegmentTranslator>, TranslationError> {
    match config {
        TranslatorConfig::WebMt { endpoint } => {
            let api = Arc::new(WebMtClient::new(endpoint));
            let translator = WebMtTranslator::create(api, log).await?;
            Ok(Box::new(translator))
        }
        TranslatorConfig::Llm { endpoint, seg_length, prev_seg_length } => {
            let api = Arc::new(ChatClient::new(endpoint, "no-key"));
            let config = LlmConfig { seg_length, prev_seg_length };
            let translator = LlmTranslator::create(api, log, config).await;
            Ok(Box::new(translator))
        }
        TranslatorConfig::Local { engine } => Ok(Box::new(LocalTranslator::new(engine))),
    }
}
