/*!
 * Specialized fine-tuned LLM backend.
 *
 * Translates batches through a chat-completion API serving a fine-tuned
 * light-novel translation model. The backend detects the deployed model
 * build, derives the prompt protocol version from the model id, gates
 * result upload on a pinned allow-list of vetted builds, and applies a
 * two-phase retry policy: whole-segment attempts first, then a per-line
 * fallback that tolerates one degenerate line and aborts on the second.
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::{DEFAULT_PREV_SEG_LENGTH, DEFAULT_SEG_LENGTH};
use crate::errors::{ProviderError, TranslationError};
use crate::providers::chat::{ChatMessage, ChatRequest};
use crate::providers::ChatApi;
use crate::translation::glossary::Glossary;
use crate::translation::segment::LengthSegmentor;
use crate::translation::{emit, Logger, SegmentContext, SegmentTranslator};

/// Total whole-segment attempts before the per-line fallback
const MAX_BATCH_ATTEMPTS: u32 = 3;

/// End-of-turn marker some builds leak into the completion
const END_OF_TURN: &str = "<|im_end|>";

/// Degenerate lines tolerated per segment before the task is aborted
const MAX_DEGENERATE_LINES: u32 = 2;

const BASE_SYSTEM_PROMPT: &str = "You are a light novel translation model that can fluently \
and smoothly translate Japanese into English in the style of Japanese light novels, and \
correctly use personal pronouns in context without arbitrarily adding pronouns that are not \
in the original text.";

const GLOSSARY_SYSTEM_PROMPT: &str = "You are a light novel translation model that can \
fluently and smoothly use the given glossary to translate Japanese into English in the style \
of Japanese light novels, and correctly use personal pronouns in context, paying attention \
not to confuse the subject and object of causative and passive forms, do not arbitrarily add \
pronouns that are not in the original text, and do not arbitrarily add or reduce line breaks.";

/// Prompt protocol versions, by model generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVersion {
    V0_8,
    V0_9,
    V0_10,
    V1_0,
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::V0_8 => "0.8",
            Self::V0_9 => "0.9",
            Self::V0_10 => "0.10",
            Self::V1_0 => "1.0",
        };
        write!(f, "{}", s)
    }
}

/// Derive the protocol version from a detected model id.
///
/// The substring checks run in this fixed order for compatibility with
/// deployed id schemes; an id carrying several markers resolves to the
/// first match. An id that matches no marker gets the most recent
/// supported version.
pub fn sniff_version(id: &str) -> ModelVersion {
    if id.contains("0.8") {
        ModelVersion::V0_8
    } else if id.contains("0.9") {
        ModelVersion::V0_9
    } else if id.contains("0.10") {
        ModelVersion::V0_10
    } else if id.contains("1.0") {
        ModelVersion::V1_0
    } else {
        ModelVersion::V1_0
    }
}

/// Reference fingerprint of one vetted model build
pub struct AllowedModel {
    /// Upstream weights repository
    pub repo: &'static str,
    /// Metadata values the deployed build must report, key by key
    pub meta: &'static [(&'static str, i64)],
}

/// Pinned allow-list of model builds whose output may be uploaded
pub static ALLOW_MODELS: Lazy<HashMap<&'static str, AllowedModel>> = Lazy::new(|| {
    HashMap::from([
        (
            "sakura-14b-qwen2.5-v1.0-iq4xs",
            AllowedModel {
                repo: "SakuraLLM/Sakura-14B-Qwen2.5-v1.0-GGUF",
                meta: &[
                    ("vocab_type", 2),
                    ("n_vocab", 152064),
                    ("n_ctx_train", 131072),
                    ("n_embd", 5120),
                    ("n_params", 14770033664),
                    ("size", 8180228096),
                ],
            },
        ),
        (
            "sakura-14b-qwen2.5-v1.0-q6k",
            AllowedModel {
                repo: "SakuraLLM/Sakura-14B-Qwen2.5-v1.0-GGUF",
                meta: &[
                    ("vocab_type", 2),
                    ("n_vocab", 152064),
                    ("n_ctx_train", 131072),
                    ("n_embd", 5120),
                    ("n_params", 14770033664),
                    ("size", 12118716416),
                ],
            },
        ),
        (
            "sakura-14b-qwen2beta-v0.9.2-iq4xs",
            AllowedModel {
                repo: "SakuraLLM/Sakura-14B-Qwen2beta-v0.9.2-GGUF",
                meta: &[
                    ("vocab_type", 2),
                    ("n_vocab", 152064),
                    ("n_ctx_train", 32768),
                    ("n_embd", 5120),
                    ("n_params", 14167290880),
                    ("size", 7908392960),
                ],
            },
        ),
        (
            "sakura-32b-qwen2beta-v0.9-iq4xs",
            AllowedModel {
                repo: "SakuraLLM/Sakura-32B-Qwen2beta-v0.9-GGUF",
                meta: &[
                    ("vocab_type", 2),
                    ("n_vocab", 152064),
                    ("n_ctx_train", 32768),
                    ("n_embd", 5120),
                    ("n_params", 32512218112),
                    ("size", 17728790528),
                ],
            },
        ),
    ])
});

/// Model identity detected from the serving endpoint
#[derive(Debug, Clone)]
pub struct DetectedModel {
    /// Model id with the weights file extension stripped
    pub id: String,
    /// Fingerprint metadata reported by the server
    pub meta: HashMap<String, i64>,
}

/// Settings for the LLM backend
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// Segment length in characters, reference default when absent
    pub seg_length: Option<usize>,
    /// Previous-context length in characters, reference default when absent
    pub prev_seg_length: Option<usize>,
}

/// Completion text plus the degeneration verdict for one attempt
struct CompletionOutcome {
    text: String,
    degenerated: bool,
}

/// Backend for the specialized fine-tuned translation model
pub struct LlmTranslator {
    log: Logger,
    api: Arc<dyn ChatApi>,
    segmentor: LengthSegmentor,
    seg_length: usize,
    prev_seg_length: usize,
    version: ModelVersion,
    model: Option<DetectedModel>,
}

impl LlmTranslator {
    /// Create the backend, detecting the deployed model.
    ///
    /// A failed or empty model listing leaves the backend usable for
    /// translation but guarantees the upload gate fails.
    pub async fn create(api: Arc<dyn ChatApi>, log: Logger, config: LlmConfig) -> Self {
        let seg_length = config.seg_length.unwrap_or(DEFAULT_SEG_LENGTH);
        let prev_seg_length = config.prev_seg_length.unwrap_or(DEFAULT_PREV_SEG_LENGTH);

        let model = Self::detect_model(api.as_ref(), &log).await;
        let version = match &model {
            Some(detected) => sniff_version(&detected.id),
            None => ModelVersion::V0_9,
        };
        match &model {
            Some(detected) => emit(
                &log,
                &format!("Model is {}, protocol version {}", detected.id, version),
                None,
            ),
            None => emit(&log, "No model detected, protocol version 0.9", None),
        }

        Self {
            log,
            api,
            segmentor: LengthSegmentor::new(seg_length),
            seg_length,
            prev_seg_length,
            version,
            model,
        }
    }

    /// Protocol version in effect
    pub fn version(&self) -> ModelVersion {
        self.version
    }

    /// Detected model, if the listing succeeded
    pub fn model(&self) -> Option<&DetectedModel> {
        self.model.as_ref()
    }

    async fn detect_model(api: &dyn ChatApi, log: &Logger) -> Option<DetectedModel> {
        let models = match api.list_models().await {
            Ok(models) => models,
            Err(e) => {
                emit(log, &format!("Failed to fetch model data: {}", e), None);
                return None;
            }
        };
        models.into_iter().next().map(|entry| DetectedModel {
            id: entry
                .id
                .strip_suffix(".gguf")
                .unwrap_or(&entry.id)
                .to_string(),
            meta: entry.meta,
        })
    }

    /// Trailing window of previously translated segments, flattened.
    /// A previous-context length shorter than one segment resolves to
    /// zero segments of context.
    fn concat_prev_segs(&self, prev_segs: &[Vec<String>]) -> String {
        let window = self.prev_seg_length.div_ceil(self.seg_length.max(1));
        if window == 0 {
            return String::new();
        }
        let start = prev_segs.len().saturating_sub(window);
        prev_segs[start..]
            .iter()
            .flat_map(|seg| seg.iter().map(String::as_str))
            .collect::<Vec<&str>>()
            .join("\n")
    }

    /// Build the versioned prompt for one translation request.
    ///
    /// Returns the messages and the character count of the text as it
    /// appears in the prompt (glossary substitution can change it), which
    /// sizes the completion token budget.
    pub fn build_messages(
        &self,
        text: &str,
        glossary: &Glossary,
        prev_text: &str,
    ) -> (Vec<ChatMessage>, usize) {
        let text = normalize_fullwidth_digits(text);
        let mut messages = Vec::new();

        match self.version {
            ModelVersion::V1_0 => {
                messages.push(ChatMessage::system(BASE_SYSTEM_PROMPT));
                if !prev_text.is_empty() {
                    messages.push(ChatMessage::assistant(prev_text));
                }
                if glossary.is_empty() {
                    messages.push(ChatMessage::user(format!(
                        "Translate the following Japanese text into English: {}",
                        text
                    )));
                } else {
                    let hint = glossary.hint_lines().join("\n");
                    messages.push(ChatMessage::user(format!(
                        "Based on the following glossary (can be empty):\n{}\n\
                         Translate the following Japanese text into English according to \
                         the corresponding relationships and notes: {}",
                        hint, text
                    )));
                }
                let chars = text.chars().count();
                (messages, chars)
            }
            ModelVersion::V0_10 => {
                messages.push(ChatMessage::system(GLOSSARY_SYSTEM_PROMPT));
                if !prev_text.is_empty() {
                    messages.push(ChatMessage::assistant(prev_text));
                }
                // The glossary hint is always embedded, empty or not.
                let hint = glossary.hint_lines().join("\n");
                messages.push(ChatMessage::user(format!(
                    "Based on the following glossary (can be empty):\n{}\n\n\
                     Translate the following Japanese text into English according to the \
                     corresponding relationships and notes in the above glossary: {}",
                    hint, text
                )));
                let chars = text.chars().count();
                (messages, chars)
            }
            ModelVersion::V0_8 | ModelVersion::V0_9 => {
                messages.push(ChatMessage::system(BASE_SYSTEM_PROMPT));
                if !prev_text.is_empty() {
                    messages.push(ChatMessage::assistant(prev_text));
                }
                // This model generation cannot consume structured glossary
                // hints; substitute the terms into the input instead.
                let text = glossary.apply(&text);
                messages.push(ChatMessage::user(format!(
                    "Translate the following Japanese text into English: {}",
                    text
                )));
                let chars = text.chars().count();
                (messages, chars)
            }
        }
    }

    async fn create_chat_completions(
        &self,
        text: &str,
        glossary: &Glossary,
        prev_text: &str,
        token: &CancellationToken,
        saw_degeneration: bool,
    ) -> Result<CompletionOutcome, TranslationError> {
        let (messages, prompt_chars) = self.build_messages(text, glossary, prev_text);
        let max_new_tokens = completion_budget(prompt_chars);

        let request = ChatRequest::new("", messages)
            .temperature(0.1)
            .top_p(0.3)
            .max_tokens(max_new_tokens)
            .frequency_penalty(if saw_degeneration { 0.2 } else { 0.0 });

        let completion = self.api.create_chat_completions(request, token).await?;
        let choice = completion.choices.into_iter().next().ok_or_else(|| {
            TranslationError::Provider(ProviderError::ParseError(
                "completion carried no choices".to_string(),
            ))
        })?;

        // A completion that consumed its whole budget is treated as
        // truncated or stuck in a repetition loop.
        Ok(CompletionOutcome {
            text: choice.message.content,
            degenerated: completion.usage.completion_tokens >= max_new_tokens,
        })
    }
}

/// Completion token budget for a prompt of the given character count
pub fn completion_budget(prompt_chars: usize) -> u32 {
    ((prompt_chars as f64 * 1.7).ceil() as u32).max(100)
}

/// Normalize full-width numerals to their half-width form
pub fn normalize_fullwidth_digits(text: &str) -> String {
    text.chars()
        .map(|ch| {
            if ('\u{FF10}'..='\u{FF19}').contains(&ch) {
                char::from_u32(ch as u32 - 0xFEE0).unwrap_or(ch)
            } else {
                ch
            }
        })
        .collect()
}

fn strip_end_marker(text: &str) -> String {
    text.replace(END_OF_TURN, "")
}

#[async_trait]
impl SegmentTranslator for LlmTranslator {
    fn id(&self) -> &'static str {
        "sakura"
    }

    fn segmentor(&self) -> &LengthSegmentor {
        &self.segmentor
    }

    /// Only an exactly matching vetted configuration may upload results.
    fn allow_upload(&self) -> bool {
        if self.seg_length != DEFAULT_SEG_LENGTH {
            emit(
                &self.log,
                &format!("Segment length is not {}", DEFAULT_SEG_LENGTH),
                None,
            );
            return false;
        }
        if self.prev_seg_length != DEFAULT_PREV_SEG_LENGTH {
            emit(
                &self.log,
                &format!("Previous segment length is not {}", DEFAULT_PREV_SEG_LENGTH),
                None,
            );
            return false;
        }

        let Some(model) = &self.model else {
            emit(&self.log, "Unable to get model data", None);
            return false;
        };

        let Some(expected) = ALLOW_MODELS.get(model.id.as_str()) else {
            emit(&self.log, &format!("Model is {}, upload prohibited", model.id), None);
            return false;
        };

        // Key enumeration is reference-driven: metadata the reference does
        // not pin is never checked.
        for (key, expected_value) in expected.meta {
            if model.meta.get(*key) != Some(expected_value) {
                emit(&self.log, "Model check failed, do not try to deceive model check", None);
                return false;
            }
        }

        emit(&self.log, &format!("Model is {}, upload allowed", model.id), None);
        true
    }

    async fn translate(
        &self,
        seg: &[String],
        ctx: SegmentContext<'_>,
    ) -> Result<Vec<String>, TranslationError> {
        let concated_seg = seg.join("\n");
        let concated_prev = self.concat_prev_segs(ctx.prev_segs);

        // Phase 1: whole-segment attempts.
        for attempt in 1..=MAX_BATCH_ATTEMPTS {
            let outcome = self
                .create_chat_completions(
                    &concated_seg,
                    ctx.glossary,
                    &concated_prev,
                    ctx.token,
                    attempt > 1,
                )
                .await?;

            let split: Vec<String> = strip_end_marker(&outcome.text)
                .split('\n')
                .map(str::to_string)
                .collect();
            let lines_not_matched = split.len() != seg.len();

            let verdict = if outcome.degenerated {
                "degenerated"
            } else if lines_not_matched {
                "line count mismatch"
            } else {
                "ok"
            };
            emit(
                &self.log,
                &format!("Attempt {}: {}", attempt, verdict),
                Some(vec![concated_seg.clone(), outcome.text.clone()]),
            );

            if !outcome.degenerated && !lines_not_matched {
                return Ok(split);
            }
        }

        // Phase 2: per-line fallback, context built up incrementally from
        // the lines already translated in this segment.
        emit(&self.log, "Falling back to line-by-line translation", None);
        let mut degenerate_lines = 0u32;
        let mut result: Vec<String> = Vec::with_capacity(seg.len());

        for line in seg {
            let prev_text = {
                let mut parts: Vec<&str> = Vec::with_capacity(result.len() + 1);
                if !concated_prev.is_empty() {
                    parts.push(&concated_prev);
                }
                parts.extend(result.iter().map(String::as_str));
                parts.join("\n")
            };

            let outcome = self
                .create_chat_completions(line, ctx.glossary, &prev_text, ctx.token, true)
                .await?;

            if outcome.degenerated {
                degenerate_lines += 1;
                emit(
                    &self.log,
                    &format!("Line degenerated, {} in this segment", degenerate_lines),
                    Some(vec![line.clone(), outcome.text]),
                );
                if degenerate_lines >= MAX_DEGENERATE_LINES {
                    // Density like this means the model is malfunctioning,
                    // not emitting recoverable per-line noise.
                    return Err(TranslationError::DegenerationDensity {
                        count: degenerate_lines,
                    });
                }
                // Keep the untranslated line rather than blocking the
                // whole document.
                result.push(line.clone());
            } else {
                result.push(strip_end_marker(&outcome.text));
            }
        }
        Ok(result)
    }
}
