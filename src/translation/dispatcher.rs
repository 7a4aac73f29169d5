/*!
 * Task dispatch.
 *
 * Entry point of the pipeline: builds the configured backend, applies the
 * upload-permission gate for content kinds whose results leave the machine,
 * and hands the document to the task-kind driver. Drivers walk the
 * document's segments strictly sequentially so that each backend call can
 * see the previously translated segments in order.
 */

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::language_utils::{detect_source_language, language_display_name};
use crate::translation::glossary::Glossary;
use crate::translation::{build_translator, Logger, SegmentContext, SegmentTranslator, TranslatorConfig};

/// Kind of content a task translates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Chapter of a remote web novel
    Web,
    /// Volume from the shared library
    Library,
    /// File on the local machine
    Local,
}

/// Identifies the task being run
#[derive(Debug, Clone)]
pub struct TaskDesc {
    /// Content kind; selects the driver and the upload policy
    pub kind: TaskKind,
    /// Display label for logs (novel id, volume name, file name)
    pub label: String,
}

/// Inputs of one translation task
#[derive(Debug, Clone, Default)]
pub struct TaskParams {
    /// Source document lines, in order
    pub lines: Vec<String>,
    /// Glossary for the task
    pub glossary: Glossary,
}

/// Observational callback for task progress and logs
pub trait TaskCallback: Send + Sync {
    /// Log a message with optional detail lines
    fn log(&self, message: &str, detail: Option<Vec<String>>);

    /// Report segment-level progress
    fn on_progress(&self, translated_segments: usize, total_segments: usize);
}

/// Run one translation task.
///
/// Returns the translated lines accumulated so far, or `None` when the task
/// never started: backend construction failed (logged, nothing propagates)
/// or the upload gate rejected a non-local task (a policy decision, skipped
/// silently). Cancellation or a fatal backend error mid-document keeps the
/// already-accepted segments.
pub async fn translate(
    desc: TaskDesc,
    params: TaskParams,
    callback: Arc<dyn TaskCallback>,
    config: TranslatorConfig,
    token: CancellationToken,
) -> Option<Vec<String>> {
    let log: Logger = {
        let callback = callback.clone();
        Arc::new(move |message: &str, detail| callback.log(&format!("  {}", message), detail))
    };

    let translator = match build_translator(config, log).await {
        Ok(translator) => translator,
        Err(e) => {
            callback.log(
                &format!("Error occurred, unable to create translator: {}", e),
                None,
            );
            return None;
        }
    };

    dispatch(desc, params, callback, translator.as_ref(), token).await
}

/// Gate and run a task against an already-built backend.
///
/// Results of non-local tasks leave the machine, so those consult the
/// backend's upload permission first and are skipped silently when it is
/// withheld.
pub async fn dispatch(
    desc: TaskDesc,
    params: TaskParams,
    callback: Arc<dyn TaskCallback>,
    translator: &dyn SegmentTranslator,
    token: CancellationToken,
) -> Option<Vec<String>> {
    if desc.kind != TaskKind::Local && !translator.allow_upload() {
        return None;
    }

    match desc.kind {
        TaskKind::Web => translate_web(&desc, &params, &callback, translator, &token).await,
        TaskKind::Library => translate_library(&desc, &params, &callback, translator, &token).await,
        TaskKind::Local => translate_local(&desc, &params, &callback, translator, &token).await,
    }
}

async fn translate_web(
    desc: &TaskDesc,
    params: &TaskParams,
    callback: &Arc<dyn TaskCallback>,
    translator: &dyn SegmentTranslator,
    token: &CancellationToken,
) -> Option<Vec<String>> {
    callback.log(
        &format!("Translating web chapter {} with {}", desc.label, translator.id()),
        None,
    );
    Some(walk_segments(params, callback, translator, token).await)
}

async fn translate_library(
    desc: &TaskDesc,
    params: &TaskParams,
    callback: &Arc<dyn TaskCallback>,
    translator: &dyn SegmentTranslator,
    token: &CancellationToken,
) -> Option<Vec<String>> {
    callback.log(
        &format!("Translating library volume {} with {}", desc.label, translator.id()),
        None,
    );
    Some(walk_segments(params, callback, translator, token).await)
}

async fn translate_local(
    desc: &TaskDesc,
    params: &TaskParams,
    callback: &Arc<dyn TaskCallback>,
    translator: &dyn SegmentTranslator,
    token: &CancellationToken,
) -> Option<Vec<String>> {
    callback.log(
        &format!("Translating local file {} with {}", desc.label, translator.id()),
        None,
    );
    Some(walk_segments(params, callback, translator, token).await)
}

/// Walk the document's segments through the backend, strictly in order.
///
/// The window of previously translated segments grows as segments are
/// accepted; backends that use cross-segment context slice their own
/// trailing window from it. A fatal error or cancellation stops the walk
/// and keeps the segments accepted so far.
async fn walk_segments(
    params: &TaskParams,
    callback: &Arc<dyn TaskCallback>,
    translator: &dyn SegmentTranslator,
    token: &CancellationToken,
) -> Vec<String> {
    let segments = translator.segmentor().segment(&params.lines);
    let total = segments.len();

    let guessed = detect_source_language(&params.lines.join("\n"));
    callback.log(
        &format!(
            "{} segments to translate, source language looks like {}",
            total,
            language_display_name(guessed)
        ),
        None,
    );

    let mut translated: Vec<String> = Vec::with_capacity(params.lines.len());
    let mut prev_segs: Vec<Vec<String>> = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        if token.is_cancelled() {
            callback.log("Task cancelled", None);
            break;
        }

        let ctx = SegmentContext {
            glossary: &params.glossary,
            prev_segs: &prev_segs,
            token,
        };
        match translator.translate(segment, ctx).await {
            Ok(lines) => {
                translated.extend(lines.iter().cloned());
                prev_segs.push(lines);
                callback.on_progress(index + 1, total);
            }
            Err(e) => {
                callback.log(&format!("Segment {} failed: {}", index + 1, e), None);
                log::error!("segment {} failed: {}", index + 1, e);
                break;
            }
        }
    }
    translated
}
