/*!
 * Generic web machine-translation backend.
 *
 * Translates batches through a general-purpose web MT service. The service
 * does not understand glossaries, so terms are pre-substituted into the
 * source text. Output arrives as paragraph-tagged fragments that have to be
 * reassembled into lines.
 */

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::errors::TranslationError;
use crate::language_utils::detect_source_language;
use crate::providers::webmt::ParagraphFragment;
use crate::providers::WebMtApi;
use crate::translation::glossary::translate_with_glossary;
use crate::translation::segment::LengthSegmentor;
use crate::translation::{emit, Logger, SegmentContext, SegmentTranslator};

/// Batching limit of the web MT service, in characters
pub const SEGMENT_LENGTH: usize = 3500;

/// Backend for the generic web machine-translation service
pub struct WebMtTranslator {
    log: Logger,
    api: Arc<dyn WebMtApi>,
    segmentor: LengthSegmentor,
}

impl WebMtTranslator {
    /// Create the backend and run the warm-up call.
    ///
    /// The service rejects translate calls from sessions that never issued
    /// a suggestion request, so a failed warm-up is fatal for the instance.
    pub async fn create(api: Arc<dyn WebMtApi>, log: Logger) -> Result<Self, TranslationError> {
        api.suggest()
            .await
            .map_err(|e| TranslationError::InitFailed(format!("warm-up call failed: {}", e)))?;
        Ok(Self {
            log,
            api,
            segmentor: LengthSegmentor::new(SEGMENT_LENGTH),
        })
    }

    async fn translate_inner(
        &self,
        seg: Vec<String>,
        token: &CancellationToken,
    ) -> Result<Vec<String>, TranslationError> {
        let query = seg.join("\n");
        let from = detect_source_language(&query);

        let chunks = self.api.translate(&query, from, "en", token).await?;
        let fragments: Vec<ParagraphFragment> = chunks
            .into_iter()
            .filter(|chunk| chunk.event.as_deref() == Some("Translating"))
            .flat_map(|chunk| chunk.list)
            .collect();

        if fragments.is_empty() {
            emit(&self.log, "Web MT returned no fragments", Some(vec![query]));
        }
        Ok(assemble_paragraphs(fragments))
    }
}

/// Reassemble output lines from paragraph-tagged fragments.
///
/// Fragments with the same paragraph index concatenate in arrival order; a
/// change of index starts a new line. The service is free to stream one
/// paragraph over several fragments, so this tolerates any split.
pub fn assemble_paragraphs(fragments: Vec<ParagraphFragment>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_idx = 0usize;
    let mut current_line = String::new();

    for ParagraphFragment { para_idx, dst } in fragments {
        if para_idx == current_idx {
            current_line.push_str(&dst);
        } else {
            lines.push(current_line);
            current_idx = para_idx;
            current_line = dst;
        }
    }
    lines.push(current_line);
    lines
}

#[async_trait]
impl SegmentTranslator for WebMtTranslator {
    fn id(&self) -> &'static str {
        "webmt"
    }

    fn segmentor(&self) -> &LengthSegmentor {
        &self.segmentor
    }

    async fn translate(
        &self,
        seg: &[String],
        ctx: SegmentContext<'_>,
    ) -> Result<Vec<String>, TranslationError> {
        translate_with_glossary(seg, ctx.glossary, |lines| {
            self.translate_inner(lines, ctx.token)
        })
        .await
    }
}
