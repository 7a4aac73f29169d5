/*!
 * Local offline backend.
 *
 * A peer implementation of the backend contract whose model execution
 * lives in the host application. The backend only handles batching and
 * glossary pre-substitution; everything past that is the engine's.
 */

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::TranslationError;
use crate::translation::glossary::translate_with_glossary;
use crate::translation::segment::LengthSegmentor;
use crate::translation::{SegmentContext, SegmentTranslator};

/// Batching limit of the local backend, in characters
pub const SEGMENT_LENGTH: usize = 1000;

/// Offline model execution, supplied by the host application
#[async_trait]
pub trait OfflineEngine: Send + Sync {
    /// Translate a batch of lines, one output line per input line
    async fn translate_lines(&self, lines: &[String]) -> Result<Vec<String>, TranslationError>;
}

/// Backend wrapping a host-supplied offline engine
pub struct LocalTranslator {
    engine: Arc<dyn OfflineEngine>,
    segmentor: LengthSegmentor,
}

impl LocalTranslator {
    /// Create the backend around an engine
    pub fn new(engine: Arc<dyn OfflineEngine>) -> Self {
        Self {
            engine,
            segmentor: LengthSegmentor::new(SEGMENT_LENGTH),
        }
    }
}

#[async_trait]
impl SegmentTranslator for LocalTranslator {
    fn id(&self) -> &'static str {
        "local"
    }

    fn segmentor(&self) -> &LengthSegmentor {
        &self.segmentor
    }

    async fn translate(
        &self,
        seg: &[String],
        ctx: SegmentContext<'_>,
    ) -> Result<Vec<String>, TranslationError> {
        translate_with_glossary(seg, ctx.glossary, |lines| async move {
            self.engine.translate_lines(&lines).await
        })
        .await
    }
}
