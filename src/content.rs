/*!
 * Upstream content collaborator boundary.
 *
 * Chapter text comes from remote novel sites through a scraping collaborator
 * that lives outside this crate. Only its interface is modeled here: the
 * metadata and chapter shapes this pipeline consumes as source documents,
 * and the failure taxonomy callers use to pick a backoff or skip policy.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata of a remote novel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteNovelMetadata {
    /// Novel title
    pub title: String,
    /// Author names
    pub authors: Vec<String>,
    /// Table of contents
    pub toc: Vec<TocItem>,
}

/// One table-of-contents entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocItem {
    /// Entry title (chapter or volume heading)
    pub title: String,
    /// Chapter id, absent for unlinked headings
    #[serde(default)]
    pub chapter_id: Option<String>,
    /// Creation timestamp if the site exposes one
    #[serde(default)]
    pub create_at: Option<DateTime<Utc>>,
}

/// One remote chapter, an ordered list of paragraphs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteChapter {
    /// Paragraph text in document order
    pub paragraphs: Vec<String>,
}

impl RemoteChapter {
    /// Consume the chapter as a source document for translation
    pub fn into_document(self) -> Vec<String> {
        self.paragraphs
    }
}

/// Failures the content collaborator distinguishes, so callers can apply
/// different backoff/skip policies per variant
#[derive(Error, Debug)]
pub enum FetchError {
    /// The source site throttled us
    #[error("Source site request frequency too high")]
    RateLimited,

    /// The source site refused access to the resource
    #[error("Current account cannot access this novel resource")]
    AccessDenied,

    /// Any other provider-side failure
    #[error("Provider failure: {0}")]
    Provider(String),
}

/// Interface of the remote content collaborator
#[async_trait]
pub trait NovelProvider: Send + Sync {
    /// Fetch novel metadata by id
    async fn get_metadata(&self, novel_id: &str) -> Result<RemoteNovelMetadata, FetchError>;

    /// Fetch a chapter by novel and chapter id
    async fn get_chapter(
        &self,
        novel_id: &str,
        chapter_id: &str,
    ) -> Result<RemoteChapter, FetchError>;
}
