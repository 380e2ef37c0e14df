use async_trait::async_trait;

use deckseg_core::{Page, PageError, PageIndex};

/// Source of page content for one segmentation run.
#[async_trait]
pub trait PageProvider: Send + Sync {
    /// Fetch text and image references for a zero-based page index.
    async fn page(&self, index: PageIndex) -> Result<Page, PageError>;

    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Delete temporary artifacts (split files, extracted images) created for this run.
    async fn release_resources(&self);
}
