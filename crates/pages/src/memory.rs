use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use deckseg_core::{ImageRef, Page, PageError, PageIndex};

use crate::provider::PageProvider;

/// Pages held in memory, for pre-extracted text and tests.
pub struct InMemoryPages {
    pages: Vec<Page>,
    fetches: AtomicUsize,
    releases: AtomicUsize,
}

impl InMemoryPages {
    pub fn new(pages: Vec<(String, Vec<ImageRef>)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .enumerate()
                .map(|(index, (text, images))| Page::new(index, text, images))
                .collect(),
            fetches: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    /// Text-only pages, one per input string.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| (t.into(), Vec::new())).collect())
    }

    /// How many times `page()` was called.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// How many times `release_resources()` was called.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageProvider for InMemoryPages {
    async fn page(&self, index: PageIndex) -> Result<Page, PageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(index)
            .cloned()
            .ok_or(PageError::PageNotFound {
                index,
                page_count: self.pages.len(),
            })
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn release_resources(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
