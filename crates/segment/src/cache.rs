use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use deckseg_core::{Page, PageError, PageIndex};
use deckseg_pages::PageProvider;

/// Per-run page cache: each index is fetched from the provider at most once,
/// even when several scans ask for it concurrently.
pub struct PageCache<'a> {
    provider: &'a dyn PageProvider,
    slots: Vec<OnceCell<Arc<Page>>>,
    timeout: Duration,
    fetches: AtomicUsize,
}

impl<'a> PageCache<'a> {
    pub fn new(provider: &'a dyn PageProvider, page_count: usize, timeout: Duration) -> Self {
        Self {
            provider,
            slots: (0..page_count).map(|_| OnceCell::new()).collect(),
            timeout,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    /// Provider calls made so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub async fn get(&self, index: PageIndex) -> Result<Arc<Page>, PageError> {
        let slot = self.slots.get(index).ok_or(PageError::PageNotFound {
            index,
            page_count: self.slots.len(),
        })?;

        slot.get_or_try_init(|| self.fetch(index))
            .await
            .map(Arc::clone)
    }

    async fn fetch(&self, index: PageIndex) -> Result<Arc<Page>, PageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let page = tokio::time::timeout(self.timeout, self.provider.page(index))
            .await
            .map_err(|_| PageError::extraction(index, format!("timed out after {:?}", self.timeout)))??;

        if page.index != index {
            return Err(PageError::extraction(
                index,
                format!("provider returned page {} instead", page.index),
            ));
        }
        Ok(Arc::new(page))
    }
}
