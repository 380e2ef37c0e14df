use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use deckseg_core::{Page, PageError, PageIndex};
use deckseg_pages::{InMemoryPages, PageProvider};
use deckseg_segment::{EngineOptions, OracleError, SegmentationEngine, SimilarityOracle, Verdict};

pub const TOPIC: &str = "Intro to sorting algorithms";

type Script = dyn Fn(&str, PageIndex) -> Result<Verdict, OracleError> + Send + Sync;

/// Oracle answering from a closure of `(topic, index of the second page)`.
pub struct ScriptedOracle {
    script: Box<Script>,
    delay: Option<Box<dyn Fn(PageIndex) -> Duration + Send + Sync>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(
        script: impl Fn(&str, PageIndex) -> Result<Verdict, OracleError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Same verdict for every pair.
    pub fn constant(verdict: Verdict) -> Self {
        Self::new(move |_, _| Ok(verdict))
    }

    /// Verdict `pattern[i - 1]` for pair `(i - 1, i)`, regardless of topic.
    pub fn pattern(pattern: Vec<Verdict>) -> Self {
        Self::new(move |_, second| Ok(pattern[second - 1]))
    }

    pub fn with_delay(mut self, delay: impl Fn(PageIndex) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimilarityOracle for ScriptedOracle {
    async fn compare(&self, topic: &str, a: &Page, b: &Page) -> Result<Verdict, OracleError> {
        assert_eq!(b.index, a.index + 1, "oracle only ever sees adjacent pages");
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(b.index)).await;
        }
        (self.script)(topic, b.index)
    }
}

/// In-memory deck of `n` text pages.
pub fn deck(n: usize) -> InMemoryPages {
    InMemoryPages::from_texts((0..n).map(|i| format!("slide {i}")))
}

/// Provider failing with an extraction error at one index.
pub struct BrokenPage {
    pub inner: InMemoryPages,
    pub broken: PageIndex,
}

#[async_trait]
impl PageProvider for BrokenPage {
    async fn page(&self, index: PageIndex) -> Result<Page, PageError> {
        if index == self.broken {
            return Err(PageError::extraction(index, "corrupt content stream"));
        }
        self.inner.page(index).await
    }

    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    async fn release_resources(&self) {
        self.inner.release_resources().await
    }
}

pub fn engine() -> SegmentationEngine {
    SegmentationEngine::new(EngineOptions {
        max_depth: 3,
        concurrency: 1,
        oracle_timeout: Duration::from_secs(5),
        provider_timeout: Duration::from_secs(5),
    })
}

pub fn concurrent_engine(concurrency: usize) -> SegmentationEngine {
    SegmentationEngine::new(EngineOptions {
        concurrency,
        ..engine().options().clone()
    })
}
