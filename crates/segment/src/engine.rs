use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use deckseg_core::config::SegmentationConfig;
use deckseg_core::{PageError, PageIndex};
use deckseg_pages::PageProvider;

use crate::assemble::assemble;
use crate::cache::PageCache;
use crate::context::RunContext;
use crate::oracle::SimilarityOracle;
use crate::refine::refine_all;
use crate::result::{SegmentationResult, StatsRecorder};
use crate::scan::scan_range;
use crate::topic::{InheritTopic, TopicRefiner};
use crate::verdict::Boundary;

#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("aborted at page {index}: {source}")]
    Provider {
        index: PageIndex,
        #[source]
        source: PageError,
    },

    #[error("segmentation cancelled")]
    Cancelled,

    #[error("segmentation produced an inconsistent result: {0}")]
    Invariant(String),
}

impl SegmentationError {
    /// Page index the run aborted at, when the abort came from a page.
    pub fn page_index(&self) -> Option<PageIndex> {
        match self {
            SegmentationError::Provider { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_depth: u32,
    pub concurrency: usize,
    pub oracle_timeout: Duration,
    pub provider_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&SegmentationConfig::default())
    }
}

impl From<&SegmentationConfig> for EngineOptions {
    fn from(config: &SegmentationConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            concurrency: config.concurrency.max(1),
            oracle_timeout: config.oracle_timeout(),
            provider_timeout: config.provider_timeout(),
        }
    }
}

/// Splits a document into micro-topic segments using a pairwise similarity oracle.
pub struct SegmentationEngine {
    options: EngineOptions,
    refiner: Arc<dyn TopicRefiner>,
    cancel: CancellationToken,
}

impl SegmentationEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options: EngineOptions {
                concurrency: options.concurrency.max(1),
                ..options
            },
            refiner: Arc::new(InheritTopic),
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::new(EngineOptions::from(config))
    }

    /// How refinement derives the narrower topic for an oversized segment.
    pub fn with_topic_refiner(mut self, refiner: Arc<dyn TopicRefiner>) -> Self {
        self.refiner = refiner;
        self
    }

    /// Tie runs to an external token (e.g. one cancelled on Ctrl-C).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that aborts in-flight and future runs of this engine when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Segment pages `[0, page_count)`.
    ///
    /// Returns either a complete result covering every page or an error; never a
    /// partial segmentation. `provider.release_resources()` is called exactly once
    /// before returning, whatever the outcome.
    pub async fn segment(
        &self,
        page_count: usize,
        provider: &dyn PageProvider,
        oracle: &dyn SimilarityOracle,
        topic: &str,
        max_pages_per_segment: usize,
    ) -> Result<SegmentationResult, SegmentationError> {
        let outcome = self
            .run(page_count, provider, oracle, topic, max_pages_per_segment)
            .await;

        provider.release_resources().await;

        match &outcome {
            Ok(result) => info!(
                pages = result.page_count,
                segments = result.segments.len(),
                low_confidence = result.low_confidence().count(),
                irreducible = result.irreducible().count(),
                oracle_calls = result.stats.oracle_calls,
                "segmentation complete"
            ),
            Err(e) => warn!(error = %e, "segmentation aborted"),
        }
        outcome
    }

    async fn run(
        &self,
        page_count: usize,
        provider: &dyn PageProvider,
        oracle: &dyn SimilarityOracle,
        topic: &str,
        max_pages_per_segment: usize,
    ) -> Result<SegmentationResult, SegmentationError> {
        if page_count == 0 {
            return Err(SegmentationError::InvalidInput(
                "document has no pages".to_string(),
            ));
        }
        if max_pages_per_segment == 0 {
            return Err(SegmentationError::InvalidInput(
                "max pages per segment must be at least 1".to_string(),
            ));
        }
        if self.cancel.is_cancelled() {
            return Err(SegmentationError::Cancelled);
        }

        let ctx = RunContext {
            cache: PageCache::new(provider, page_count, self.options.provider_timeout),
            oracle,
            refiner: self.refiner.as_ref(),
            cancel: &self.cancel,
            stats: StatsRecorder::default(),
            oracle_permits: Semaphore::new(self.options.concurrency),
            concurrency: self.options.concurrency,
            oracle_timeout: self.options.oracle_timeout,
            max_pages: max_pages_per_segment,
            max_depth: self.options.max_depth,
        };

        info!(pages = page_count, max_pages_per_segment, "starting boundary scan");
        let initial = scan_range(&ctx, topic, 0..page_count, Boundary::DocumentStart, 0).await?;
        info!(segments = initial.len(), "boundary scan done, refining");

        let refined = refine_all(&ctx, initial).await?;

        let result = assemble(page_count, refined, ctx.stats.snapshot(ctx.cache.fetches()));
        result
            .check_cover()
            .map_err(SegmentationError::Invariant)?;
        Ok(result)
    }
}

impl Default for SegmentationEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}
