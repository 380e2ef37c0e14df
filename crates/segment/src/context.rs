use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use deckseg_core::{Page, PageIndex};

use crate::cache::PageCache;
use crate::engine::SegmentationError;
use crate::oracle::SimilarityOracle;
use crate::result::StatsRecorder;
use crate::topic::TopicRefiner;
use crate::verdict::Verdict;

/// State shared by the first scan and every refinement branch of one run.
pub(crate) struct RunContext<'a> {
    pub cache: PageCache<'a>,
    pub oracle: &'a dyn SimilarityOracle,
    pub refiner: &'a dyn TopicRefiner,
    pub cancel: &'a CancellationToken,
    pub stats: StatsRecorder,
    /// Bounds in-flight oracle calls across all branches.
    pub oracle_permits: Semaphore,
    pub concurrency: usize,
    pub oracle_timeout: Duration,
    pub max_pages: usize,
    pub max_depth: u32,
}

impl RunContext<'_> {
    /// Run `fut` unless the run is cancelled first.
    pub async fn cancellable<T, F>(&self, fut: F) -> Result<T, SegmentationError>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SegmentationError::Cancelled),
            out = fut => Ok(out),
        }
    }

    pub async fn page(&self, index: PageIndex) -> Result<Arc<Page>, SegmentationError> {
        self.cancellable(self.cache.get(index))
            .await?
            .map_err(|source| SegmentationError::Provider {
                index: source.index(),
                source,
            })
    }

    pub async fn pages(&self, range: Range<PageIndex>) -> Result<Vec<Arc<Page>>, SegmentationError> {
        try_join_all(range.map(|i| self.page(i))).await
    }

    /// Verdict for the pair `(second - 1, second)`.
    ///
    /// Oracle errors and timeouts come back as `Unknown`; only provider failures
    /// and cancellation are errors.
    pub async fn judge_pair(&self, topic: &str, second: PageIndex) -> Result<Verdict, SegmentationError> {
        let (a, b) = tokio::try_join!(self.page(second - 1), self.page(second))?;

        let _permit = self
            .cancellable(self.oracle_permits.acquire())
            .await?
            .map_err(|_| SegmentationError::Cancelled)?;

        let call = tokio::time::timeout(self.oracle_timeout, self.oracle.compare(topic, &a, &b));
        let verdict = match self.cancellable(call).await? {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                warn!(page = second, error = %e, "oracle failed, treating pair as unknown");
                StatsRecorder::bump(&self.stats.oracle_failures);
                Verdict::Unknown
            }
            Err(_) => {
                warn!(page = second, timeout = ?self.oracle_timeout, "oracle timed out, treating pair as unknown");
                StatsRecorder::bump(&self.stats.oracle_timeouts);
                Verdict::Unknown
            }
        };

        StatsRecorder::bump(&self.stats.oracle_calls);
        if verdict == Verdict::Unknown {
            StatsRecorder::bump(&self.stats.unknown_verdicts);
        }
        debug!(page = second, %verdict, "pair judged");
        Ok(verdict)
    }

    pub async fn refine_topic(&self, parent: &str, pages: &[Arc<Page>]) -> Result<String, SegmentationError> {
        self.cancellable(self.refiner.refine(parent, pages)).await
    }
}
