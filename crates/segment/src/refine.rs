//! Recursive refinement of oversized segments.
//!
//! A segment longer than the page threshold is re-scanned under a narrower topic
//! and replaced by whatever sub-segments that scan produces. Two things stop the
//! recursion on a branch: the depth bound, and an inner scan that hands back the
//! segment unchanged (the oracle keeps calling it one topic). Either way the
//! segment is kept whole and flagged irreducible.

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, info};

use crate::context::RunContext;
use crate::engine::SegmentationError;
use crate::result::{Irreducible, Segment, StatsRecorder};
use crate::scan::scan_range;

/// Refine every segment; branches run concurrently and are joined in order.
pub(crate) fn refine_all<'a>(
    ctx: &'a RunContext<'a>,
    segments: Vec<Segment>,
) -> BoxFuture<'a, Result<Vec<Segment>, SegmentationError>> {
    async move {
        let branches = segments.into_iter().map(|segment| refine_segment(ctx, segment));
        let refined = try_join_all(branches).await?;
        Ok(refined.into_iter().flatten().collect())
    }
    .boxed()
}

fn refine_segment<'a>(
    ctx: &'a RunContext<'a>,
    segment: Segment,
) -> BoxFuture<'a, Result<Vec<Segment>, SegmentationError>> {
    async move {
        if segment.len() <= ctx.max_pages {
            return Ok(vec![segment]);
        }

        if segment.depth >= ctx.max_depth {
            info!(
                start = segment.start,
                end = segment.end,
                depth = segment.depth,
                "depth limit reached, keeping oversized segment"
            );
            return Ok(vec![segment.into_irreducible(Irreducible::DepthLimit)]);
        }

        let pages = ctx.pages(segment.range()).await?;
        let topic = ctx.refine_topic(&segment.topic, &pages).await?;
        debug!(start = segment.start, end = segment.end, %topic, "refining");

        let inner = scan_range(
            ctx,
            &topic,
            segment.range(),
            segment.opened_by,
            segment.depth + 1,
        )
        .await?;

        if inner.len() == 1 {
            info!(
                start = segment.start,
                end = segment.end,
                depth = segment.depth,
                "segment judged unified under narrower topic, keeping it whole"
            );
            return Ok(vec![segment.into_irreducible(Irreducible::Unified)]);
        }

        info!(
            start = segment.start,
            end = segment.end,
            parts = inner.len(),
            "split oversized segment"
        );
        StatsRecorder::bump(&ctx.stats.refined_segments);
        refine_all(ctx, inner).await
    }
    .boxed()
}
