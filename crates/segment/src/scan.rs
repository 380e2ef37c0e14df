use std::ops::Range;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::debug;

use deckseg_core::PageIndex;

use crate::context::RunContext;
use crate::engine::SegmentationError;
use crate::result::Segment;
use crate::verdict::{Boundary, Verdict};

/// Left-to-right boundary scan over `range` under `topic`.
///
/// Pair verdicts may be computed concurrently, but `buffered` yields them in page
/// order, so the cut points never depend on which call finished first.
pub(crate) async fn scan_range(
    ctx: &RunContext<'_>,
    topic: &str,
    range: Range<PageIndex>,
    first: Boundary,
    depth: u32,
) -> Result<Vec<Segment>, SegmentationError> {
    debug!(start = range.start, end = range.end, depth, "scanning");

    let verdicts: Vec<Verdict> = stream::iter(range.start + 1..range.end)
        .map(|second| ctx.judge_pair(topic, second))
        .buffered(ctx.concurrency)
        .try_collect()
        .await?;

    Ok(split_at_verdicts(range, &verdicts, first, depth, topic))
}

/// Cut `range` wherever the verdict for `(i - 1, i)` opens a boundary.
///
/// `verdicts[k]` is the verdict for the pair ending at `range.start + 1 + k`.
pub(crate) fn split_at_verdicts(
    range: Range<PageIndex>,
    verdicts: &[Verdict],
    first: Boundary,
    depth: u32,
    topic: &str,
) -> Vec<Segment> {
    debug_assert_eq!(verdicts.len(), range.len().saturating_sub(1));

    let mut segments = Vec::new();
    let mut open_start = range.start;
    let mut opened_by = first;

    for (offset, verdict) in verdicts.iter().enumerate() {
        let page = range.start + 1 + offset;
        if let Some(boundary) = verdict.boundary() {
            segments.push(Segment::new(open_start..page, opened_by, depth, topic));
            open_start = page;
            opened_by = boundary;
        }
    }
    segments.push(Segment::new(open_start..range.end, opened_by, depth, topic));

    segments
}
