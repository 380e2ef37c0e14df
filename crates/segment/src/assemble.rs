use crate::result::{Segment, SegmentationResult, SegmentationStats};

/// Fold per-boundary confidence into per-segment counts and package the result.
///
/// A segment's `uncertain_boundaries` counts ambiguous boundaries at its start
/// and at its end (the next segment's opening boundary).
pub(crate) fn assemble(
    page_count: usize,
    segments: Vec<Segment>,
    stats: SegmentationStats,
) -> SegmentationResult {
    let closing: Vec<bool> = segments
        .iter()
        .skip(1)
        .map(|s| s.opened_by.is_ambiguous())
        .chain(std::iter::once(false))
        .collect();

    let segments = segments
        .into_iter()
        .zip(closing)
        .map(|(segment, closed_ambiguously)| {
            let uncertain = u32::from(segment.opened_by.is_ambiguous()) + u32::from(closed_ambiguously);
            Segment {
                uncertain_boundaries: uncertain,
                ..segment
            }
        })
        .collect();

    SegmentationResult {
        page_count,
        segments,
        stats,
    }
}
