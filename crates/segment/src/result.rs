use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use deckseg_core::PageIndex;

use crate::verdict::Boundary;

/// Why an over-threshold segment was left whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Irreducible {
    /// Re-scanned under a narrower topic, every pair still came back `Same`.
    Unified,
    /// Refinement depth bound reached.
    DepthLimit,
}

/// A contiguous run of pages `[start, end)` judged to share one micro-topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: PageIndex,
    pub end: PageIndex,
    /// Boundary that opened this segment.
    pub opened_by: Boundary,
    /// 0 for the first scan, +1 per refinement level.
    pub depth: u32,
    pub irreducible: Option<Irreducible>,
    /// Ambiguous boundaries at either edge; filled in by assembly.
    pub uncertain_boundaries: u32,
    /// Topic the pages were judged under.
    pub topic: String,
}

impl Segment {
    pub fn new(range: Range<PageIndex>, opened_by: Boundary, depth: u32, topic: &str) -> Self {
        debug_assert!(range.start < range.end, "segments are never empty");
        Self {
            start: range.start,
            end: range.end,
            opened_by,
            depth,
            irreducible: None,
            uncertain_boundaries: 0,
            topic: topic.to_string(),
        }
    }

    pub fn range(&self) -> Range<PageIndex> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn is_low_confidence(&self) -> bool {
        self.uncertain_boundaries > 0
    }

    /// Same pages, flagged irreducible.
    pub(crate) fn into_irreducible(self, reason: Irreducible) -> Self {
        Self {
            irreducible: Some(reason),
            ..self
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationStats {
    pub oracle_calls: usize,
    pub unknown_verdicts: usize,
    /// Oracle calls that errored and were read as `Unknown`.
    pub oracle_failures: usize,
    /// Oracle calls that timed out and were read as `Unknown`.
    pub oracle_timeouts: usize,
    pub page_fetches: usize,
    /// Segments replaced by sub-segments during refinement.
    pub refined_segments: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    pub oracle_calls: AtomicUsize,
    pub unknown_verdicts: AtomicUsize,
    pub oracle_failures: AtomicUsize,
    pub oracle_timeouts: AtomicUsize,
    pub refined_segments: AtomicUsize,
}

impl StatsRecorder {
    pub fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, page_fetches: usize) -> SegmentationStats {
        SegmentationStats {
            oracle_calls: self.oracle_calls.load(Ordering::Relaxed),
            unknown_verdicts: self.unknown_verdicts.load(Ordering::Relaxed),
            oracle_failures: self.oracle_failures.load(Ordering::Relaxed),
            oracle_timeouts: self.oracle_timeouts.load(Ordering::Relaxed),
            page_fetches,
            refined_segments: self.refined_segments.load(Ordering::Relaxed),
        }
    }
}

/// Ordered, gap-free partition of `[0, page_count)` into segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub page_count: usize,
    pub segments: Vec<Segment>,
    pub stats: SegmentationStats,
}

impl SegmentationResult {
    /// Page ranges only, handy for comparisons.
    pub fn ranges(&self) -> Vec<Range<PageIndex>> {
        self.segments.iter().map(Segment::range).collect()
    }

    /// Segments touching at least one ambiguous boundary, for manual review.
    pub fn low_confidence(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_low_confidence())
    }

    pub fn irreducible(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.irreducible.is_some())
    }

    /// Verify the segments are non-empty, in order, and cover `[0, page_count)` exactly.
    pub fn check_cover(&self) -> Result<(), String> {
        let mut next = 0;
        for segment in &self.segments {
            if segment.start != next {
                return Err(format!(
                    "segment {}..{} does not start at expected page {}",
                    segment.start, segment.end, next
                ));
            }
            if segment.is_empty() {
                return Err(format!("empty segment at page {}", segment.start));
            }
            next = segment.end;
        }
        if next != self.page_count {
            return Err(format!(
                "segments end at page {next}, document has {} pages",
                self.page_count
            ));
        }
        Ok(())
    }
}
