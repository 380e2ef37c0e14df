use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use deckseg_core::Page;
use deckseg_segment::{OracleError, ScopedTopic, SimilarityOracle, Verdict};

use crate::helpers::{concurrent_engine, deck, engine, ScriptedOracle, TOPIC};

fn pattern() -> Vec<Verdict> {
    use Verdict::{Different as D, Same as S, Unknown as U};
    vec![S, S, D, S, U, S, S, S, D, S, S]
}

#[tokio::test]
async fn parallel_scan_matches_sequential_scan() {
    let sequential = {
        let pages = deck(12);
        let oracle = ScriptedOracle::pattern(pattern());
        engine().segment(12, &pages, &oracle, TOPIC, 12).await.unwrap()
    };

    // Later pairs answer first.
    let pages = deck(12);
    let oracle = ScriptedOracle::pattern(pattern())
        .with_delay(|second| Duration::from_millis(5 * (12 - second as u64)));
    let parallel = concurrent_engine(4)
        .segment(12, &pages, &oracle, TOPIC, 12)
        .await
        .unwrap();

    assert_eq!(parallel.ranges(), sequential.ranges());
    assert_eq!(parallel.segments, sequential.segments);
    assert_eq!(pages.fetches(), 12);
}

#[tokio::test]
async fn concurrent_refinement_keeps_order_and_fetches_once() {
    // First pass: two big blocks; refined topic cuts each in half.
    let pages = deck(12);
    let oracle = ScriptedOracle::new(|topic, second| {
        let refined = topic != TOPIC;
        Ok(match second {
            6 => Verdict::Different,
            3 | 9 if refined => Verdict::Different,
            _ => Verdict::Same,
        })
    })
    .with_delay(|second| Duration::from_millis(if second < 6 { 20 } else { 1 }));
    let engine = concurrent_engine(3).with_topic_refiner(Arc::new(ScopedTopic));

    let result = engine.segment(12, &pages, &oracle, TOPIC, 3).await.unwrap();

    assert_eq!(result.ranges(), vec![0..3, 3..6, 6..9, 9..12]);
    assert_eq!(pages.fetches(), 12);
    assert_eq!(result.stats.refined_segments, 2);
}

/// Oracle recording the highest number of overlapping calls.
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl SimilarityOracle for InFlight {
    async fn compare(&self, _topic: &str, _a: &Page, _b: &Page) -> Result<Verdict, OracleError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(Verdict::Different)
    }
}

#[tokio::test]
async fn oracle_calls_respect_concurrency_bound() {
    let pages = deck(20);
    let oracle = InFlight {
        current: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    };

    let result = concurrent_engine(3)
        .segment(20, &pages, &oracle, TOPIC, 20)
        .await
        .unwrap();

    assert_eq!(result.segments.len(), 20);
    let peak = oracle.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight {peak}");
    assert!(peak >= 1);
}
