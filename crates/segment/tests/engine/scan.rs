use deckseg_core::PageIndex;
use deckseg_segment::{Boundary, Verdict};

use crate::helpers::{deck, engine, ScriptedOracle, TOPIC};

#[tokio::test]
async fn single_page_document_needs_no_oracle() {
    let pages = deck(1);
    let oracle = ScriptedOracle::constant(Verdict::Different);

    let result = engine().segment(1, &pages, &oracle, TOPIC, 10).await.unwrap();

    assert_eq!(result.ranges(), vec![0..1]);
    assert_eq!(result.segments[0].opened_by, Boundary::DocumentStart);
    assert_eq!(oracle.calls(), 0);
    assert_eq!(pages.releases(), 1);
}

#[tokio::test]
async fn all_same_is_one_segment() {
    let pages = deck(5);
    let oracle = ScriptedOracle::constant(Verdict::Same);

    let result = engine().segment(5, &pages, &oracle, TOPIC, 10).await.unwrap();

    assert_eq!(result.ranges(), vec![0..5]);
    assert_eq!(result.low_confidence().count(), 0);
    assert_eq!(oracle.calls(), 4);
    assert_eq!(result.stats.oracle_calls, 4);
}

#[tokio::test]
async fn all_different_is_one_segment_per_page() {
    let pages = deck(5);
    let oracle = ScriptedOracle::constant(Verdict::Different);

    let result = engine().segment(5, &pages, &oracle, TOPIC, 10).await.unwrap();

    assert_eq!(result.ranges(), vec![0..1, 1..2, 2..3, 3..4, 4..5]);
    assert!(result.segments[1..]
        .iter()
        .all(|s| s.opened_by == Boundary::Confident));
}

#[tokio::test]
async fn scan_fetches_each_page_once_and_calls_oracle_per_pair() {
    let pages = deck(7);
    let oracle = ScriptedOracle::pattern(vec![
        Verdict::Same,
        Verdict::Different,
        Verdict::Same,
        Verdict::Same,
        Verdict::Different,
        Verdict::Same,
    ]);

    let result = engine().segment(7, &pages, &oracle, TOPIC, 10).await.unwrap();

    assert_eq!(result.ranges(), vec![0..2, 2..5, 5..7]);
    assert_eq!(oracle.calls(), 6);
    assert_eq!(pages.fetches(), 7);
    assert_eq!(result.stats.page_fetches, 7);
}

#[tokio::test]
async fn unknown_verdict_splits_and_flags_low_confidence() {
    let pages = deck(4);
    let oracle = ScriptedOracle::pattern(vec![Verdict::Same, Verdict::Unknown, Verdict::Same]);

    let result = engine().segment(4, &pages, &oracle, TOPIC, 10).await.unwrap();

    assert_eq!(result.ranges(), vec![0..2, 2..4]);
    assert_eq!(result.segments[1].opened_by, Boundary::Ambiguous);
    assert!(result.segments.iter().all(|s| s.is_low_confidence()));
    assert_eq!(result.stats.unknown_verdicts, 1);
    assert_eq!(pages.releases(), 1);
}

/// Every verdict pattern over small decks yields an exact, ordered cover.
#[tokio::test]
async fn every_verdict_pattern_covers_the_document() {
    const VERDICTS: [Verdict; 3] = [Verdict::Same, Verdict::Different, Verdict::Unknown];

    for page_count in 1..=6usize {
        let pairs = page_count - 1;
        for code in 0..3usize.pow(pairs as u32) {
            let pattern: Vec<Verdict> = (0..pairs)
                .map(|k| VERDICTS[(code / 3usize.pow(k as u32)) % 3])
                .collect();
            let expected_segments = 1 + pattern.iter().filter(|v| **v != Verdict::Same).count();

            let pages = deck(page_count);
            let oracle = ScriptedOracle::pattern(pattern.clone());
            let result = engine()
                .segment(page_count, &pages, &oracle, TOPIC, page_count)
                .await
                .unwrap();

            assert!(result.check_cover().is_ok(), "pattern {pattern:?}");
            assert_eq!(result.segments.len(), expected_segments, "pattern {pattern:?}");
            let covered: Vec<PageIndex> = result.segments.iter().flat_map(|s| s.range()).collect();
            assert_eq!(covered, (0..page_count).collect::<Vec<_>>());
        }
    }
}

#[tokio::test]
async fn result_serializes_for_reporting() {
    let pages = deck(3);
    let oracle = ScriptedOracle::pattern(vec![Verdict::Unknown, Verdict::Same]);

    let result = engine().segment(3, &pages, &oracle, TOPIC, 10).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["page_count"], 3);
    assert_eq!(json["segments"][1]["opened_by"], "ambiguous");
    assert_eq!(json["segments"][0]["uncertain_boundaries"], 1);
}
