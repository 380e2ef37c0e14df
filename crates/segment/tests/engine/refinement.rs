use std::sync::Arc;

use deckseg_segment::{
    Boundary, EngineOptions, Irreducible, ScopedTopic, SegmentationEngine, Verdict,
};

use crate::helpers::{deck, engine, ScriptedOracle, TOPIC};

/// Oracle that sees one topic on the first pass and splits under any narrower one.
fn split_under_subtopic(cut_before: Vec<usize>) -> ScriptedOracle {
    ScriptedOracle::new(move |topic, second| {
        if topic != TOPIC && cut_before.contains(&second) {
            Ok(Verdict::Different)
        } else {
            Ok(Verdict::Same)
        }
    })
}

#[tokio::test]
async fn oversized_segment_is_split_under_narrower_topic() {
    let pages = deck(6);
    let oracle = split_under_subtopic(vec![3]);
    let engine = engine().with_topic_refiner(Arc::new(ScopedTopic));

    let result = engine.segment(6, &pages, &oracle, TOPIC, 3).await.unwrap();

    assert_eq!(result.ranges(), vec![0..3, 3..6]);
    assert_eq!(result.segments[0].opened_by, Boundary::DocumentStart);
    assert_eq!(result.segments[1].opened_by, Boundary::Confident);
    assert!(result.segments.iter().all(|s| s.depth == 1));
    assert!(result.segments.iter().all(|s| s.topic.contains("pages 1-6")));
    assert_eq!(result.irreducible().count(), 0);
    assert_eq!(result.stats.refined_segments, 1);
    // 5 pairs on the first pass, 5 more inside the refined segment.
    assert_eq!(oracle.calls(), 10);
    // Refinement reuses cached pages.
    assert_eq!(pages.fetches(), 6);
}

#[tokio::test]
async fn unified_segment_is_irreducible_not_looping() {
    let pages = deck(4);
    let oracle = ScriptedOracle::constant(Verdict::Same);

    let result = engine().segment(4, &pages, &oracle, TOPIC, 2).await.unwrap();

    assert_eq!(result.ranges(), vec![0..4]);
    assert_eq!(result.segments[0].irreducible, Some(Irreducible::Unified));
    assert_eq!(result.segments[0].depth, 0);
    assert_eq!(oracle.calls(), 6);
    assert_eq!(pages.releases(), 1);
}

#[tokio::test]
async fn recursion_continues_on_still_oversized_parts() {
    // First pass: one block. Depth 1 cuts before page 6. Depth 2 cuts before 3.
    let pages = deck(8);
    let oracle = ScriptedOracle::new(|topic, second| {
        let depth = topic.matches("Focus:").count();
        let cut = match depth {
            1 => second == 6,
            2 => second == 3,
            _ => false,
        };
        Ok(if cut { Verdict::Different } else { Verdict::Same })
    });
    let engine = engine().with_topic_refiner(Arc::new(ScopedTopic));

    let result = engine.segment(8, &pages, &oracle, TOPIC, 3).await.unwrap();

    assert_eq!(result.ranges(), vec![0..3, 3..6, 6..8]);
    assert_eq!(result.segments[0].depth, 2);
    assert_eq!(result.segments[1].depth, 2);
    assert_eq!(result.segments[2].depth, 1);
    assert_eq!(result.stats.refined_segments, 2);
}

#[tokio::test]
async fn depth_limit_keeps_segment_whole() {
    let pages = deck(5);
    let oracle = split_under_subtopic(vec![2]);
    let engine = SegmentationEngine::new(EngineOptions {
        max_depth: 0,
        ..engine().options().clone()
    })
    .with_topic_refiner(Arc::new(ScopedTopic));

    let result = engine.segment(5, &pages, &oracle, TOPIC, 2).await.unwrap();

    assert_eq!(result.ranges(), vec![0..5]);
    assert_eq!(result.segments[0].irreducible, Some(Irreducible::DepthLimit));
    assert_eq!(oracle.calls(), 4, "no inner scan past the depth bound");
}

#[tokio::test]
async fn small_segments_are_left_alone() {
    let pages = deck(6);
    let oracle = ScriptedOracle::pattern(vec![
        Verdict::Same,
        Verdict::Different,
        Verdict::Same,
        Verdict::Different,
        Verdict::Same,
    ]);

    let result = engine().segment(6, &pages, &oracle, TOPIC, 2).await.unwrap();

    assert_eq!(result.ranges(), vec![0..2, 2..4, 4..6]);
    assert_eq!(oracle.calls(), 5);
    assert!(result.segments.iter().all(|s| s.depth == 0 && s.irreducible.is_none()));
}

#[tokio::test]
async fn ambiguous_cut_inside_refinement_is_flagged() {
    let pages = deck(6);
    let oracle = ScriptedOracle::new(|topic, second| {
        if topic != TOPIC && second == 4 {
            Ok(Verdict::Unknown)
        } else {
            Ok(Verdict::Same)
        }
    });
    let engine = engine().with_topic_refiner(Arc::new(ScopedTopic));

    let result = engine.segment(6, &pages, &oracle, TOPIC, 4).await.unwrap();

    assert_eq!(result.ranges(), vec![0..4, 4..6]);
    assert_eq!(result.segments[1].opened_by, Boundary::Ambiguous);
    assert_eq!(result.low_confidence().count(), 2);
}

#[tokio::test]
async fn every_segment_fits_or_is_irreducible() {
    for max_pages in 1..=4 {
        for page_count in 1..=9 {
            let pages = deck(page_count);
            // Pseudo-random but deterministic per (topic, pair).
            let oracle = ScriptedOracle::new(|topic, second| {
                let salt = topic.len();
                Ok(match (second * 7 + salt) % 5 {
                    0 => Verdict::Different,
                    1 => Verdict::Unknown,
                    _ => Verdict::Same,
                })
            });
            let engine = engine().with_topic_refiner(Arc::new(ScopedTopic));

            let result = engine
                .segment(page_count, &pages, &oracle, TOPIC, max_pages)
                .await
                .unwrap();

            assert!(result.check_cover().is_ok());
            for segment in &result.segments {
                assert!(
                    segment.len() <= max_pages || segment.irreducible.is_some(),
                    "{segment:?} exceeds {max_pages} without being irreducible"
                );
            }
        }
    }
}
