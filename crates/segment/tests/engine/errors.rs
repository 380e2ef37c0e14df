use std::time::Duration;

use deckseg_core::PageError;
use deckseg_segment::{
    CancellationToken, EngineOptions, OracleError, SegmentationEngine, SegmentationError, Verdict,
};

use crate::helpers::{deck, engine, BrokenPage, ScriptedOracle, TOPIC};

#[tokio::test]
async fn provider_failure_aborts_with_page_index_and_releases() {
    let pages = BrokenPage {
        inner: deck(5),
        broken: 2,
    };
    let oracle = ScriptedOracle::constant(Verdict::Same);

    let err = engine()
        .segment(5, &pages, &oracle, TOPIC, 10)
        .await
        .unwrap_err();

    assert_eq!(err.page_index(), Some(2));
    assert!(matches!(
        err,
        SegmentationError::Provider {
            source: PageError::Extraction { index: 2, .. },
            ..
        }
    ));
    assert!(err.to_string().contains("page 2"));
    assert_eq!(pages.inner.releases(), 1);
}

#[tokio::test]
async fn page_count_beyond_document_is_page_not_found() {
    let pages = deck(3);
    let oracle = ScriptedOracle::constant(Verdict::Same);

    let err = engine().segment(4, &pages, &oracle, TOPIC, 10).await.unwrap_err();

    assert_eq!(err.page_index(), Some(3));
    assert!(matches!(
        err,
        SegmentationError::Provider {
            source: PageError::PageNotFound { .. },
            ..
        }
    ));
    assert_eq!(pages.releases(), 1);
}

#[tokio::test]
async fn oracle_unavailable_degrades_to_unknown() {
    let pages = deck(4);
    let oracle = ScriptedOracle::new(|_, second| {
        if second == 2 {
            Err(OracleError::Unavailable("connection refused".into()))
        } else {
            Ok(Verdict::Same)
        }
    });

    let result = engine().segment(4, &pages, &oracle, TOPIC, 10).await.unwrap();

    assert_eq!(result.ranges(), vec![0..2, 2..4]);
    assert_eq!(result.stats.oracle_failures, 1);
    assert_eq!(result.stats.unknown_verdicts, 1);
    assert_eq!(result.low_confidence().count(), 2);
}

#[tokio::test]
async fn oracle_timeout_degrades_to_unknown() {
    let pages = deck(4);
    let oracle = ScriptedOracle::constant(Verdict::Same).with_delay(|second| {
        if second == 3 {
            Duration::from_millis(500)
        } else {
            Duration::ZERO
        }
    });
    let engine = SegmentationEngine::new(EngineOptions {
        oracle_timeout: Duration::from_millis(50),
        ..engine().options().clone()
    });

    let result = engine.segment(4, &pages, &oracle, TOPIC, 10).await.unwrap();

    assert_eq!(result.ranges(), vec![0..3, 3..4]);
    assert_eq!(result.stats.oracle_timeouts, 1);
    assert!(result.segments[1].is_low_confidence());
}

#[tokio::test]
async fn invalid_input_still_releases_provider() {
    let pages = deck(3);
    let oracle = ScriptedOracle::constant(Verdict::Same);

    let err = engine().segment(0, &pages, &oracle, TOPIC, 10).await.unwrap_err();
    assert!(matches!(err, SegmentationError::InvalidInput(_)));

    let err = engine().segment(3, &pages, &oracle, TOPIC, 0).await.unwrap_err();
    assert!(matches!(err, SegmentationError::InvalidInput(_)));

    assert_eq!(pages.releases(), 2);
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn cancelled_before_start_does_no_work() {
    let pages = deck(5);
    let oracle = ScriptedOracle::constant(Verdict::Same);
    let engine = engine();
    engine.cancellation_token().cancel();

    let err = engine.segment(5, &pages, &oracle, TOPIC, 10).await.unwrap_err();

    assert!(matches!(err, SegmentationError::Cancelled));
    assert_eq!(oracle.calls(), 0);
    assert_eq!(pages.fetches(), 0);
    assert_eq!(pages.releases(), 1);
}

#[tokio::test]
async fn cancellation_mid_scan_aborts_cleanly() {
    let pages = deck(6);
    let token = CancellationToken::new();
    let trigger = token.clone();
    let oracle = ScriptedOracle::new(move |_, second| {
        if second == 2 {
            trigger.cancel();
        }
        Ok(Verdict::Same)
    });
    let engine = engine().with_cancellation(token);

    let err = engine.segment(6, &pages, &oracle, TOPIC, 10).await.unwrap_err();

    assert!(matches!(err, SegmentationError::Cancelled));
    assert_eq!(oracle.calls(), 2);
    assert_eq!(pages.releases(), 1);
}

#[tokio::test]
async fn cancellation_interrupts_a_hung_oracle() {
    let pages = deck(3);
    let oracle = ScriptedOracle::constant(Verdict::Same)
        .with_delay(|_| Duration::from_secs(3600));
    let engine = SegmentationEngine::new(EngineOptions {
        oracle_timeout: Duration::from_secs(3600),
        ..engine().options().clone()
    });
    let token = engine.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let started = std::time::Instant::now();
    let err = engine.segment(3, &pages, &oracle, TOPIC, 10).await.unwrap_err();

    assert!(matches!(err, SegmentationError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(pages.releases(), 1);
}
