use async_trait::async_trait;
use thiserror::Error;

use deckseg_core::Page;

use crate::verdict::Verdict;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The inference call could not be completed, retries included.
    #[error("similarity oracle unavailable: {0}")]
    Unavailable(String),
}

/// Judges whether two adjacent pages belong to the same micro-topic.
///
/// `topic` describes the scope the pages are judged under: the document topic on
/// the first pass, a narrower sub-topic while refining an oversized segment.
/// Image references are passed through untouched; what the oracle does with them
/// (OCR, vision model, nothing) is its own business.
#[async_trait]
pub trait SimilarityOracle: Send + Sync {
    async fn compare(&self, topic: &str, a: &Page, b: &Page) -> Result<Verdict, OracleError>;
}
