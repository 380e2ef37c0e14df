//! Micro-topic segmentation of paginated documents.
//!
//! [`SegmentationEngine::segment`] walks the pages left to right, asks a
//! [`SimilarityOracle`] whether each adjacent pair shares a micro-topic, cuts
//! where it does not, and then re-scans any segment longer than the page
//! threshold under a narrower topic until every segment fits or is irreducible.

mod assemble;
mod cache;
mod context;
pub mod engine;
pub mod oracle;
mod refine;
pub mod result;
mod scan;
pub mod topic;
pub mod verdict;

pub use cache::PageCache;
pub use engine::{EngineOptions, SegmentationEngine, SegmentationError};
pub use oracle::{OracleError, SimilarityOracle};
pub use result::{Irreducible, Segment, SegmentationResult, SegmentationStats};
pub use topic::{InheritTopic, ScopedTopic, TopicRefiner};
pub use verdict::{Boundary, Verdict};

pub use tokio_util::sync::CancellationToken;
