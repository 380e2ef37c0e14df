use std::sync::Arc;

use async_trait::async_trait;

use deckseg_core::Page;

/// Derives the narrower topic an oversized segment is re-scanned under.
#[async_trait]
pub trait TopicRefiner: Send + Sync {
    /// `pages` are the segment's pages in order; never empty.
    async fn refine(&self, parent_topic: &str, pages: &[Arc<Page>]) -> String;
}

/// Re-scan under the parent topic unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct InheritTopic;

#[async_trait]
impl TopicRefiner for InheritTopic {
    async fn refine(&self, parent_topic: &str, _pages: &[Arc<Page>]) -> String {
        parent_topic.to_string()
    }
}

/// Parent topic plus an instruction to look for finer splits in the page range.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopedTopic;

#[async_trait]
impl TopicRefiner for ScopedTopic {
    async fn refine(&self, parent_topic: &str, pages: &[Arc<Page>]) -> String {
        match (pages.first(), pages.last()) {
            (Some(first), Some(last)) => format!(
                "{parent_topic}\nFocus: pages {}-{} were judged one sub-topic at a coarser level; \
                 separate the finer sub-topics within them.",
                first.index + 1,
                last.index + 1
            ),
            _ => parent_topic.to_string(),
        }
    }
}
