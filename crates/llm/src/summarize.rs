use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use deckseg_core::Page;
use deckseg_segment::TopicRefiner;

use crate::prompts::{extract_subtopic, subtopic_messages};
use crate::provider::LlmProvider;

/// Per-page text budget in the summary prompt.
const MAX_CHARS_PER_PAGE: usize = 1500;

/// Narrows the topic of an oversized segment by asking the LLM to name it.
///
/// The refined topic reads `<parent> / <sub-topic>`. Any LLM failure, or a
/// reply with nothing usable in it, falls back to the parent topic.
pub struct LlmTopicSummarizer {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmTopicSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: 0.0,
            max_tokens: 128,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

fn clip(text: &str) -> &str {
    match text.char_indices().nth(MAX_CHARS_PER_PAGE) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[async_trait]
impl TopicRefiner for LlmTopicSummarizer {
    async fn refine(&self, parent_topic: &str, pages: &[Arc<Page>]) -> String {
        let slides: Vec<(usize, &str)> = pages.iter().map(|p| (p.index, clip(&p.text))).collect();
        let messages = subtopic_messages(parent_topic, &slides);

        match self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await
        {
            Ok(reply) => match extract_subtopic(&reply) {
                Some(sub) => {
                    debug!(pages = pages.len(), subtopic = %sub, "summarized segment");
                    format!("{parent_topic} / {sub}")
                }
                None => parent_topic.to_string(),
            },
            Err(e) => {
                warn!(error = %e, "sub-topic summary failed, keeping parent topic");
                parent_topic.to_string()
            }
        }
    }
}
