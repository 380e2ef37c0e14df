use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use deckseg_core::{Config, Page};
use deckseg_segment::{OracleError, SimilarityOracle, Verdict};

use crate::ocr::{ocr_images, OcrEngine};
use crate::prompts::{extract_label, pair_messages, SlideInput};
use crate::provider::{LlmError, LlmProvider};

const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Asks an LLM whether two consecutive slides cover the same sub-topic.
pub struct LlmPageSimilarity {
    provider: Arc<dyn LlmProvider>,
    ocr: Arc<dyn OcrEngine>,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
    backoff: Duration,
}

impl LlmPageSimilarity {
    pub fn new(provider: Arc<dyn LlmProvider>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            provider,
            ocr,
            temperature: 0.0,
            max_tokens: 1024,
            max_retries: 2,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Build from config, creating the configured provider.
    pub fn from_config(config: &Config, ocr: Arc<dyn OcrEngine>) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(&config.llm, &config.ollama)?;
        Ok(Self::new(Arc::from(provider), ocr)
            .with_sampling(config.llm.temperature, config.llm.max_tokens)
            .with_retries(config.llm.max_retries, DEFAULT_BACKOFF))
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Retry transient failures `max_retries` times, waiting `backoff * attempt` between tries.
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    pub fn provider(&self) -> Arc<dyn LlmProvider> {
        Arc::clone(&self.provider)
    }

    /// Raw model reply for the pair, after retries.
    pub async fn judge(&self, topic: &str, a: &Page, b: &Page) -> Result<String, LlmError> {
        let (ocr_a, ocr_b) = futures::join!(
            ocr_images(self.ocr.as_ref(), &a.images),
            ocr_images(self.ocr.as_ref(), &b.images),
        );
        let messages = pair_messages(
            topic,
            &SlideInput { text: &a.text, ocr: &ocr_a },
            &SlideInput { text: &b.text, ocr: &ocr_b },
        );

        let mut attempt = 0;
        loop {
            match self
                .provider
                .complete(messages.clone(), self.temperature, self.max_tokens)
                .await
            {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        provider = %self.provider.name(),
                        page = b.index,
                        attempt,
                        error = %e,
                        "LLM call failed, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl SimilarityOracle for LlmPageSimilarity {
    async fn compare(&self, topic: &str, a: &Page, b: &Page) -> Result<Verdict, OracleError> {
        let reply = self
            .judge(topic, a, b)
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let verdict = match extract_label(&reply) {
            Some(1) => Verdict::Same,
            Some(_) => Verdict::Different,
            None => {
                debug!(page = b.index, reply = %reply, "no conclusion in LLM reply");
                Verdict::Unknown
            }
        };
        debug!(first = a.index, second = b.index, %verdict, "pair judged");
        Ok(verdict)
    }
}
