use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{send_json, text_at};
use crate::provider::{LlmError, LlmProvider, Message};

/// Local models through Ollama's `/api/chat`, non-streaming.
///
/// The configured seed is sent with every request so reruns over the same deck
/// reproduce the same verdicts.
pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    seed: Option<i64>,
}

impl OllamaProvider {
    pub fn new(url: String, model: String, seed: Option<i64>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
            seed,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.url)
    }

    fn request_body(&self, messages: &[Message], temperature: f32, max_tokens: u32) -> Value {
        let mut options = json!({
            "temperature": temperature,
            "num_predict": max_tokens,
        });
        if let Some(seed) = self.seed {
            options["seed"] = json!(seed);
        }

        json!({
            "model": self.model,
            "messages": messages
                .iter()
                .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
                .collect::<Vec<_>>(),
            "stream": false,
            "options": options,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = self.endpoint();
        debug!(%url, model = %self.model, "ollama chat");

        let body = self.request_body(&messages, temperature, max_tokens);
        let reply = send_json(self.client.post(&url), &body).await?;
        text_at(&reply, "/message/content")
    }

    fn name(&self) -> String {
        format!("ollama:{}", self.model)
    }
}
