use super::types::{ErrorEnvelope, GenerationRequest, StreamChunk};
use crate::{Error, Result, config::LlmConfig};
use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends one request and returns the complete answer. The response is
    /// streamed internally but only returned once fully drained.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Builds the client. `timeout_secs` bounds the whole call, stream
    /// included, so a stalled remote surfaces as a network error.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            api_key: config.api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        debug!(
            "Requesting generation from {} with {} parts",
            self.model,
            request.parts().len()
        );
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        let mut events = std::pin::pin!(response.bytes_stream().eventsource());
        let mut answer = String::new();
        let mut fragments = 0usize;

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| match e {
                EventStreamError::Transport(e) => Error::Network(e),
                other => Error::llm(format!("Malformed event stream: {other}")),
            })?;
            if event.data.is_empty() {
                continue;
            }
            append_fragment(&event.data, &mut answer)?;
            fragments += 1;
        }

        if answer.is_empty() {
            warn!("Model stream ended after {} fragments without text", fragments);
            return Err(Error::llm("The model returned an empty response"));
        }

        info!(
            "Received {} chars in {} fragments from {} in {:?}",
            answer.len(),
            fragments,
            self.model,
            started.elapsed()
        );
        Ok(answer)
    }
}

/// Decodes one streamed payload and appends its text to the answer.
fn append_fragment(payload: &str, answer: &mut String) -> Result<()> {
    let chunk: StreamChunk = serde_json::from_str(payload)
        .map_err(|e| Error::llm(format!("Malformed response chunk: {e}")))?;

    if let Some(error) = chunk.error.as_ref() {
        return Err(Error::llm(error.describe()));
    }

    if let Some(reason) = chunk
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return Err(Error::llm(format!("The request was blocked: {reason}")));
    }

    answer.push_str(&chunk.text());
    Ok(())
}

fn map_http_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.describe())
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            }
        });

    Error::llm(format!("HTTP {}: {}", status.as_u16(), message))
}
