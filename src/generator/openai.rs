//! Minimal OpenAI-compatible chat completions client.
use std::time::Duration;

use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::GeneratorError;

const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB

/// Completions can take a while for long articles.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(super) struct ChatClient {
    pub(super) client: reqwest::Client,
    pub(super) endpoint: String,
    pub(super) api_key: SecretString,
    pub(super) model: String,
    pub(super) temperature: f32,
    pub(super) max_retries: u32,
    pub(super) retry_delay: Duration,
}

impl ChatClient {
    /// Sends `prompt` as a single user message and returns the reply text.
    ///
    /// Transient failures are retried with exponential backoff starting at
    /// `retry_delay` (1s, 2s, 4s by default).
    pub(super) async fn complete(&self, prompt: &str) -> Result<String, GeneratorError> {
        let mut retry_count = 0;
        loop {
            match self.send(prompt).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && retry_count < self.max_retries => {
                    let delay = self.retry_delay * (1u32 << retry_count);
                    tracing::debug!(
                        error = %e,
                        retry = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying chat completion after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, prompt: &str) -> Result<String, GeneratorError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body);

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| GeneratorError::Timeout)?
            .map_err(GeneratorError::Network)?;

        if !response.status().is_success() {
            return Err(GeneratorError::HttpStatus(response.status().as_u16()));
        }

        let text = read_limited_text(response, MAX_RESPONSE_SIZE).await?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GeneratorError::InvalidResponse("no completion in response".to_string()))
    }
}

async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, GeneratorError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(GeneratorError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(GeneratorError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(GeneratorError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| GeneratorError::InvalidUtf8)
}
