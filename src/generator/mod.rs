//! AI-assisted article drafting.
//!
//! A prompt is sent to an OpenAI-compatible chat completions endpoint and the
//! reply is split into a draft article: the first non-empty line becomes the
//! title and the rest the body. Drafts are reviewed in the browser before
//! they are stored.
mod openai;

use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;

use crate::config::{ImageConfig, OpenAiConfig};
use crate::util::{generate_preview, PREVIEW_WORDS};
use openai::ChatClient;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

impl GeneratorError {
    /// Returns true if this error is transient and the request should be retried.
    fn is_retryable(&self) -> bool {
        match self {
            GeneratorError::Timeout | GeneratorError::Network(_) => true,
            GeneratorError::HttpStatus(status) => *status >= 500 || *status == 429,
            GeneratorError::EmptyPrompt
            | GeneratorError::ResponseTooLarge(_)
            | GeneratorError::InvalidUtf8
            | GeneratorError::InvalidResponse(_)
            | GeneratorError::InsecureBaseUrl => false,
        }
    }
}

/// A draft article produced from a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub image_url: String,
    pub text: String,
    pub preview: String,
}

pub struct ArticleGenerator {
    chat: ChatClient,
    default_image: String,
}

impl ArticleGenerator {
    const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Creates a generator talking to `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::InsecureBaseUrl` unless `base_url` is HTTPS
    /// or points at localhost.
    pub fn new(
        client: reqwest::Client,
        api_key: SecretString,
        base_url: &str,
        model: &str,
        temperature: f32,
        default_image: &str,
    ) -> Result<Self, GeneratorError> {
        let base = base_url.trim_end_matches('/');
        if !base.starts_with("https://") {
            let is_localhost =
                base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost");
            if !is_localhost {
                tracing::error!(base_url = %base, "Rejecting non-HTTPS completions URL (HTTPS required except for localhost)");
                return Err(GeneratorError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %base, "Using non-HTTPS completions URL (localhost only)");
        }

        Ok(Self {
            chat: ChatClient {
                client,
                endpoint: format!("{base}/v1/chat/completions"),
                api_key,
                model: model.to_string(),
                temperature,
                max_retries: Self::DEFAULT_MAX_RETRIES,
                retry_delay: Duration::from_secs(1),
            },
            default_image: default_image.to_string(),
        })
    }

    /// Builds a generator from config, or `None` when no API key is set.
    pub fn from_config(
        openai: &OpenAiConfig,
        image: &ImageConfig,
    ) -> Result<Option<Self>, GeneratorError> {
        let Some(api_key) = openai.api_key.clone().filter(|k| !k.is_empty()) else {
            tracing::info!("No OpenAI API key configured, article generation disabled");
            return Ok(None);
        };
        let generator = Self::new(
            reqwest::Client::new(),
            SecretString::from(api_key),
            &openai.base_url,
            &openai.model,
            openai.temperature,
            &image.default_image,
        )?;
        Ok(Some(generator))
    }

    /// Overrides the retry policy: `max_retries` attempts after the first,
    /// backing off from `delay`.
    pub fn with_retry(mut self, max_retries: u32, delay: Duration) -> Self {
        self.chat.max_retries = max_retries;
        self.chat.retry_delay = delay;
        self
    }

    /// Generates a draft article for `prompt`.
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedArticle, GeneratorError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GeneratorError::EmptyPrompt);
        }

        tracing::info!(prompt_len = prompt.len(), model = %self.chat.model, "Generating article");
        let completion = self.chat.complete(prompt).await?;
        let (title, text) = split_title(&completion);
        tracing::info!(title = %title, text_len = text.len(), "Article generated");

        Ok(GeneratedArticle {
            preview: generate_preview(&text, PREVIEW_WORDS),
            title,
            image_url: self.default_image.clone(),
            text,
        })
    }
}

/// Strips heading marks, emphasis and a `Title:` label from a title line.
fn clean_title(line: &str) -> String {
    let line = line.trim().trim_start_matches('#').trim();
    let line = line
        .strip_prefix("Title:")
        .or_else(|| line.strip_prefix("title:"))
        .unwrap_or(line)
        .trim();
    line.trim_matches(|c| c == '*' || c == '_' || c == '"')
        .trim()
        .to_string()
}

/// Splits a completion into `(title, body)`.
///
/// The title is the first non-empty line; the body is everything after it.
/// A single-line completion is used as the body too.
fn split_title(completion: &str) -> (String, String) {
    let trimmed = completion.trim();
    match trimmed.split_once('\n') {
        Some((first, rest)) if !rest.trim().is_empty() => {
            (clean_title(first), rest.trim().to_string())
        }
        _ => (clean_title(trimmed), trimmed.to_string()),
    }
}
