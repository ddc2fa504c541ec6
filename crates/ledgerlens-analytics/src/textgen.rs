//! Text-generation backends.
//!
//! This module provides the `TextGenerator` trait and HTTP clients for the
//! supported providers. Every HTTP client is built with an explicit timeout,
//! so a call either returns text or an `AnalyticsError::CollaboratorUnavailable`
//! within that bound.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::types::{Provider, ProviderInfo, TextGenConfig};

/// Text substituted when a synchronous route cannot reach the backend.
pub const FALLBACK_TEXT: &str = "(text generation unavailable)";

/// Returned by Ollama when the model produced nothing.
pub const EMPTY_RESPONSE: &str = "(empty response)";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_SNIPPET_CHARS: usize = 200;
const OFFLINE_PROMPT_CHARS: usize = 120;

/// Trait for text-generation backends.
///
/// This trait abstracts the provider, allowing for mock implementations in
/// tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::CollaboratorUnavailable` if the backend fails,
    /// rejects the request or times out.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider and model served by this generator.
    fn info(&self) -> ProviderInfo;
}

/// Generate text, substituting [`FALLBACK_TEXT`] on any backend failure.
pub async fn generate_or_fallback(generator: &dyn TextGenerator, prompt: &str) -> String {
    match generator.generate(prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                provider = %generator.info().provider,
                error = %e,
                "Text generation failed, using fallback"
            );
            FALLBACK_TEXT.to_string()
        }
    }
}

/// Build the generator selected by `config`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created.
pub fn build_generator(config: &TextGenConfig) -> Result<Arc<dyn TextGenerator>> {
    Ok(match config.provider {
        Provider::Ollama => Arc::new(OllamaGenerator::new(
            &config.ollama_url,
            &config.ollama_model,
            config.timeout,
        )?),
        Provider::OpenAi => Arc::new(OpenAiGenerator::new(
            &config.openai_url,
            &config.openai_model,
            config.openai_api_key.clone(),
            config.timeout,
        )?),
        Provider::Offline => Arc::new(OfflineGenerator::new()),
    })
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .build()
        .map_err(|e| AnalyticsError::Internal(format!("Failed to create HTTP client: {e}")))
}

fn snippet(text: &str) -> String {
    text.chars().take(ERROR_SNIPPET_CHARS).collect()
}

fn unavailable(provider: Provider, e: &reqwest::Error) -> AnalyticsError {
    if e.is_timeout() {
        AnalyticsError::CollaboratorUnavailable(format!("{provider} request timed out"))
    } else {
        AnalyticsError::CollaboratorUnavailable(format!(
            "{provider} request failed: {}",
            snippet(&e.to_string())
        ))
    }
}

async fn rejected(provider: Provider, response: reqwest::Response) -> AnalyticsError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        provider = %provider,
        status = %status,
        body = %snippet(&body),
        "Text generation backend rejected request"
    );
    AnalyticsError::CollaboratorUnavailable(format!(
        "{provider} returned {status}: {}",
        snippet(&body)
    ))
}

// =============================================================================
// Ollama
// =============================================================================

/// Client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
}

impl OllamaGenerator {
    /// Create a new Ollama client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Get the base URL of the Ollama server.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| unavailable(Provider::Ollama, &e))?;

        if !response.status().is_success() {
            return Err(rejected(Provider::Ollama, response).await);
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| unavailable(Provider::Ollama, &e))?;

        let text = body.response.unwrap_or_default();
        let text = text.trim();
        tracing::debug!(model = %self.model, chars = text.len(), "Ollama completion received");

        Ok(if text.is_empty() {
            EMPTY_RESPONSE.to_string()
        } else {
            text.to_string()
        })
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider: Provider::Ollama,
            model: self.model.clone(),
        }
    }
}

// =============================================================================
// OpenAI
// =============================================================================

/// Client for an OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiGenerator {
    /// Create a new OpenAI client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.3,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| unavailable(Provider::OpenAi, &e))?;

        if !response.status().is_success() {
            return Err(rejected(Provider::OpenAi, response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| unavailable(Provider::OpenAi, &e))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                AnalyticsError::CollaboratorUnavailable("openai returned no choices".to_string())
            })
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider: Provider::OpenAi,
            model: self.model.clone(),
        }
    }
}

// =============================================================================
// Offline
// =============================================================================

/// A generator that never leaves the process.
///
/// Echoes the start of the prompt so the rest of the pipeline can be
/// exercised without a model.
#[derive(Debug, Clone, Default)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    /// Create a new offline generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let head: String = prompt.chars().take(OFFLINE_PROMPT_CHARS).collect();
        Ok(format!("(offline) would analyse: {head}..."))
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider: Provider::Offline,
            model: "none".to_string(),
        }
    }
}
