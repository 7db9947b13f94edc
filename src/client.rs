use crate::config::{Config, RetryPolicy};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One chat-completion call, with no retry semantics.
///
/// The production implementation is [`OpenAiBackend`]; tests plug in fakes
/// to exercise the retry schedule without a network.
pub trait ChatBackend: Send + Sync {
    /// Sends a single prompt and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for any transport, status, or parse failure.
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Blocking waits between retry attempts.
///
/// Injected so tests can assert the schedule without sleeping for real.
pub trait Sleep: Send + Sync {
    /// Blocks the current thread for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Chat-completion backend for the OpenAI API.
///
/// Speaks the `/chat/completions` wire format with a blocking HTTP client.
pub struct OpenAiBackend {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OpenAiBackend {
    /// Creates a backend for the given model, key, and base URL.
    #[must_use]
    pub fn new(model: String, api_key: String, base_url: String) -> Self {
        Self {
            model,
            api_key,
            base_url,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl ChatBackend for OpenAiBackend {
    fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .map_err(|e| Error::api(format!("Network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::api(format!("API error ({status}): {error_text}")));
        }

        let chat_response: ChatResponse = response
            .json()
            .map_err(|e| Error::api(format!("Failed to parse response: {e}")))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::api("No content in API response"))
    }
}

// OpenAI API request/response structures

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Generation client with bounded retry.
///
/// Wraps a [`ChatBackend`] and a [`RetryPolicy`]: every backend error is
/// treated as transient, each failure is followed by the fixed
/// pause-log-delay sequence, and the loop gives up after
/// `max_attempts` attempts with an explicit
/// [`Error::ExhaustedRetries`]. The call blocks the current thread for the
/// whole schedule.
pub struct RewriteClient {
    backend: Arc<dyn ChatBackend>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleep>,
}

// The backend and sleeper are trait objects, so Debug cannot be derived.
impl fmt::Debug for RewriteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RewriteClient {
    /// Creates a client talking to the OpenAI API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingApiKey`] if the configuration carries no
    /// API key. The check happens here, at construction, so a run never
    /// starts only to fail on its first request.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = match config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key.to_string(),
            _ => return Err(Error::MissingApiKey),
        };

        let backend = OpenAiBackend::new(
            config.model.clone(),
            api_key,
            config.base_url.clone(),
        );

        Ok(Self::with_backend(Arc::new(backend), config.retry))
    }

    /// Creates a client over an arbitrary backend.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn ChatBackend>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            sleeper: Arc::new(ThreadSleep),
        }
    }

    /// Replaces the sleeper used between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleep>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Rewrites one article, retrying on failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExhaustedRetries`] once every attempt of the
    /// schedule has failed, carrying the last attempt's error message.
    pub fn rewrite(&self, article: &str) -> Result<String> {
        let prompt = format!(
            r#"Please rewrite the following article in a different way and make it longer : "{article}""#
        );

        let mut attempts = 0;
        let mut last_error = Error::api("no attempts performed");

        while attempts < self.policy.max_attempts {
            match self.backend.complete(&prompt) {
                Ok(text) => {
                    debug!(attempts = attempts + 1, "Generation succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!("API error: {e}");
                    self.sleeper.sleep(self.policy.pause);
                    info!("Retrying in {} seconds...", self.policy.retry_delay.as_secs());
                    self.sleeper.sleep(self.policy.retry_delay);
                    attempts += 1;
                    last_error = e;
                }
            }
        }

        Err(Error::exhausted(attempts, &last_error))
    }
}
