use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_EXTENSION: &str = "docx";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MAX_ATTEMPTS: usize = 10;
const DEFAULT_PAUSE: Duration = Duration::from_secs(1);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(15);

/// Retry schedule for chat-completion calls.
///
/// The reference schedule is a fixed pause, a second fixed delay, then the
/// next attempt, up to ten attempts total. There is no exponential backoff
/// and no jitter; every failure is treated the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: usize,

    /// Pause taken immediately after a failed attempt
    pub pause: Duration,

    /// Delay before the next attempt is issued
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            pause: DEFAULT_PAUSE,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Returns the worst-case blocking time of one generation call,
    /// excluding the network round-trips themselves.
    #[must_use]
    pub fn worst_case_wait(&self) -> Duration {
        let attempts = u32::try_from(self.max_attempts).unwrap_or(u32::MAX);
        (self.pause + self.retry_delay) * attempts
    }
}

/// What to do when a single file fails to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run on the first per-file error. Files already written stay
    /// in place; remaining files are not touched.
    #[default]
    Abort,

    /// Log the error, record it in the run report, and continue with the
    /// next file.
    Skip,
}

/// Configuration for one rewrite run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Directory containing the source documents
    pub input_dir: PathBuf,

    /// Directory receiving the rewritten documents (created if absent)
    pub output_dir: PathBuf,

    /// File extension of eligible documents, without the leading dot
    pub extension: String,

    /// OpenAI model ID to use for rewriting
    pub model: String,

    /// Base URL of the chat-completions API
    pub base_url: String,

    /// API key; rewritten runs fail fast at client construction if absent
    pub api_key: Option<String>,

    /// Retry schedule for generation calls
    pub retry: RetryPolicy,

    /// Per-file error policy
    pub failure_policy: FailurePolicy,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use article_rewriter::Config;
    ///
    /// let config = Config::builder()
    ///     .input_dir("./articles")
    ///     .output_dir("./rewritten")
    ///     .api_key("sk-test")
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Input directory doesn't exist or is not a directory
    /// - The retry policy allows zero attempts
    /// - The document extension is empty
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.exists() {
            return Err(Error::config(format!(
                "Input directory does not exist: {}",
                self.input_dir.display()
            )));
        }

        if !self.input_dir.is_dir() {
            return Err(Error::config(format!(
                "Input path is not a directory: {}",
                self.input_dir.display()
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::config("max_attempts must be greater than 0"));
        }

        if self.extension.is_empty() {
            return Err(Error::config("document extension must not be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("out"),
            extension: DEFAULT_EXTENSION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            retry: RetryPolicy::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    extension: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    retry: Option<RetryPolicy>,
    failure_policy: Option<FailurePolicy>,
}

impl ConfigBuilder {
    /// Sets the directory to read source documents from.
    #[must_use]
    pub fn input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(path.into());
        self
    }

    /// Sets the directory rewritten documents are written to.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the extension of eligible documents (without the leading dot).
    #[must_use]
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = Some(ext.into());
        self
    }

    /// Sets the OpenAI model ID.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the base URL of the chat-completions API.
    ///
    /// Mainly useful for proxies and local test servers.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API key explicitly.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the retry schedule for generation calls.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Sets the per-file error policy.
    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Builds the configuration without validating it.
    ///
    /// Validation happens when the configuration is handed to
    /// [`BatchRunner::new`](crate::BatchRunner::new), once both directories
    /// are expected to be in their final state.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            input_dir: self.input_dir.unwrap_or_else(|| PathBuf::from(".")),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("out")),
            extension: self
                .extension
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: self.api_key,
            retry: self.retry.unwrap_or_default(),
            failure_policy: self.failure_policy.unwrap_or_default(),
        }
    }
}
