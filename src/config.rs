//! Configuration for the boletim intake flow.
//!
//! All tunable behaviour is controlled through [`FlowConfig`], built via its
//! [`FlowConfigBuilder`]. The only secret is the extraction API key; it is
//! optional at build time because a missing key is reported per analysis
//! attempt, not at startup.

use crate::error::BoletimError;
use std::fmt;

/// Default Gemini model used for extraction.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default base URL of the Gemini REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Spreadsheet webhook (Google Apps Script `doPost`) receiving confirmed submissions.
pub const DEFAULT_WEBHOOK_URL: &str = "https://script.google.com/macros/s/AKfycbyoezZ709EI-T9kClVX3IEv8g8asiAXieHSbT_kZz9tB_FZXfRf5CusqD7Mh1_Q5sdHJA/exec";

/// Environment variables checked, in order, for the extraction API key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Configuration for one intake flow.
///
/// Built via [`FlowConfig::builder()`], [`FlowConfig::from_env()`] or
/// [`FlowConfig::default()`].
///
/// # Example
/// ```rust
/// use encceja_boletim::FlowConfig;
///
/// let config = FlowConfig::builder()
///     .api_key("test-key")
///     .api_timeout_secs(20)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-flash");
/// ```
#[derive(Clone)]
pub struct FlowConfig {
    /// Gemini API key. `None` makes every analysis attempt fail with
    /// [`BoletimError::ProviderNotConfigured`].
    pub api_key: Option<String>,

    /// Model identifier. Default: `gemini-2.5-flash`.
    pub model: String,

    /// Base URL of the Gemini REST API, without trailing slash.
    pub api_base_url: String,

    /// Custom extraction instruction. If None, uses the built-in prompt.
    pub extraction_prompt: Option<String>,

    /// Timeout for the extraction call in seconds. Default: 30.
    pub api_timeout_secs: u64,

    /// Endpoint receiving confirmed submissions.
    pub webhook_url: String,

    /// Timeout for the webhook POST in seconds. Default: 15.
    ///
    /// The flow never waits on this; it only bounds how long the background
    /// delivery task lives.
    pub webhook_timeout_secs: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            extraction_prompt: None,
            api_timeout_secs: 30,
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            webhook_timeout_secs: 15,
        }
    }
}

impl fmt::Debug for FlowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("extraction_prompt", &self.extraction_prompt.as_ref().map(|p| p.len()))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("webhook_url", &self.webhook_url)
            .field("webhook_timeout_secs", &self.webhook_timeout_secs)
            .finish()
    }
}

impl FlowConfig {
    /// Create a new builder for `FlowConfig`.
    pub fn builder() -> FlowConfigBuilder {
        FlowConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults overridden by `GEMINI_API_KEY` / `API_KEY`, `BOLETIM_MODEL`
    /// and `BOLETIM_WEBHOOK_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.api_key = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.trim().is_empty());
        if let Some(model) = non_empty_env("BOLETIM_MODEL") {
            config.model = model;
        }
        if let Some(url) = non_empty_env("BOLETIM_WEBHOOK_URL") {
            config.webhook_url = url;
        }
        config
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`FlowConfig`].
#[derive(Debug)]
pub struct FlowConfigBuilder {
    config: FlowConfig,
}

impl FlowConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn extraction_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.extraction_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.config.webhook_url = url.into();
        self
    }

    pub fn webhook_timeout_secs(mut self, secs: u64) -> Self {
        self.config.webhook_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FlowConfig, BoletimError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(BoletimError::InvalidConfig("model must not be empty".into()));
        }
        for (name, url) in [("api_base_url", &c.api_base_url), ("webhook_url", &c.webhook_url)] {
            if reqwest::Url::parse(url).is_err() {
                return Err(BoletimError::InvalidConfig(format!(
                    "{name} is not a valid URL: '{url}'"
                )));
            }
        }
        if c.api_timeout_secs == 0 || c.webhook_timeout_secs == 0 {
            return Err(BoletimError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
