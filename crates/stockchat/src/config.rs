//! Configuration for the chat orchestrator

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use stockchat_utils::{env_or, env_parse};

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-0613";

/// Default location of the chart artifact
pub const DEFAULT_CHART_PATH: &str = "stock.svg";

/// Configuration for chat turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model identifier passed to the provider
    pub model: String,

    /// Optional system prompt prepended to every request
    pub system_prompt: Option<String>,

    /// Maximum tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature, provider default when unset
    pub temperature: Option<f32>,

    /// Upper bound on each external call (model or price source)
    pub request_timeout: Duration,

    /// How far back price history is fetched
    pub lookback_days: u32,

    /// Where the chart artifact is written
    pub chart_path: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            max_tokens: 1024,
            temperature: None,
            request_timeout: Duration::from_secs(30),
            lookback_days: 365,
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
        }
    }
}

impl ChatConfig {
    /// Create a new configuration builder
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Defaults overlaid with environment variables
    ///
    /// Reads `OPENAI_MODEL`, `STOCKCHAT_CHART_PATH`, `STOCKCHAT_TIMEOUT_SECS`
    /// and `STOCKCHAT_LOOKBACK_DAYS`.
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env()?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ChatError::ConfigError("model must not be empty".to_string()));
        }

        if self.max_tokens == 0 {
            return Err(ChatError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ChatError::ConfigError(format!(
                    "temperature must be within 0.0..=2.0, got {t}"
                )));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(ChatError::ConfigError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.lookback_days == 0 {
            return Err(ChatError::ConfigError(
                "lookback_days must be greater than 0".to_string(),
            ));
        }

        if self.chart_path.as_os_str().is_empty() {
            return Err(ChatError::ConfigError("chart_path must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Builder for ChatConfig
#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    model: Option<String>,
    system_prompt: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    request_timeout: Option<Duration>,
    lookback_days: Option<u32>,
    chart_path: Option<PathBuf>,
}

impl ChatConfigBuilder {
    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the timeout applied to each external call
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the history lookback in days
    pub fn lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Set the chart artifact path
    pub fn chart_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_path = Some(path.into());
        self
    }

    /// Fill unset fields from the environment
    pub fn with_env(mut self) -> Result<Self> {
        if self.model.is_none() {
            if let Ok(model) = std::env::var("OPENAI_MODEL") {
                self.model = Some(model);
            }
        }
        if self.chart_path.is_none() {
            self.chart_path = Some(PathBuf::from(env_or(
                "STOCKCHAT_CHART_PATH",
                DEFAULT_CHART_PATH,
            )));
        }
        if self.request_timeout.is_none() {
            self.request_timeout = env_parse::<u64>("STOCKCHAT_TIMEOUT_SECS")?.map(Duration::from_secs);
        }
        if self.lookback_days.is_none() {
            self.lookback_days = env_parse("STOCKCHAT_LOOKBACK_DAYS")?;
        }
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<ChatConfig> {
        let defaults = ChatConfig::default();

        let config = ChatConfig {
            model: self.model.unwrap_or(defaults.model),
            system_prompt: self.system_prompt.or(defaults.system_prompt),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.or(defaults.temperature),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            chart_path: self.chart_path.unwrap_or(defaults.chart_path),
        };

        config.validate()?;
        Ok(config)
    }
}
