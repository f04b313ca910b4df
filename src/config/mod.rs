//! Configuration management.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML config file (`--config`, `SELFHEAL_CONFIG_PATH`, or the
//!    platform config dir)
//! 3. Environment variables (`GEMINI_API_KEY`, `SELFHEAL_*`), including
//!    any loaded from a `.env` file

mod features;

pub use features::FeatureFlags;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main configuration for selfheal.
#[derive(Debug, Clone, Default)]
pub struct SelfhealConfig {
    /// Generation service configuration.
    pub llm: LlmConfig,
    /// Retrieval settings.
    pub retrieval: RetrievalConfig,
    /// Replacement fact list; `None` keeps the built-in facts.
    pub facts: Option<Vec<String>>,
    /// Feature flags.
    pub features: FeatureFlags,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Metrics settings.
    pub metrics: MetricsSettings,
}

/// Generation service configuration.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// API key.
    pub api_key: Option<SecretString>,
    /// Model name.
    pub model: Option<String>,
    /// Base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub base_url: Option<String>,
    /// Output token cap for reports.
    pub max_output_tokens: Option<u32>,
    /// Whole-request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

impl LlmConfig {
    /// Returns the API key if one is set and not blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// Number of facts to include in the prompt.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `selfheal=debug`.
    pub level: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path; stderr when unset.
    pub file: Option<PathBuf>,
}

/// Metrics settings as written in the config file.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MetricsSettings {
    /// Install the Prometheus recorder.
    pub enabled: Option<bool>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// LLM section.
    pub llm: Option<ConfigFileLlm>,
    /// Retrieval section.
    pub retrieval: Option<ConfigFileRetrieval>,
    /// Knowledge section.
    pub knowledge: Option<ConfigFileKnowledge>,
    /// Feature flags.
    pub features: Option<ConfigFileFeatures>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
    /// Metrics section.
    pub metrics: Option<MetricsSettings>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// API key.
    pub api_key: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Output token cap.
    pub max_output_tokens: Option<u32>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

/// Retrieval section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileRetrieval {
    /// Number of facts to retrieve.
    pub top_k: Option<usize>,
}

/// Knowledge section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileKnowledge {
    /// Facts replacing the built-in list.
    pub facts: Option<Vec<String>>,
}

/// Features section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileFeatures {
    /// Pipeline graph recording.
    pub pipeline_graph: Option<bool>,
    /// Include the prompt in output.
    pub show_prompt: Option<bool>,
}

impl SelfhealConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/selfheal/` on macOS)
    /// 2. XDG config dir (`~/.config/selfheal/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("selfheal").join("config.toml");
        if platform_config.exists() {
            match Self::load_from_file(&platform_config) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring {}: {e}", platform_config.display()),
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("selfheal")
            .join("config.toml");
        if xdg_config.exists() {
            match Self::load_from_file(&xdg_config) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring {}: {e}", xdg_config.display()),
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `SelfhealConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(llm) = file.llm {
            config.llm = LlmConfig {
                api_key: llm.api_key.map(SecretString::from),
                model: llm.model,
                base_url: llm.base_url,
                max_output_tokens: llm.max_output_tokens,
                timeout_ms: llm.timeout_ms,
                connect_timeout_ms: llm.connect_timeout_ms,
            };
        }
        if let Some(top_k) = file.retrieval.and_then(|r| r.top_k) {
            config.retrieval.top_k = top_k;
        }
        if let Some(facts) = file.knowledge.and_then(|k| k.facts) {
            config.facts = Some(facts);
        }
        if let Some(features) = file.features {
            if let Some(v) = features.pipeline_graph {
                config.features.pipeline_graph = v;
            }
            if let Some(v) = features.show_prompt {
                config.features.show_prompt = v;
            }
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(metrics) = file.metrics {
            config.metrics = metrics;
        }

        config
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides using `lookup` to read variables.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_blank(API_KEY_ENV) {
            self.llm.api_key = Some(SecretString::from(key));
        }
        if let Some(model) = non_blank("SELFHEAL_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(base_url) = non_blank("SELFHEAL_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Some(tokens) = non_blank("SELFHEAL_MAX_OUTPUT_TOKENS").and_then(|v| v.parse().ok())
        {
            self.llm.max_output_tokens = Some(tokens);
        }
        if let Some(top_k) = non_blank("SELFHEAL_TOP_K").and_then(|v| v.parse().ok()) {
            self.retrieval.top_k = top_k;
        }
        if let Some(enabled) = non_blank("SELFHEAL_PIPELINE_GRAPH").and_then(|v| parse_bool(&v)) {
            self.features.pipeline_graph = enabled;
        }
        if let Some(format) = non_blank("SELFHEAL_LOG_FORMAT") {
            self.logging.format = Some(format);
        }
        if let Some(file) = non_blank("SELFHEAL_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(enabled) = non_blank("SELFHEAL_METRICS_ENABLED").and_then(|v| parse_bool(&v))
        {
            self.metrics.enabled = Some(enabled);
        }

        self
    }

    /// Output token cap, falling back to the client default.
    #[must_use]
    pub fn max_output_tokens(&self) -> u32 {
        self.llm
            .max_output_tokens
            .unwrap_or(crate::llm::GeminiClient::DEFAULT_MAX_OUTPUT_TOKENS)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
