//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to `Pretty`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional log file; stderr otherwise.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Default directive when nothing else is configured.
    pub const DEFAULT_FILTER: &'static str = "warn";

    /// Directive used for `--verbose`.
    pub const VERBOSE_FILTER: &'static str = "selfheal=debug,info";

    /// Resolves logging configuration from settings and the environment.
    ///
    /// Filter precedence: `SELFHEAL_LOG`, `RUST_LOG`, `--verbose`, the
    /// config file `level`, then [`Self::DEFAULT_FILTER`].
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |name| std::env::var(name).ok())
    }

    /// Resolves logging configuration using `lookup` for environment reads.
    #[must_use]
    pub fn resolve<F>(settings: &LoggingSettings, verbose: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_filter = lookup("SELFHEAL_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|v| !v.trim().is_empty());

        let filter = env_filter.unwrap_or_else(|| {
            if verbose {
                Self::VERBOSE_FILTER.to_string()
            } else {
                settings
                    .level
                    .clone()
                    .unwrap_or_else(|| Self::DEFAULT_FILTER.to_string())
            }
        });

        Self {
            filter,
            format: settings
                .format
                .as_deref()
                .map_or(LogFormat::Pretty, LogFormat::parse),
            file: settings.file.clone(),
        }
    }
}
