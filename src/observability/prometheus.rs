//! Prometheus metrics.
//!
//! Instrumentation uses the `metrics` macros everywhere; without an
//! installed recorder they are no-ops. The recorder here only keeps an
//! in-process registry that shells render on demand (the CLI prints it to
//! stderr, the HTTP shell serves it on `/metrics`).

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Metrics configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
}

impl MetricsConfig {
    /// Builds metrics configuration from settings and the CLI flag.
    #[must_use]
    pub fn from_settings(settings: &MetricsSettings, cli_enabled: bool) -> Self {
        Self {
            enabled: cli_enabled || settings.enabled.unwrap_or(false),
        }
    }
}

/// Installs the Prometheus recorder globally.
///
/// Returns `None` when metrics are disabled.
pub fn install_prometheus(config: MetricsConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_recorder_install".to_string(),
            cause: e.to_string(),
        })?;

    describe_metrics();
    Ok(Some(handle))
}

fn describe_metrics() {
    metrics::describe_counter!("selfheal_analyses_total", "Incident analyses started");
    metrics::describe_counter!(
        "selfheal_generation_outcomes_total",
        "Generation calls by outcome (report, no_usable_text, request_failed)"
    );
    metrics::describe_histogram!(
        "selfheal_generation_duration_ms",
        metrics::Unit::Milliseconds,
        "Wall time of one generation call"
    );
    metrics::describe_histogram!(
        "selfheal_retrieved_facts",
        metrics::Unit::Count,
        "Facts retrieved per analysis"
    );
}
