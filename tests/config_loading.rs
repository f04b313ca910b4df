//! Configuration loading tests.
//!
//! Covers TOML files on disk, environment overrides through an injected
//! lookup, and how the layers combine.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::io::Write;

use secrecy::ExposeSecret;
use selfheal::config::SelfhealConfig;
use selfheal::observability::{LogFormat, LoggingConfig};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_full_file() {
    let file = write_config(
        r#"
[llm]
api_key = "from-file"
model = "gemini-1.5-flash"
base_url = "http://localhost:9999/v1beta"
max_output_tokens = 512
timeout_ms = 10000
connect_timeout_ms = 500

[retrieval]
top_k = 2

[knowledge]
facts = ["Fact one.", "Fact two."]

[features]
pipeline_graph = true

[logging]
level = "debug"
format = "json"

[metrics]
enabled = true
"#,
    );

    let config = SelfhealConfig::load_from_file(file.path()).unwrap();

    assert_eq!(config.llm.api_key().unwrap().expose_secret(), "from-file");
    assert_eq!(config.llm.model.as_deref(), Some("gemini-1.5-flash"));
    assert_eq!(config.max_output_tokens(), 512);
    assert_eq!(config.llm.timeout_ms, Some(10_000));
    assert_eq!(config.retrieval.top_k, 2);
    assert_eq!(config.facts.as_ref().map(Vec::len), Some(2));
    assert!(config.features.pipeline_graph);
    assert_eq!(config.logging.format.as_deref(), Some("json"));
    assert_eq!(config.metrics.enabled, Some(true));
}

#[test]
fn test_empty_file_is_defaults() {
    let file = write_config("");
    let config = SelfhealConfig::load_from_file(file.path()).unwrap();
    assert!(config.llm.api_key().is_none());
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.max_output_tokens(), 350);
    assert!(config.facts.is_none());
    assert!(!config.features.pipeline_graph);
}

#[test]
fn test_unknown_section_is_rejected() {
    let file = write_config("[storage]\npath = \"/tmp\"\n");
    let err = SelfhealConfig::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("parse_config_file"));
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SelfhealConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("read_config_file"));
}

#[test]
fn test_env_overrides_file() {
    let file = write_config(
        r#"
[llm]
api_key = "from-file"
model = "gemini-1.5-flash"

[retrieval]
top_k = 2
"#,
    );

    let config = SelfhealConfig::load_from_file(file.path())
        .unwrap()
        .with_overrides_from(lookup(&[
            ("GEMINI_API_KEY", "from-env"),
            ("SELFHEAL_TOP_K", "5"),
            ("SELFHEAL_PIPELINE_GRAPH", "yes"),
            ("SELFHEAL_MAX_OUTPUT_TOKENS", "not-a-number"),
        ]));

    assert_eq!(config.llm.api_key().unwrap().expose_secret(), "from-env");
    assert_eq!(config.llm.model.as_deref(), Some("gemini-1.5-flash"));
    assert_eq!(config.retrieval.top_k, 5);
    assert!(config.features.pipeline_graph);
    assert_eq!(config.max_output_tokens(), 350);
}

#[test]
fn test_blank_env_key_keeps_file_key() {
    let file = write_config("[llm]\napi_key = \"from-file\"\n");
    let config = SelfhealConfig::load_from_file(file.path())
        .unwrap()
        .with_overrides_from(lookup(&[("GEMINI_API_KEY", "  ")]));
    assert_eq!(config.llm.api_key().unwrap().expose_secret(), "from-file");
}

#[test]
fn test_logging_resolution_from_file_settings() {
    let file = write_config("[logging]\nlevel = \"info\"\nformat = \"json\"\n");
    let config = SelfhealConfig::load_from_file(file.path()).unwrap();

    let logging = LoggingConfig::resolve(&config.logging, false, lookup(&[]));
    assert_eq!(logging.filter, "info");
    assert_eq!(logging.format, LogFormat::Json);

    let logging = LoggingConfig::resolve(
        &config.logging,
        true,
        lookup(&[("SELFHEAL_LOG", "selfheal=trace")]),
    );
    assert_eq!(logging.filter, "selfheal=trace");
}
