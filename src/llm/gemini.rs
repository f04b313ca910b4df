//! Google Gemini `generateContent` client.

use super::{GenerationOutcome, LlmHttpConfig, TextGenerator, build_http_client};
use crate::observability::current_request_id;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{Span, info_span};

/// Gemini LLM client.
///
/// Performs exactly one blocking request per [`generate`](Self::generate)
/// call. There are no retries: a failed call surfaces once as
/// [`GenerationOutcome::RequestFailed`].
pub struct GeminiClient {
    /// API key, sent as the `key` query parameter.
    api_key: SecretString,
    /// API base endpoint (without the `/models/...` suffix).
    endpoint: String,
    /// Model to use.
    model: String,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash-lite";

    /// Sampling temperature sent with every request.
    pub const TEMPERATURE: f64 = 0.2;

    /// Default output token cap for remediation reports.
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 350;

    /// Creates a new Gemini client with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            client: build_http_client(LlmHttpConfig::from_env()),
        }
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets HTTP client timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    /// Returns the configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full `generateContent` URL, without the key.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    /// Sends `prompt` to the model and extracts the first text completion.
    ///
    /// Never fails: network errors, timeouts and unparseable bodies become
    /// [`GenerationOutcome::RequestFailed`]; a parsed body without text
    /// becomes [`GenerationOutcome::NoUsableText`].
    pub fn generate(&self, prompt: &str, max_output_tokens: u32) -> GenerationOutcome {
        let request_id = current_request_id().unwrap_or_default();
        let span = info_span!(
            "llm.generate",
            request_id = %request_id,
            provider = "gemini",
            model = %self.model,
            prompt_len = prompt.len(),
            max_output_tokens,
            http.status = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        let _guard = span.enter();
        let start = Instant::now();

        let outcome = self.request(prompt, max_output_tokens, &span);

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        span.record("outcome", outcome.label());
        metrics::counter!("selfheal_generation_outcomes_total", "outcome" => outcome.label())
            .increment(1);
        metrics::histogram!("selfheal_generation_duration_ms").record(elapsed_ms);
        match &outcome {
            GenerationOutcome::Report(text) => {
                tracing::info!(report_len = text.len(), elapsed_ms, "Gemini returned a report");
            },
            GenerationOutcome::NoUsableText => {
                tracing::warn!(elapsed_ms, "Gemini response carried no usable text");
            },
            GenerationOutcome::RequestFailed(cause) => {
                tracing::warn!(%cause, elapsed_ms, "Gemini request failed");
            },
        }
        outcome
    }

    fn request(&self, prompt: &str, max_output_tokens: u32, span: &Span) -> GenerationOutcome {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: Self::TEMPERATURE,
                max_output_tokens,
            },
        };

        let response = match self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
        {
            Ok(response) => response,
            Err(e) => return GenerationOutcome::RequestFailed(describe_transport_error(e)),
        };

        let status = response.status();
        span.record("http.status", status.as_u16());
        if !status.is_success() {
            // Error bodies are still JSON; they fall through to NoUsableText.
            tracing::warn!(status = status.as_u16(), "Gemini API returned non-success status");
        }

        match response.json::<Value>() {
            Ok(data) => extract_text(&data)
                .map_or(GenerationOutcome::NoUsableText, GenerationOutcome::Report),
            Err(e) => GenerationOutcome::RequestFailed(describe_transport_error(e)),
        }
    }
}

impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn generate(&self, prompt: &str, max_output_tokens: u32) -> GenerationOutcome {
        Self::generate(self, prompt, max_output_tokens)
    }
}

/// One-shot generation with a default-configured client.
///
/// Equivalent to `GeminiClient::new(api_key).generate(prompt, max_output_tokens)`.
pub fn generate(api_key: &str, prompt: &str, max_output_tokens: u32) -> GenerationOutcome {
    GeminiClient::new(api_key).generate(prompt, max_output_tokens)
}

/// Extracts the first non-empty text part of the first candidate, trimmed.
///
/// Returns `None` when `candidates` is missing or empty, or when no part of
/// the first candidate carries a non-empty `text` string.
#[must_use]
pub fn extract_text(response: &Value) -> Option<String> {
    let candidate = response.get("candidates")?.as_array()?.first()?;
    candidate
        .get("content")?
        .get("parts")?
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text")?.as_str())
        .find(|text| !text.is_empty())
        .map(|text| text.trim().to_string())
}

/// Renders a transport error with its source chain.
///
/// The request URL is stripped first because it carries the API key.
fn describe_transport_error(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !detail.contains(&cause_text) {
            detail.push_str(": ");
            detail.push_str(&cause_text);
        }
        source = std::error::Error::source(cause);
    }
    detail
}

/// Request body for `generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

/// A conversation turn.
#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

/// A text part of a turn.
#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Sampling settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new("test-key");
        assert_eq!(TextGenerator::name(&client), "gemini");
        assert_eq!(client.model(), GeminiClient::DEFAULT_MODEL);
        assert_eq!(
            client.url(),
            format!(
                "{}/models/gemini-2.0-flash-lite:generateContent",
                "https://generativelanguage.googleapis.com/v1beta"
            )
        );
    }

    #[test]
    fn test_client_configuration() {
        let client = GeminiClient::new("test-key")
            .with_endpoint("http://localhost:8080/v1beta/")
            .with_model("gemini-1.5-pro");
        assert_eq!(
            client.url(),
            "http://localhost:8080/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: GeminiClient::TEMPERATURE,
                max_output_tokens: 350,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {"temperature": 0.2, "maxOutputTokens": 350}
            })
        );
    }

    #[test]
    fn test_extract_text_trims_first_part() {
        let data = json!({
            "candidates": [{"content": {"parts": [{"text": "  Plan: restart service  "}]}}]
        });
        assert_eq!(extract_text(&data).as_deref(), Some("Plan: restart service"));
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        assert_eq!(extract_text(&json!({"candidates": []})), None);
    }

    #[test]
    fn test_extract_text_missing_candidates() {
        let data = json!({"error": {"code": 400, "message": "API key not valid"}});
        assert_eq!(extract_text(&data), None);
    }

    #[test]
    fn test_extract_text_skips_empty_and_non_text_parts() {
        let data = json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png"}},
                {"text": ""},
                {"text": "second part wins"},
                {"text": "third part"}
            ]}}]
        });
        assert_eq!(extract_text(&data).as_deref(), Some("second part wins"));
    }

    #[test]
    fn test_extract_text_only_inspects_first_candidate() {
        let data = json!({
            "candidates": [
                {"content": {"parts": []}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        });
        assert_eq!(extract_text(&data), None);
    }

    #[test]
    fn test_extract_text_tolerates_odd_shapes() {
        assert_eq!(extract_text(&json!({"candidates": "nope"})), None);
        assert_eq!(extract_text(&json!({"candidates": [{"content": 7}]})), None);
        assert_eq!(extract_text(&json!([1, 2, 3])), None);
        assert_eq!(extract_text(&json!({"candidates": [{"finishReason": "SAFETY"}]})), None);
    }
}
