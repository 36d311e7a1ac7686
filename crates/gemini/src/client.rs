//! Blocking client for the Gemini `generateContent` endpoint.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use deckcheck_core::{Error, Part, ReasoningService, Request, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Environment variable holding the API credential.
pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
/// Optional model override.
pub const ENV_MODEL: &str = "GEMINI_MODEL";
/// Optional endpoint override, mostly for proxies and local fakes.
pub const ENV_BASE_URL: &str = "GEMINI_BASE_URL";

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// How much of an error body to keep in messages.
const ERROR_BODY_LEN: usize = 300;

/// Connection settings for [`GeminiClient`].
#[derive(Clone)]
pub struct GeminiConfig {
    api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GeminiConfig {
    /// Create a config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.0,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Fails if [`ENV_API_KEY`] is unset or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::MissingConfig(format!("{ENV_API_KEY} environment variable not set")))?;

        let mut config = Self::new(api_key.trim());
        if let Some(model) = lookup(ENV_MODEL).filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Full URL of the generateContent call for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Gemini-backed [`ReasoningService`].
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| Error::ServiceError(format!("Failed to create HTTP client: {}", e)))?;

        log::info!("Gemini client configured for model {}", config.model);
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

impl ReasoningService for GeminiClient {
    fn generate(&self, request: &Request<'_>) -> Result<String> {
        let body = build_request_body(request, self.config.temperature);
        log::debug!(
            "Sending {} request ({} parts) to {}",
            request.kind,
            request.parts.len(),
            self.config.model
        );

        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .map_err(|e| transport_error(e, request))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LEN).collect();
            return Err(Error::ServiceError(format!("Unexpected status {}: {}", status, body)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| transport_error(e, request))?;

        response_text(parsed)
    }
}

fn transport_error(e: reqwest::Error, request: &Request<'_>) -> Error {
    if e.is_timeout() {
        Error::Timeout(request.timeout)
    } else if e.is_decode() {
        Error::MalformedResponse(format!("Undecodable response body: {}", e))
    } else {
        Error::ServiceError(format!("HTTP request failed: {}", e))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    // Anything else the API may send back (function calls, etc.).
    Other(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn build_request_body(request: &Request<'_>, temperature: f32) -> GenerateContentRequest {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => ContentPart::Text {
                text: (*text).to_string(),
            },
            Part::Image { mime_type, data } => ContentPart::InlineData {
                inline_data: InlineData {
                    mime_type: (*mime_type).to_string(),
                    data: BASE64.encode(data),
                },
            },
        })
        .collect();

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: GenerationConfig { temperature },
    }
}

/// Text of the first candidate, with all of its text parts joined.
fn response_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(Error::ServiceError(format!("Prompt blocked: {}", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedResponse("response has no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(text),
            _ => None,
        })
        .collect();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(Error::MalformedResponse(format!(
            "candidate has no text (finish reason: {})",
            reason
        )));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckcheck_core::RequestKind;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = GeminiConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::MissingConfig(ref msg) if msg.contains(ENV_API_KEY)));

        let err = GeminiConfig::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).unwrap_err();
        assert!(matches!(err, Error::MissingConfig(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = GeminiConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "secret"),
            (ENV_MODEL, "gemini-2.5-pro"),
            (ENV_BASE_URL, "http://localhost:8089/"),
        ]))
        .unwrap();

        assert_eq!(
            config.endpoint(),
            "http://localhost:8089/v1beta/models/gemini-2.5-pro:generateContent"
        );
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_builder_overrides() {
        let config = GeminiConfig::new("secret")
            .with_model("gemini-2.5-pro")
            .with_base_url("http://127.0.0.1:9000/");

        assert_eq!(
            config.endpoint(),
            "http://127.0.0.1:9000/v1beta/models/gemini-2.5-pro:generateContent"
        );

        let client = GeminiClient::new(config).unwrap();
        assert_eq!(client.config().model, "gemini-2.5-pro");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GeminiConfig::new("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains(DEFAULT_MODEL));
    }

    #[test]
    fn test_request_body_shape() {
        let image = [0xFFu8, 0xD8, 0xFF];
        let request = Request::new(RequestKind::Extraction, Duration::from_secs(120))
            .text("Extract claims")
            .image("image/jpeg", &image);

        let body = serde_json::to_value(build_request_body(&request, 0.0)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Extract claims");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "/9j/");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "```json\n{\"elements\""}, {"text": ": []}\n```"}]}, "finishReason": "STOP"}]}"#,
        )
        .unwrap();

        assert_eq!(response_text(response).unwrap(), "```json\n{\"elements\": []}\n```");
    }

    #[test]
    fn test_blocked_prompt() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();

        let err = response_text(response).unwrap_err();
        assert!(matches!(err, Error::ServiceError(ref msg) if msg.contains("SAFETY")));
    }

    #[test]
    fn test_empty_candidate() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#).unwrap();

        let err = response_text(response).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(ref msg) if msg.contains("MAX_TOKENS")));
    }
}
