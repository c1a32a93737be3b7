//! Google Gemini client implementation.
//!
//! Implements the LlmClient trait for the Generative Language REST API and
//! exposes model listing for the `list-models` command.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{RelayError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Header carrying the API key, so the key never appears in request URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Model resource name (e.g., "models/gemini-2.5-flash").
    pub model: String,
    /// API base URL, without a trailing slash.
    pub api_base: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Creates a config with the given API key and model and default endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            api_key: api_key.into(),
            model: model.into(),
            api_base: defaults.api_base,
            timeout_secs: defaults.timeout_secs,
        }
    }

    /// Builds a config from the `[llm]` section and a resolved key.
    pub fn from_llm_config(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the model name with its `models/` prefix.
    pub fn model_resource(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }
}

/// A model visible to the configured key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Returns true if the model can serve `generateContent`.
    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

/// One `list-models` line: models that can generate SQL are starred.
impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.supports_generation() { '*' } else { ' ' };
        write!(f, "{marker} {}", self.name)?;
        if let Some(display_name) = &self.display_name {
            write!(f, " ({display_name})")?;
        }
        Ok(())
    }
}

/// Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    /// Creates a new Gemini client with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.api_base,
            self.config.model_resource()
        )
    }

    /// Splits messages into the system instruction and the turn contents.
    fn build_request(messages: &[Message]) -> GenerateRequest {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let system_instruction = (!system.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: system.join("\n\n"),
            }],
        });

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: Some(m.role.as_str().to_string()),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GenerateRequest {
            system_instruction,
            contents,
        }
    }

    /// Maps a non-2xx response to a generation error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> RelayError {
        if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(body) {
            return RelayError::generation(format!(
                "Gemini API error: {}",
                error_response.error.message
            ));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return RelayError::generation(
                "Gemini API error: authentication failed. Check your GEMINI_API_KEY.",
            );
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return RelayError::generation("Gemini API error: rate limited. Try again later.");
        }

        RelayError::generation(format!("Gemini API error ({}): {}", status, body.trim()))
    }

    fn map_request_error(e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            RelayError::generation("Gemini API error: request timed out")
        } else if e.is_connect() {
            RelayError::generation("Gemini API error: failed to connect. Check your network.")
        } else {
            RelayError::generation(format!("Gemini API error: {}", e))
        }
    }

    /// Sends a request and returns the body of a successful response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            RelayError::generation(format!("Gemini API error: failed to read response: {}", e))
        })?;

        if status.is_success() {
            Ok(body)
        } else {
            warn!("Gemini API returned {}", status);
            Err(Self::parse_error(status, &body))
        }
    }

    /// Lists every model available to the configured key, following pages.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/models", self.config.api_base);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let body = self.send(request).await?;
            let page: ListModelsResponse = serde_json::from_str(&body).map_err(|e| {
                RelayError::generation(format!("Gemini API error: malformed model list: {}", e))
            })?;

            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Gemini listed {} model(s)", models.len());
        Ok(models)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = Self::build_request(messages);
        debug!("Gemini generateContent request to {}", self.config.model);

        let body = self
            .send(self.client.post(self.generate_url()).json(&request))
            .await?;

        let response: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            RelayError::generation(format!("Gemini API error: malformed response: {}", e))
        })?;

        response.text().ok_or_else(|| match response.prompt_feedback {
            Some(PromptFeedback {
                block_reason: Some(reason),
            }) => RelayError::generation(format!("Gemini API error: prompt blocked ({reason})")),
            _ => RelayError::generation("Gemini API error: response contained no text"),
        })
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
