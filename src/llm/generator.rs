//! Question-to-SQL generation.
//!
//! Wraps an [`LlmClient`] with the fixed prompt and reply cleanup. Without a
//! client the generator runs degraded and answers every question with a
//! placeholder statement.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{RelayError, Result};
use crate::llm::parser::strip_code_fences;
use crate::llm::prompt::build_messages;
use crate::llm::LlmClient;

/// Statement returned when no generation credential is configured.
pub const PLACEHOLDER_SQL: &str = "SELECT 1;";

/// Turns natural-language questions into SQL text.
#[derive(Clone)]
pub struct SqlGenerator {
    client: Option<Arc<dyn LlmClient>>,
    model: String,
}

impl SqlGenerator {
    /// Creates a generator backed by `client`.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            model: model.into(),
        }
    }

    /// Creates a generator with no backend.
    pub fn degraded(model: impl Into<String>) -> Self {
        Self {
            client: None,
            model: model.into(),
        }
    }

    /// Returns true when no backend is configured.
    pub fn is_degraded(&self) -> bool {
        self.client.is_none()
    }

    /// Model name reported to callers.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generates SQL for `prompt`.
    ///
    /// The prompt is trimmed first; an empty prompt fails without contacting
    /// the backend. The returned text is fence-stripped but otherwise
    /// unvalidated, and it is never executed here.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(RelayError::validation("Prompt is required"));
        }

        let Some(client) = &self.client else {
            warn!("No GEMINI_API_KEY configured; returning placeholder SQL");
            return Ok(PLACEHOLDER_SQL.to_string());
        };

        let start = Instant::now();
        let reply = client.complete(&build_messages(prompt)).await.map_err(|e| {
            warn!("Generation failed: {}", e);
            match e {
                RelayError::Generation(_) => e,
                other => RelayError::generation(format!("Gemini API error: {other}")),
            }
        })?;

        let sql = strip_code_fences(&reply);
        debug!("Generated {} chars of SQL in {:?}", sql.len(), start.elapsed());
        Ok(sql)
    }
}
