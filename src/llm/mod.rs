//! SQL generation for TalkToDB.
//!
//! Provides the client trait for generation backends, the Gemini and mock
//! implementations, and the [`SqlGenerator`] the HTTP surface calls.

mod factory;
mod gemini;
mod generator;
mod mock;
mod parser;
mod prompt;
mod types;

pub use factory::{create_client, create_generator};
pub use gemini::{GeminiClient, GeminiConfig, ModelInfo};
pub use generator::{SqlGenerator, PLACEHOLDER_SQL};
pub use mock::{FailingLlmClient, MockLlmClient};
pub use parser::strip_code_fences;
pub use prompt::{build_messages, SYSTEM_PROMPT};
pub use types::{Message, Role};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Trait for generation clients.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Returns the complete response as a single string.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// Generation provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Google Gemini
    #[default]
    Gemini,
    /// Canned responses (no API key required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
