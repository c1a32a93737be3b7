//! Mock generation clients for testing and offline development.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{RelayError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Reply used when no pattern matches.
const FALLBACK_SQL: &str = "SELECT 1;";

/// Mock client that returns canned SQL based on the question.
///
/// Replies are fenced the way real models usually answer, so the fence
/// stripping path is exercised too.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses.push((pattern.into(), response.into()));
        self
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        let mentions_users = input_lower.contains("user");
        let mentions_txns = input_lower.contains("transaction");

        let sql = if input_lower.contains("count") && mentions_txns {
            "SELECT COUNT(*) FROM transactions;"
        } else if input_lower.contains("count") && mentions_users {
            "SELECT COUNT(*) FROM users;"
        } else if mentions_txns && (input_lower.contains("total") || input_lower.contains("sum")) {
            "SELECT user_id, SUM(amount) AS total FROM transactions GROUP BY user_id;"
        } else if mentions_txns && mentions_users {
            "SELECT u.name, t.amount, t.txn_date, t.status\nFROM users u\nJOIN transactions t ON t.user_id = u.id;"
        } else if mentions_txns {
            "SELECT * FROM transactions;"
        } else if mentions_users {
            "SELECT * FROM users;"
        } else {
            FALLBACK_SQL
        };

        format!("```sql\n{sql}\n```")
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> &str {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.mock_response(Self::extract_user_input(messages)))
    }
}

/// A client whose every completion fails with the same generation error.
#[derive(Debug, Clone)]
pub struct FailingLlmClient {
    message: String,
}

impl FailingLlmClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn complete(&self, _messages: &[Message]) -> Result<String> {
        Err(RelayError::generation(self.message.clone()))
    }
}
