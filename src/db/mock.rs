//! Mock database clients for testing.
//!
//! Provide in-memory execution adapters so the gate and the HTTP surface can
//! be exercised without a MySQL server.

use super::{DatabaseClient, ExecutionResult, Row};
use crate::error::{RelayError, Result};
use crate::safety::StatementKind;
use async_trait::async_trait;
use std::sync::Mutex;

/// A mock database client that returns predefined results and records every
/// statement it is asked to run.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    rows: Vec<Row>,
    affected_rows: u64,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock that returns no rows and affects no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rows returned for reads.
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Sets the affected-row count reported for mutations.
    pub fn with_affected_rows(mut self, affected_rows: u64) -> Self {
        self.affected_rows = affected_rows;
        self
    }

    /// Returns the statements executed so far, oldest first.
    pub fn executed_statements(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute(&self, sql: &str, kind: StatementKind) -> Result<ExecutionResult> {
        self.executed
            .lock()
            .map_err(|_| RelayError::internal("mock statement log poisoned"))?
            .push(sql.to_string());

        if kind.is_mutation() {
            Ok(ExecutionResult::mutation(kind, self.affected_rows))
        } else {
            Ok(ExecutionResult::select(self.rows.clone()))
        }
    }

    fn database_name(&self) -> &str {
        "mock"
    }
}

/// A database client whose every call fails with the same database error.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute(&self, _sql: &str, _kind: StatementKind) -> Result<ExecutionResult> {
        Err(RelayError::database(self.message.clone()))
    }

    fn database_name(&self) -> &str {
        "failing"
    }
}
