//! Database abstraction layer for TalkToDB.
//!
//! Provides the execution adapter interface the confirmation gate runs
//! accepted statements through, plus the MySQL and test implementations.

mod mock;
mod mysql;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use types::{ExecutionResult, Row, Value};

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::safety::StatementKind;
use async_trait::async_trait;

/// Creates the database client for the given configuration.
///
/// No connection is opened here; each [`DatabaseClient::execute`] call opens
/// and releases its own.
pub fn connect(config: &DatabaseConfig) -> Result<Box<dyn DatabaseClient>> {
    Ok(Box::new(MySqlClient::new(config)?))
}

/// Trait defining the interface for the execution adapter.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Runs one statement that the gate has already accepted.
    ///
    /// Reads return rows. Mutations run in a transaction that is committed on
    /// success and rolled back on any error before the error is returned.
    async fn execute(&self, sql: &str, kind: StatementKind) -> Result<ExecutionResult>;

    /// Name of the database statements run against, for display.
    fn database_name(&self) -> &str;
}
