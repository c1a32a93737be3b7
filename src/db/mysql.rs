//! MySQL execution adapter.
//!
//! Provides the `MySqlClient` struct that implements the `DatabaseClient` trait
//! using sqlx. Every call opens a single connection and closes it on the way
//! out, whichever way the call ends.

use crate::config::DatabaseConfig;
use crate::db::{DatabaseClient, ExecutionResult, Row, Value};
use crate::error::{RelayError, Result};
use crate::safety::StatementKind;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError, MySqlRow};
use sqlx::{Column as SqlxColumn, Connection, Row as SqlxRow, TypeInfo};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Upper bound on rollback and close after a statement fails or times out.
/// Past it the connection is dropped and the server discards the transaction.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(2);

/// MySQL database client.
#[derive(Debug, Clone)]
pub struct MySqlClient {
    options: MySqlConnectOptions,
    database: String,
    target: String,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl MySqlClient {
    /// Creates a client for the configured database without connecting.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        let options = MySqlConnectOptions::from_str(&conn_str)
            .map_err(|e| RelayError::config(format!("Invalid database settings: {e}")))?;

        Ok(Self {
            options,
            database: config.database.clone(),
            target: config.display_string(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        })
    }

    /// Opens one connection, bounded by the connect timeout.
    async fn open(&self) -> Result<MySqlConnection> {
        debug!("Opening connection to {}", self.target);

        tokio::time::timeout(self.connect_timeout, MySqlConnection::connect_with(&self.options))
            .await
            .map_err(|_| {
                RelayError::database(format!(
                    "MySQL error: connection to {} timed out after {} seconds",
                    self.target,
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| map_connection_error(e, &self.target))
    }

    async fn run(
        &self,
        conn: &mut MySqlConnection,
        sql: &str,
        kind: StatementKind,
    ) -> Result<ExecutionResult> {
        if kind.is_mutation() {
            self.run_mutation(conn, sql, kind).await
        } else {
            self.run_select(conn, sql).await
        }
    }

    async fn run_select(&self, conn: &mut MySqlConnection, sql: &str) -> Result<ExecutionResult> {
        let rows = tokio::time::timeout(self.query_timeout, sqlx::query(sql).fetch_all(&mut *conn))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| RelayError::database(format_query_error(e)))?;

        Ok(ExecutionResult::select(rows.iter().map(convert_row).collect()))
    }

    async fn run_mutation(
        &self,
        conn: &mut MySqlConnection,
        sql: &str,
        kind: StatementKind,
    ) -> Result<ExecutionResult> {
        let mut tx = conn
            .begin()
            .await
            .map_err(|e| RelayError::database(format_query_error(e)))?;

        let outcome =
            tokio::time::timeout(self.query_timeout, sqlx::query(sql).execute(&mut *tx)).await;

        let error = match outcome {
            Ok(Ok(done)) => {
                tx.commit()
                    .await
                    .map_err(|e| RelayError::database(format_query_error(e)))?;
                return Ok(ExecutionResult::mutation(kind, done.rows_affected()));
            }
            Ok(Err(e)) => RelayError::database(format_query_error(e)),
            Err(_) => self.timeout_error(),
        };

        match tokio::time::timeout(CLEANUP_TIMEOUT, tx.rollback()).await {
            Ok(Ok(())) => debug!("Rolled back failed {}", kind),
            Ok(Err(e)) => warn!("Rollback after failed {} did not complete: {}", kind, e),
            Err(_) => warn!("Rollback after failed {} timed out, dropping connection", kind),
        }

        Err(error)
    }

    fn timeout_error(&self) -> RelayError {
        RelayError::database(format!(
            "MySQL error: query timed out after {} seconds",
            self.query_timeout.as_secs()
        ))
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn execute(&self, sql: &str, kind: StatementKind) -> Result<ExecutionResult> {
        let start = Instant::now();
        let mut conn = self.open().await?;

        let result = self.run(&mut conn, sql, kind).await;

        match tokio::time::timeout(CLEANUP_TIMEOUT, conn.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Closing connection failed: {}", e),
            Err(_) => warn!("Closing connection to {} timed out, dropping it", self.target),
        }

        match &result {
            Ok(r) => debug!(
                "{} finished in {:?}, {} row(s)",
                kind,
                start.elapsed(),
                r.row_count()
            ),
            Err(e) => debug!("{} failed in {:?}: {}", kind, start.elapsed(), e),
        }

        result
    }

    fn database_name(&self) -> &str {
        &self.database
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    let mut out = Row::new();
    for (i, col) in row.columns().iter().enumerate() {
        out.push(col.name(), convert_value(row, i, col.type_info().name()));
    }
    out
}

/// Converts a single column value from a MySqlRow to our Value type.
///
/// Decimals, JSON, enums and other textual types are read unchecked as
/// strings; anything that cannot be read that way falls back to raw bytes.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let upper = type_name.to_uppercase();

    match upper.as_str() {
        "NULL" => Value::Null,

        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(Value::UInt)
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "YEAR" => row
            .try_get_unchecked::<Option<u16>, _>(index)
            .ok()
            .flatten()
            .map(|y| Value::UInt(y as u64))
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(widen_float(v)))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),

        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null),

        "TIME" => match row.try_get::<Option<NaiveTime>, _>(index) {
            Ok(t) => t
                .map(|t| Value::String(t.format("%H:%M:%S%.f").to_string()))
                .unwrap_or(Value::Null),
            // Negative or >24h intervals are valid MySQL TIME values but not NaiveTime.
            Err(_) => Value::Null,
        },

        "BIT" => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(|bits| Value::UInt(bits_to_u64(&bits)))
            .unwrap_or(Value::Null),

        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        _ => match row.try_get_unchecked::<Option<String>, _>(index) {
            Ok(v) => v.map(Value::String).unwrap_or(Value::Null),
            Err(_) => row
                .try_get_unchecked::<Option<Vec<u8>>, _>(index)
                .ok()
                .flatten()
                .map(Value::Bytes)
                .unwrap_or(Value::Null),
        },
    }
}

/// Widens a FLOAT through its shortest decimal form, so `19.99` stays `19.99`.
fn widen_float(v: f32) -> f64 {
    v.to_string().parse().unwrap_or(f64::from(v))
}

/// BIT(M) arrives as big-endian bytes.
fn bits_to_u64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, b| (acc << 8) | u64::from(*b))
}

/// Maps sqlx connection errors to caller-facing messages.
fn map_connection_error(error: sqlx::Error, target: &str) -> RelayError {
    if error.as_database_error().is_some() {
        return RelayError::database(format_query_error(error));
    }

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        RelayError::database(format!(
            "MySQL error: cannot connect to {target}. Check that the server is running."
        ))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        RelayError::database(format!(
            "MySQL error: connection to {target} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        RelayError::database(format!("MySQL error: {error}"))
    }
}

/// Formats a query error the way the MySQL client library prints it:
/// `MySQL error: <errno> (<sqlstate>): <message>`.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return format!("MySQL error: {error}");
    };

    match db_error.try_downcast_ref::<MySqlDatabaseError>() {
        Some(mysql_error) => match mysql_error.code() {
            Some(state) => format!(
                "MySQL error: {} ({}): {}",
                mysql_error.number(),
                state,
                mysql_error.message()
            ),
            None => format!(
                "MySQL error: {}: {}",
                mysql_error.number(),
                mysql_error.message()
            ),
        },
        None => format!("MySQL error: {}", db_error.message()),
    }
}
