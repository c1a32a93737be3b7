//! MySQL execution integration tests.
//!
//! These tests require a running MySQL server. Set DATABASE_URL to a
//! `mysql://` URL for a database the user may create tables in.

use sqlx::{Connection, MySqlConnection};
use std::sync::Arc;
use std::time::{Duration, Instant};

use talktodb::config::DatabaseConfig;
use talktodb::db::{DatabaseClient, ExecutionResult, MySqlClient, Value};
use talktodb::error::RelayError;
use talktodb::query::{GateOutcome, QueryGate};
use talktodb::safety::StatementKind;

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| url.starts_with("mysql://") || url.starts_with("mariadb://"))
}

/// Helper to create a test client.
fn get_test_client() -> Option<MySqlClient> {
    let url = get_test_database_url()?;
    let config = DatabaseConfig::from_connection_string(&url).ok()?;
    MySqlClient::new(&config).ok()
}

/// A scratch table created for one test and dropped afterwards.
struct ScratchTable {
    url: String,
    name: String,
}

impl ScratchTable {
    async fn create(name: &str) -> Option<Self> {
        let url = get_test_database_url()?;
        let mut conn = MySqlConnection::connect(&url).await.ok()?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {name}"))
            .execute(&mut conn)
            .await
            .ok()?;
        sqlx::query(&format!(
            "CREATE TABLE {name} (id INT PRIMARY KEY, label VARCHAR(50) NOT NULL, amount DECIMAL(10,2), seen_at DATETIME NULL)"
        ))
        .execute(&mut conn)
        .await
        .ok()?;
        conn.close().await.ok()?;

        Some(Self {
            url,
            name: name.to_string(),
        })
    }

    async fn drop_table(self) {
        if let Ok(mut conn) = MySqlConnection::connect(&self.url).await {
            let _ = sqlx::query(&format!("DROP TABLE IF EXISTS {}", self.name))
                .execute(&mut conn)
                .await;
            let _ = conn.close().await;
        }
    }
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute(
            "SELECT 1 AS num, 'hello' AS greeting, NULL AS nothing",
            StatementKind::Select,
        )
        .await
        .unwrap();

    let ExecutionResult::Select { rows_returned, data } = result else {
        panic!("expected select result");
    };
    assert_eq!(rows_returned, 1);
    assert_eq!(
        data[0].columns().collect::<Vec<_>>(),
        ["num", "greeting", "nothing"]
    );
    assert_eq!(data[0].get("num"), Some(&Value::Int(1)));
    assert_eq!(data[0].get("nothing"), Some(&Value::Null));
}

#[tokio::test]
async fn test_insert_update_delete_round_trip() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let Some(table) = ScratchTable::create("talktodb_it_mutations").await else {
        eprintln!("Skipping test: cannot create scratch table");
        return;
    };
    let name = table.name.clone();

    let inserted = client
        .execute(
            &format!(
                "INSERT INTO {name} (id, label, amount, seen_at) VALUES (1, 'a', 10.50, '2024-01-02 03:04:05'), (2, 'b', NULL, NULL)"
            ),
            StatementKind::Insert,
        )
        .await
        .unwrap();
    assert_eq!(inserted, ExecutionResult::mutation(StatementKind::Insert, 2));

    let updated = client
        .execute(
            &format!("UPDATE {name} SET label = 'z' WHERE id = 2"),
            StatementKind::Update,
        )
        .await
        .unwrap();
    assert_eq!(updated.row_count(), 1);

    let selected = client
        .execute(
            &format!("SELECT id, label, amount, seen_at FROM {name} ORDER BY id"),
            StatementKind::Select,
        )
        .await
        .unwrap();
    let ExecutionResult::Select { data, .. } = selected else {
        panic!("expected select result");
    };
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].get("amount"), Some(&Value::from("10.50")));
    assert_eq!(
        data[0].get("seen_at"),
        Some(&Value::from("2024-01-02T03:04:05"))
    );
    assert_eq!(data[1].get("label"), Some(&Value::from("z")));
    assert_eq!(data[1].get("amount"), Some(&Value::Null));

    let deleted = client
        .execute(&format!("DELETE FROM {name}"), StatementKind::Delete)
        .await
        .unwrap();
    assert_eq!(deleted.row_count(), 2);

    table.drop_table().await;
}

#[tokio::test]
async fn test_failed_mutation_leaves_table_unchanged() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let Some(table) = ScratchTable::create("talktodb_it_rollback").await else {
        eprintln!("Skipping test: cannot create scratch table");
        return;
    };
    let name = table.name.clone();

    let err = client
        .execute(
            &format!("INSERT INTO {name} (id, label) VALUES (1, 'a'), (1, 'dup')"),
            StatementKind::Insert,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Database(_)));
    assert!(err.to_string().contains("1062"), "{err}");

    let count = client
        .execute(
            &format!("SELECT COUNT(*) AS n FROM {name}"),
            StatementKind::Select,
        )
        .await
        .unwrap();
    let ExecutionResult::Select { data, .. } = count else {
        panic!("expected select result");
    };
    assert_eq!(data[0].get("n"), Some(&Value::Int(0)));

    table.drop_table().await;
}

#[tokio::test]
async fn test_timed_out_mutation_returns_promptly() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let Some(table) = ScratchTable::create("talktodb_it_timeout").await else {
        eprintln!("Skipping test: cannot create scratch table");
        return;
    };
    let name = table.name.clone();

    let mut config = DatabaseConfig::from_connection_string(&url).unwrap();
    config.query_timeout_secs = 1;
    let client = MySqlClient::new(&config).unwrap();

    client
        .execute(
            &format!("INSERT INTO {name} (id, label) VALUES (1, 'a')"),
            StatementKind::Insert,
        )
        .await
        .unwrap();

    let start = Instant::now();
    let err = client
        .execute(
            &format!("UPDATE {name} SET label = 'late' WHERE SLEEP(10) = 0"),
            StatementKind::Update,
        )
        .await
        .unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(7), "{:?}", start.elapsed());
    assert!(err.to_string().contains("timed out"), "{err}");

    let selected = client
        .execute(&format!("SELECT label FROM {name}"), StatementKind::Select)
        .await
        .unwrap();
    let ExecutionResult::Select { data, .. } = selected else {
        panic!("expected select result");
    };
    assert_eq!(data[0].get("label"), Some(&Value::from("a")));

    table.drop_table().await;
}

#[tokio::test]
async fn test_gate_against_mysql() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let gate = QueryGate::new(Arc::new(client));

    let outcome = gate.submit("SELECT 41 + 1 AS answer", false).await.unwrap();
    let GateOutcome::Completed(ExecutionResult::Select { data, .. }) = outcome else {
        panic!("expected completed select");
    };
    assert_eq!(data[0].get("answer"), Some(&Value::Int(42)));

    let err = gate
        .submit("SELECT * FROM talktodb_missing_table_xyz", false)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("MySQL error: 1146 (42S02)"));
}
