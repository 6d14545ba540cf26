/// Integration tests for the generic query executor against a real SQLite file
///
/// Run these tests with: cargo test --test query_tests

use orabridge::dsn::DsnBuilder;
use orabridge::error::QueryStage;
use orabridge::models::EmbeddedConfig;
use orabridge::platform::NativePlatform;
use orabridge::provision::{embedded, BackendConnection, QueryConnection};
use orabridge::query::buffered::query_sqlite;
use orabridge::{EngineError, NULL_SENTINEL};
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

async fn open_store() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = DsnBuilder::new(&NativePlatform).embedded(&EmbeddedConfig {
        db_path: dir.path().join("query.db").display().to_string(),
    });
    let pool = embedded::open(&descriptor).await.unwrap();
    sqlx::raw_sql(
        "CREATE TABLE MARVIN (ID INTEGER, NOTE TEXT);
         INSERT INTO MARVIN (ID, NOTE) VALUES (7, NULL);",
    )
    .execute(&pool)
    .await
    .unwrap();
    (dir, pool)
}

#[tokio::test]
async fn test_null_becomes_sentinel() {
    let (_dir, pool) = open_store().await;

    let result = query_sqlite(&pool, "SELECT ID, NOTE FROM MARVIN").await.unwrap();
    assert_eq!(result.columns, vec!["ID".to_string(), "NOTE".to_string()]);
    assert_eq!(result.len(), 1);
    assert_eq!(result.rows[0]["ID"], "7");
    assert_eq!(result.rows[0]["NOTE"], NULL_SENTINEL);
    assert_eq!(result.first_value("NOTE"), Some("NULLABLE"));

    pool.close().await;
    println!("✓ NULL cell reported as {}", NULL_SENTINEL);
}

#[tokio::test]
async fn test_null_empty_and_null_text_stay_distinct() {
    let (_dir, pool) = open_store().await;
    sqlx::raw_sql(
        "CREATE TABLE NOTES (K INTEGER, V TEXT);
         INSERT INTO NOTES VALUES (1, ''), (2, 'NULL'), (3, 'null'), (4, NULL);",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = query_sqlite(&pool, "SELECT K, V FROM NOTES ORDER BY K").await.unwrap();
    let values: Vec<&str> = result.rows.iter().map(|r| r["V"].as_str()).collect();
    assert_eq!(values, vec!["", "NULL", "null", "NULLABLE"]);

    pool.close().await;
}

#[tokio::test]
async fn test_every_type_comes_back_as_text() {
    let (_dir, pool) = open_store().await;

    let result = query_sqlite(&pool, "SELECT 1.5 AS R, 42 AS I, x'6869' AS B, 'héllo' AS S")
        .await
        .unwrap();
    let row = &result.rows[0];
    assert_eq!(row["R"], "1.5");
    assert_eq!(row["I"], "42");
    assert_eq!(row["B"], "hi");
    assert_eq!(row["S"], "héllo");

    pool.close().await;
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let (_dir, pool) = open_store().await;

    let result = query_sqlite(&pool, "SELECT ID, NOTE FROM MARVIN WHERE ID < 0").await.unwrap();
    assert!(result.is_empty());
    assert_eq!(result.columns, vec!["ID".to_string(), "NOTE".to_string()]);
    assert_eq!(result.first_value("ID"), None);

    pool.close().await;
}

#[tokio::test]
async fn test_execute_failure_names_stage_and_sql() {
    let (_dir, pool) = open_store().await;

    let err = query_sqlite(&pool, "SELECT * FROM NO_SUCH_TABLE").await.unwrap_err();
    assert_eq!(err.stage, QueryStage::Execute);
    let text = err.to_string();
    assert!(text.starts_with("general sql [SELECT * FROM NO_SUCH_TABLE] query failed: ["), "{}", text);
    assert!(text.contains("no such table"));

    pool.close().await;
}

#[tokio::test]
async fn test_query_connection_wraps_query_error() {
    let (_dir, pool) = open_store().await;

    let ok = QueryConnection::query(&pool, "SELECT ID FROM MARVIN").await.unwrap();
    assert_eq!(ok.first_value("ID"), Some("7"));

    let err = QueryConnection::query(&pool, "SELEKT 1").await.unwrap_err();
    assert!(matches!(err, EngineError::Query(_)));

    BackendConnection::close(&pool).await;
    assert!(pool.is_closed());
}
