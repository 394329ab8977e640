//! Relational store access
//!
//! The engine only ever reads. `EntryStore` is the seam between compiled
//! queries and whatever executes them: Postgres in production, an in-memory
//! table set for tests and local runs.

use crate::error::{CoreError, CoreResult};
use crate::query::{SelectQuery, SqlParam};
use crate::types::Row;
use async_trait::async_trait;
use ledgerflow_config::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

/// Executes compiled queries and returns rows as ordered JSON maps
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn fetch_rows(&self, query: &SelectQuery) -> CoreResult<Vec<Row>>;
}

// ==================== Postgres ====================

/// Initialize a connection pool to the PostgreSQL database
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn fetch_rows(&self, query: &SelectQuery) -> CoreResult<Vec<Row>> {
        let rendered = query.render_json_rows();
        log::debug!("Executing: {} with {} params", rendered.sql, rendered.params.len());

        let mut q = sqlx::query_scalar::<_, Json<Row>>(&rendered.sql);
        for p in &rendered.params {
            q = match p {
                SqlParam::Int(v) => q.bind(*v),
                SqlParam::Text(s) => q.bind(s.clone()),
                SqlParam::Date(d) => q.bind(*d),
                SqlParam::IntList(v) => q.bind(v.clone()),
                SqlParam::TextList(v) => q.bind(v.clone()),
            };
        }

        let rows = q.fetch_all(&self.pool).await.map_err(|e| {
            log::error!("Query against {} failed: {}", query.table, e);
            CoreError::from(e)
        })?;

        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }
}

// ==================== In-memory ====================

/// Store over in-memory tables, evaluated with the same predicate semantics
/// as the rendered SQL.
#[derive(Default)]
pub struct MemoryEntryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    queried: Mutex<Vec<String>>,
    failure: RwLock<Option<String>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to a table
    pub fn insert(&self, table: &str, rows: Vec<Row>) {
        if let Ok(mut tables) = self.tables.write() {
            tables.entry(table.to_string()).or_default().extend(rows);
        }
    }

    /// Make every subsequent query fail with `message`
    pub fn fail_with(&self, message: &str) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = Some(message.to_string());
        }
    }

    /// Tables queried so far, in order
    pub fn queried_tables(&self) -> Vec<String> {
        self.queried.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn fetch_rows(&self, query: &SelectQuery) -> CoreResult<Vec<Row>> {
        if let Ok(mut queried) = self.queried.lock() {
            queried.push(query.table.to_string());
        }

        if let Some(message) = self.failure.read().ok().and_then(|f| f.clone()) {
            return Err(CoreError::StoreError { message });
        }

        let tables = self.tables.read().map_err(|_| CoreError::StoreError {
            message: "memory store lock poisoned".to_string(),
        })?;
        let rows = tables.get(query.table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(query.evaluate(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Direction, Predicate};
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_evaluates_query() {
        let store = MemoryEntryStore::new();
        store.insert(
            "receipts",
            vec![
                row(json!({"id": 1, "user_id": 1, "created_at": "2025-01-01T00:00:00"})),
                row(json!({"id": 2, "user_id": 1, "created_at": "2025-02-01T00:00:00"})),
                row(json!({"id": 3, "user_id": 9, "created_at": "2025-03-01T00:00:00"})),
            ],
        );

        let query = SelectQuery::from("receipts")
            .filter(Predicate::Eq { column: "user_id", value: SqlParam::Int(1) })
            .order_by("created_at", Direction::Desc);
        let rows = store.fetch_rows(&query).await.unwrap();

        let ids: Vec<i64> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(store.queried_tables(), vec!["receipts".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_store_failure() {
        let store = MemoryEntryStore::new();
        store.fail_with("connection refused");
        let result = store.fetch_rows(&SelectQuery::from("payments")).await;
        assert_eq!(
            result,
            Err(CoreError::StoreError { message: "connection refused".to_string() })
        );
    }

    #[tokio::test]
    async fn test_missing_table_is_empty() {
        let store = MemoryEntryStore::new();
        let rows = store.fetch_rows(&SelectQuery::from("transfers")).await.unwrap();
        assert!(rows.is_empty());
    }
}
