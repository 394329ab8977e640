//! Result cache for download links
//!
//! Each successful filter or field-option lookup is materialized here under a
//! fresh opaque token. Entries die once, `ttl` after insertion: a deferred
//! eviction task is spawned when the entry is stored, and reads also check the
//! deadline so an expired entry is never served while that task is pending.

use crate::types::{RequestParams, Row};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// A materialized result set held for export
#[derive(Debug, Clone)]
pub struct CachedResult {
    pub token: String,
    pub rows: Vec<Row>,
    /// Request parameters that produced the rows, for the PDF filter summary
    pub params: RequestParams,
    pub created_at: DateTime<Utc>,
    expires_at: Instant,
}

impl CachedResult {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Storage policy for cached results
pub trait ReportCache: Send + Sync {
    /// Store rows and return the token that retrieves them
    fn put(&self, rows: Vec<Row>, params: RequestParams) -> String;
    /// Live entry for `token`, if any
    fn get(&self, token: &str) -> Option<Arc<CachedResult>>;
    /// Drop an entry immediately; true if it existed
    fn evict(&self, token: &str) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local cache on a concurrent map
pub struct InMemoryReportCache {
    entries: Arc<DashMap<String, Arc<CachedResult>>>,
    ttl: Duration,
}

impl InMemoryReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn from_config(config: &ledgerflow_config::CacheConfig) -> Self {
        Self::new(Duration::from_millis(config.ttl_ms))
    }

    fn schedule_eviction(&self, token: String) {
        // Outside a runtime the read-side deadline check is the only eviction.
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => return,
        };
        let entries = Arc::clone(&self.entries);
        let ttl = self.ttl;
        handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            if entries.remove(&token).is_some() {
                log::debug!("Evicted cached result {}", token);
            }
        });
    }
}

impl ReportCache for InMemoryReportCache {
    fn put(&self, rows: Vec<Row>, params: RequestParams) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let entry = CachedResult {
            token: token.clone(),
            rows,
            params,
            created_at: Utc::now(),
            expires_at: Instant::now() + self.ttl,
        };
        log::debug!("Cached {} rows under {}", entry.rows.len(), token);
        self.entries.insert(token.clone(), Arc::new(entry));
        self.schedule_eviction(token.clone());
        token
    }

    fn get(&self, token: &str) -> Option<Arc<CachedResult>> {
        let entry = self.entries.get(token).map(|e| Arc::clone(e.value()))?;
        if entry.is_expired() {
            self.entries.remove(token);
            return None;
        }
        Some(entry)
    }

    fn evict(&self, token: &str) -> bool {
        self.entries.remove(token).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ==================== Tests ====================
