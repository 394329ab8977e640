//! Entry filter and field-option query engine
//!
//! `FilterFlow` ties the pieces together: parameters are validated into a
//! `FilterSpec` or `FieldOptionSpec`, compiled to a `SelectQuery`, executed
//! through an `EntryStore`, and the rows are parked in a `ReportCache` so
//! they can be downloaded later.

pub mod cache;
pub mod error;
pub mod field_options;
pub mod filter;
pub mod query;
pub mod store;
pub mod time;
pub mod types;

use chrono::NaiveDate;
use std::sync::Arc;

pub use cache::{CachedResult, InMemoryReportCache, ReportCache};
pub use error::{CoreError, CoreResult, ErrorCode, ErrorContext, ErrorLogger, DefaultErrorLogger};
pub use field_options::{FieldKind, FieldOptionSpec};
pub use filter::FilterSpec;
pub use store::{EntryStore, MemoryEntryStore, PgEntryStore};
pub use time::{DateFilter, DateRange, DateVocabulary};
pub use types::{EntryType, RequestParams, Row};

/// Rows of an entry filter plus the cache token for downloads
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub rows: Vec<Row>,
    pub token: String,
}

/// Options of one field plus the cache token for downloads
#[derive(Debug, Clone)]
pub struct FieldOptionsOutcome {
    pub field: FieldKind,
    pub rows: Vec<Row>,
    pub token: String,
}

/// Request-facing engine; cheap to share behind an `Arc`
pub struct FilterFlow {
    store: Arc<dyn EntryStore>,
    cache: Arc<dyn ReportCache>,
}

impl FilterFlow {
    pub fn new(store: Arc<dyn EntryStore>, cache: Arc<dyn ReportCache>) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &Arc<dyn ReportCache> {
        &self.cache
    }

    /// True when the request asks for field options rather than entries
    pub fn is_field_request(params: &RequestParams) -> bool {
        types::param(params, "Field").is_some()
    }

    /// Filter entries of one type, newest first, and cache the result
    pub async fn filter_entries(&self, params: &RequestParams, today: NaiveDate) -> CoreResult<FilterOutcome> {
        let spec = FilterSpec::from_params(params)?;
        let query = spec.compile(today);
        log::info!(
            "Filtering {} for user {} (date filter: {})",
            spec.entry_type.table(),
            spec.user_id,
            spec.date_filter.description()
        );

        let rows = self.store.fetch_rows(&query).await?;
        let token = self.cache.put(rows.clone(), params.clone());
        log::info!("Filter returned {} rows, cached as {}", rows.len(), token);

        Ok(FilterOutcome { rows, token })
    }

    /// List candidate values of a reference field and cache the result
    pub async fn field_options(&self, params: &RequestParams, today: NaiveDate) -> CoreResult<FieldOptionsOutcome> {
        let spec = FieldOptionSpec::from_params(params)?;
        let query = spec.compile(today);
        log::info!("Resolving '{}' options for user {}", spec.field, spec.user_id);

        let rows: Vec<Row> = self
            .store
            .fetch_rows(&query)
            .await?
            .iter()
            .map(|row| spec.field.trim_row(row))
            .collect();
        let token = self.cache.put(rows.clone(), params.clone());

        Ok(FieldOptionsOutcome {
            field: spec.field,
            rows,
            token,
        })
    }

    /// Cached result for a download token
    pub fn cached(&self, token: &str) -> CoreResult<Arc<CachedResult>> {
        self.cache.get(token).ok_or_else(|| CoreError::NotFound {
            token: token.to_string(),
        })
    }
}

// ==================== Tests ====================
