//! Report rendering for cached filter results

pub mod format;
pub mod pdf;
pub mod xlsx;

use chrono::Utc;
use ledgerflow_config::ExportConfig;
use std::fmt::Display;
use thiserror::Error;

pub use pdf::{filter_summary, render_pdf};
pub use xlsx::render_spreadsheet;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("PDF rendering failed: {message}")]
    Pdf { message: String },

    #[error("Spreadsheet rendering failed: {message}")]
    Spreadsheet { message: String },
}

impl ExportError {
    pub fn pdf(err: impl Display) -> Self {
        ExportError::Pdf {
            message: err.to_string(),
        }
    }

    pub fn spreadsheet(err: impl Display) -> Self {
        ExportError::Spreadsheet {
            message: err.to_string(),
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Presentation settings for rendered reports
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub currency_symbol: String,
    pub decimal_places: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            currency_symbol: "Rs.".to_string(),
            decimal_places: 2,
        }
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            currency_symbol: config.currency_symbol.clone(),
            decimal_places: config.decimal_places,
        }
    }
}

/// Download filename, e.g. `entries-report-1718000000000.pdf`
pub fn report_filename(extension: &str) -> String {
    format!("entries-report-{}.{}", Utc::now().timestamp_millis(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_core::{CachedResult, InMemoryReportCache, ReportCache, Row};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn cached(rows: Vec<Row>) -> Arc<CachedResult> {
        let cache = InMemoryReportCache::new(Duration::from_secs(60));
        let params = [("dateFilter".to_string(), "currentmonth".to_string())]
            .into_iter()
            .collect();
        let token = cache.put(rows, params);
        cache.get(&token).unwrap()
    }

    fn entry(id: i64) -> Row {
        json!({
            "id": id,
            "receipt_no": format!("R-{}", id),
            "created_at": "2025-06-01T09:30:00",
            "party_name": "Northwind Traders",
            "amount": 1500.25,
            "payment_mode": "Cash",
            "status": if id % 2 == 0 { "credit" } else { "debit" },
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_report_filename() {
        let name = report_filename("pdf");
        assert!(name.starts_with("entries-report-"));
        assert!(name.ends_with(".pdf"));
        let millis = &name["entries-report-".len()..name.len() - 4];
        assert!(millis.parse::<i64>().is_ok());
    }

    #[test]
    fn test_pdf_single_page() {
        let result = cached(vec![entry(1), entry(2)]);
        let bytes = render_pdf(&result, Utc::now(), &ExportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_many_pages_and_empty() {
        let result = cached((1..=120).map(entry).collect());
        let bytes = render_pdf(&result, Utc::now(), &ExportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let empty = cached(Vec::new());
        let bytes = render_pdf(&empty, Utc::now(), &ExportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_xlsx_is_zip() {
        let result = cached(vec![entry(1), json!({"id": 2}).as_object().cloned().unwrap()]);
        let bytes = render_spreadsheet(&result).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let empty = cached(Vec::new());
        assert!(render_spreadsheet(&empty).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_options_from_config() {
        let config = ExportConfig {
            public_base_url: None,
            currency_symbol: "$".to_string(),
            decimal_places: 0,
        };
        assert_eq!(
            ExportOptions::from(&config),
            ExportOptions {
                currency_symbol: "$".to_string(),
                decimal_places: 0
            }
        );
    }
}
