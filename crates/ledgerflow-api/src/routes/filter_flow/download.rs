//! Report downloads for cached results
//!
//! Unknown or expired tokens answer with a plain-text 404 so a browser
//! following the link shows a readable message instead of JSON.

use crate::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use ledgerflow_core::{CachedResult, CoreError, ErrorContext};
use ledgerflow_export::{render_pdf, render_spreadsheet, report_filename, ExportError, ExportOptions, ExportResult};
use std::sync::Arc;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const NOT_FOUND_TEXT: &str = "Report not found or expired";

fn attachment(content_type: &'static str, filename: String, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename={}", filename)),
        ],
        bytes,
    )
        .into_response()
}

fn lookup(state: &AppState, filter_id: &str, context: &ErrorContext) -> Result<Arc<CachedResult>, Response> {
    match state.flow.cached(filter_id) {
        Ok(cached) => Ok(cached),
        Err(CoreError::NotFound { .. }) => {
            log::info!("{} requested unknown or expired report {}", context.operation, filter_id);
            Err((StatusCode::NOT_FOUND, NOT_FOUND_TEXT).into_response())
        }
        Err(e) => Err(ApiError::from(e).logged(context).into_response()),
    }
}

/// Run a renderer on the blocking pool; a panicked renderer maps to `wrap`
async fn render_blocking<F>(render: F, wrap: fn(tokio::task::JoinError) -> ExportError) -> ExportResult<Vec<u8>>
where
    F: FnOnce() -> ExportResult<Vec<u8>> + Send + 'static,
{
    tokio::task::spawn_blocking(render).await.map_err(wrap)?
}

/// Stream the PDF report of a cached entry result
pub async fn api_download_pdf(State(state): State<AppState>, Path(filter_id): Path<String>) -> Response {
    let context = ErrorContext::new("download_pdf");
    let cached = match lookup(&state, &filter_id, &context) {
        Ok(cached) => cached,
        Err(response) => return response,
    };

    let options = ExportOptions::from(&state.config.export);
    let rows = cached.rows.len();
    let rendered = render_blocking(move || render_pdf(&cached, Utc::now(), &options), ExportError::pdf).await;
    match rendered {
        Ok(bytes) => {
            log::info!("Serving PDF for {} ({} rows)", filter_id, rows);
            attachment(PDF_CONTENT_TYPE, report_filename("pdf"), bytes)
        }
        Err(e) => ApiError::from(e).logged(&context).into_response(),
    }
}

/// Stream the spreadsheet of a cached result
pub async fn api_download_excel(State(state): State<AppState>, Path(filter_id): Path<String>) -> Response {
    let context = ErrorContext::new("download_excel");
    let cached = match lookup(&state, &filter_id, &context) {
        Ok(cached) => cached,
        Err(response) => return response,
    };

    let rows = cached.rows.len();
    let rendered = render_blocking(move || render_spreadsheet(&cached), ExportError::spreadsheet).await;
    match rendered {
        Ok(bytes) => {
            log::info!("Serving spreadsheet for {} ({} rows)", filter_id, rows);
            attachment(XLSX_CONTENT_TYPE, report_filename("xlsx"), bytes)
        }
        Err(e) => ApiError::from(e).logged(&context).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_render_blocking_returns_output() {
        let bytes = render_blocking(|| Ok(b"%PDF".to_vec()), ExportError::pdf).await.unwrap();
        assert_eq!(bytes, b"%PDF");

        let err = render_blocking(|| Err(ExportError::spreadsheet("bad sheet")), ExportError::spreadsheet)
            .await
            .unwrap_err();
        assert_eq!(err, ExportError::Spreadsheet { message: "bad sheet".to_string() });
    }

    #[tokio::test]
    async fn test_render_blocking_panic_is_render_error() {
        let err = render_blocking(|| panic!("layout"), ExportError::pdf).await.unwrap_err();
        assert!(matches!(err, ExportError::Pdf { .. }));
    }
}
