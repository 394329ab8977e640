//! Filter-flow JSON endpoint
//!
//! Endpoints:
//! - api_filter_entry_flow: entries (no `Field`) or field options (`Field` set)

use crate::{ApiError, AppState};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use ledgerflow_config::Config;
use ledgerflow_core::types::{param, parse_id};
use ledgerflow_core::{CoreError, ErrorContext, FilterFlow, RequestParams};
use serde_json::{json, Value};

/// Caller identity set by an upstream auth layer
pub const CALLER_HEADER: &str = "x-user-id";

/// Reject requests whose `user_id` differs from the authenticated caller.
/// Ids compare numerically. Without the header no check is made.
pub fn check_caller(headers: &HeaderMap, params: &RequestParams) -> Result<(), CoreError> {
    let Some(raw) = headers.get(CALLER_HEADER) else {
        return Ok(());
    };
    let caller = raw
        .to_str()
        .ok()
        .and_then(|text| parse_id(CALLER_HEADER, text).ok())
        .ok_or_else(|| CoreError::Unauthorized {
            message: format!("{} header is not a numeric id", CALLER_HEADER),
        })?;

    // A missing or malformed user_id is left to parameter validation.
    let requested = param(params, "user_id").and_then(|v| parse_id("user_id", v).ok());
    match requested {
        Some(user_id) if user_id != caller => Err(CoreError::Unauthorized {
            message: format!("caller {} may not read entries of user {}", caller, user_id),
        }),
        _ => Ok(()),
    }
}

/// Scheme and authority for download links
pub fn base_url(config: &Config, headers: &HeaderMap) -> String {
    let configured = config
        .export
        .public_base_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());
    if let Some(url) = configured {
        return url.trim_end_matches('/').to_string();
    }

    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) if !host.is_empty() => format!("http://{}", host),
        _ => format!("http://{}", config.bind_addr()),
    }
}

fn pdf_link(base: &str, token: &str) -> String {
    format!("{}/api/filter-flow/download/{}", base, token)
}

fn excel_link(base: &str, token: &str) -> String {
    format!("{}/api/filter-flow/download-excel/{}", base, token)
}

/// Filter entries or list field options (JSON API)
pub async fn api_filter_entry_flow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RequestParams>,
) -> Result<Json<Value>, ApiError> {
    let context = ErrorContext::new("filter_entry_flow").with_user_id(param(&params, "user_id"));
    check_caller(&headers, &params).map_err(|e| ApiError::from(e).logged(&context))?;

    let today = chrono::Local::now().date_naive();
    let base = base_url(&state.config, &headers);

    if FilterFlow::is_field_request(&params) {
        let outcome = state
            .flow
            .field_options(&params, today)
            .await
            .map_err(|e| ApiError::from(e).logged(&context))?;

        return Ok(Json(json!({
            "success": true,
            "field": outcome.field,
            "options": outcome.rows,
            "downloadExcelLink": excel_link(&base, &outcome.token),
        })));
    }

    let outcome = state
        .flow
        .filter_entries(&params, today)
        .await
        .map_err(|e| ApiError::from(e).logged(&context))?;

    Ok(Json(json!({
        "success": true,
        "count": outcome.rows.len(),
        "entries": outcome.rows,
        "downloadPdfLink": pdf_link(&base, &outcome.token),
        "downloadExcelLink": excel_link(&base, &outcome.token),
    })))
}
