//! Basic types shared by the filter compiler and the field-option resolver

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One result row, keyed by column name in projection order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Raw query-string parameters of a request
pub type RequestParams = HashMap<String, String>;

/// Entry type enumeration; each variant owns one physical table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Receipt,
    Payment,
    Transfer,
}

impl Default for EntryType {
    fn default() -> Self {
        EntryType::Receipt
    }
}

impl EntryType {
    /// Table the entries of this type live in
    pub fn table(&self) -> &'static str {
        match self {
            EntryType::Receipt => "receipts",
            EntryType::Payment => "payments",
            EntryType::Transfer => "transfers",
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "receipt" => Ok(EntryType::Receipt),
            "payment" => Ok(EntryType::Payment),
            "transfer" => Ok(EntryType::Transfer),
            _ => Err(CoreError::InvalidEntryType { value: s.to_string() }),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::Receipt => write!(f, "receipt"),
            EntryType::Payment => write!(f, "payment"),
            EntryType::Transfer => write!(f, "transfer"),
        }
    }
}

// ==================== Parameter helpers ====================

/// Trimmed, non-empty value of a parameter
pub fn param<'a>(params: &'a RequestParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Parameter that must be present
pub fn required_param<'a>(params: &'a RequestParams, key: &str) -> CoreResult<&'a str> {
    param(params, key).ok_or_else(|| CoreError::missing(key))
}

/// Parse an integer identifier parameter
pub fn parse_id(key: &str, value: &str) -> CoreResult<i64> {
    value.trim().parse::<i64>().map_err(|_| CoreError::InvalidParameter {
        field: key.to_string(),
        reason: format!("'{}' is not a numeric id", value),
    })
}

/// Split a comma-separated list, dropping blanks. `None` when nothing remains.
pub fn split_list(params: &RequestParams, key: &str) -> Option<Vec<String>> {
    let values: Vec<String> = param(params, key)?
        .split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Comma-separated list of integer ids
pub fn split_id_list(params: &RequestParams, key: &str) -> CoreResult<Option<Vec<i64>>> {
    match split_list(params, key) {
        Some(values) => values
            .iter()
            .map(|v| parse_id(key, v))
            .collect::<CoreResult<Vec<i64>>>()
            .map(Some),
        None => Ok(None),
    }
}
