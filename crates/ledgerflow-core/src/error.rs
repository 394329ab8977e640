//! Error types for ledgerflow-core
//!
//! Every failure the engine can produce is a `CoreError`. Validation errors
//! are raised before any query reaches the store; store failures carry the
//! driver message for diagnostics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Required parameter absent
    MissingParameter,
    /// Parameter present but not parseable (e.g. non-numeric id)
    InvalidParameter,
    /// entryType outside receipt|payment|transfer
    InvalidEntryType,
    /// dateFilter outside the accepted vocabulary
    InvalidDateFilter,
    /// Date not in YYYY-MM-DD form
    InvalidDateFormat,
    /// Field outside the eight option fields
    InvalidField,
    /// Caller identity mismatch
    Unauthorized,
    /// Unknown or expired cache token
    NotFound,
    /// Underlying query failure
    StoreError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::MissingParameter => write!(f, "MISSING_PARAMETER"),
            ErrorCode::InvalidParameter => write!(f, "INVALID_PARAMETER"),
            ErrorCode::InvalidEntryType => write!(f, "INVALID_ENTRY_TYPE"),
            ErrorCode::InvalidDateFilter => write!(f, "INVALID_DATE_FILTER"),
            ErrorCode::InvalidDateFormat => write!(f, "INVALID_DATE_FORMAT"),
            ErrorCode::InvalidField => write!(f, "INVALID_FIELD"),
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::StoreError => write!(f, "STORE_ERROR"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    /// Offending parameter, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            field: None,
            suggestions: vec![],
        }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref field) = self.field {
            write!(f, " (field: {})", field)?;
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for ledgerflow-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("{field} is required")]
    MissingParameter { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Invalid entryType '{value}', expected receipt, payment or transfer")]
    InvalidEntryType { value: String },

    #[error("Invalid dateFilter '{value}'")]
    InvalidDateFilter { value: String },

    #[error("Invalid date format for {field}: '{value}', expected YYYY-MM-DD")]
    InvalidDateFormat { field: String, value: String },

    #[error("Invalid Field '{value}'")]
    InvalidField { value: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Report not found or expired: {token}")]
    NotFound { token: String },

    #[error("Error fetching entries: {message}")]
    StoreError { message: String },
}

impl CoreError {
    pub fn missing(field: &str) -> Self {
        CoreError::MissingParameter { field: field.to_string() }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::MissingParameter { .. } => ErrorCode::MissingParameter,
            CoreError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            CoreError::InvalidEntryType { .. } => ErrorCode::InvalidEntryType,
            CoreError::InvalidDateFilter { .. } => ErrorCode::InvalidDateFilter,
            CoreError::InvalidDateFormat { .. } => ErrorCode::InvalidDateFormat,
            CoreError::InvalidField { .. } => ErrorCode::InvalidField,
            CoreError::Unauthorized { .. } => ErrorCode::Unauthorized,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::StoreError { .. } => ErrorCode::StoreError,
        }
    }

    /// HTTP status the API layer answers with
    pub fn http_status(&self) -> u16 {
        match self {
            CoreError::MissingParameter { .. }
            | CoreError::InvalidParameter { .. }
            | CoreError::InvalidEntryType { .. }
            | CoreError::InvalidDateFilter { .. }
            | CoreError::InvalidDateFormat { .. }
            | CoreError::InvalidField { .. } => 400,
            CoreError::Unauthorized { .. } => 403,
            CoreError::NotFound { .. } => 404,
            CoreError::StoreError { .. } => 500,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::NotFound { .. } => ErrorSeverity::Info,
            CoreError::StoreError { .. } => ErrorSeverity::Error,
            _ => ErrorSeverity::Warning,
        }
    }

    /// Whether the caller sent something wrong, as opposed to the server failing
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::MissingParameter { field } => {
                details = details.with_field(field);
            }
            CoreError::InvalidParameter { field, .. } => {
                details = details.with_field(field);
            }
            CoreError::InvalidEntryType { .. } => {
                details = details
                    .with_field("entryType")
                    .with_suggestion("Use one of: receipt, payment, transfer.".to_string());
            }
            CoreError::InvalidDateFilter { .. } => {
                details = details.with_field("dateFilter").with_suggestion(
                    "Use All, CustomDate, CustomPeriod, CurrentMonth, LastMonth, CurrentFinancialYear or LastFinancialYear."
                        .to_string(),
                );
            }
            CoreError::InvalidDateFormat { field, .. } => {
                details = details.with_field(field);
            }
            CoreError::InvalidField { .. } => {
                details = details.with_field("Field").with_suggestion(
                    "Use party, referencer, category, group category, head account, payment mode, grade or custom field."
                        .to_string(),
                );
            }
            CoreError::NotFound { .. } => {
                details = details.with_suggestion(
                    "Download links expire after one hour; run the filter again.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<sqlx::Error> for CoreError {
    fn from(error: sqlx::Error) -> Self {
        CoreError::StoreError { message: error.to_string() }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Caller id from the request, when known
    pub user_id: Option<String>,
    /// Operation being performed
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            user_id: None,
            operation: operation.to_string(),
        }
    }

    pub fn with_user_id(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Error => log::error!(
                target: "ledgerflow::error",
                "{} - Operation: {} - User: {:?}",
                error.to_details(),
                context.operation,
                context.user_id
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "ledgerflow::error",
                "{} - Operation: {} - User: {:?}",
                error.to_details(),
                context.operation,
                context.user_id
            ),
            ErrorSeverity::Info => log::info!(
                target: "ledgerflow::error",
                "{} - Operation: {}",
                error.to_details(),
                context.operation
            ),
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::MissingParameter.to_string(), "MISSING_PARAMETER");
        assert_eq!(ErrorCode::InvalidDateFilter.to_string(), "INVALID_DATE_FILTER");
        assert_eq!(ErrorCode::NotFound.to_string(), "NOT_FOUND");
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(CoreError::missing("user_id").http_status(), 400);
        assert_eq!(CoreError::InvalidField { value: "x".into() }.http_status(), 400);
        assert_eq!(CoreError::Unauthorized { message: "x".into() }.http_status(), 403);
        assert_eq!(CoreError::NotFound { token: "abc".into() }.http_status(), 404);
        assert_eq!(CoreError::StoreError { message: "boom".into() }.http_status(), 500);
    }

    #[test]
    fn test_missing_parameter_message() {
        let error = CoreError::missing("user_id");
        assert_eq!(error.to_string(), "user_id is required");
        assert!(error.is_client_error());
        assert_eq!(error.to_details().field.as_deref(), Some("user_id"));
    }

    #[test]
    fn test_store_error_keeps_driver_message() {
        let error = CoreError::StoreError { message: "relation \"receipts\" does not exist".into() };
        assert_eq!(error.severity(), ErrorSeverity::Error);
        assert!(error.to_details().message.contains("receipts"));
    }

    #[test]
    fn test_details_serialize_code() {
        let details = CoreError::InvalidEntryType { value: "refund".into() }.to_details();
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["code"], "INVALID_ENTRY_TYPE");
        assert_eq!(json["field"], "entryType");
        assert!(!details.suggestions.is_empty());
    }
}
