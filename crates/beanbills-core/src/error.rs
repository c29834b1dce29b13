//! Error types for beanbills-core
//!
//! Every failure of the save, includes and completion paths maps to a
//! `CoreError`, which carries an error code, a severity and suggestions for
//! the person at the keyboard.

use thiserror::Error;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

use beanbills_parser::ParseError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No folder can be derived from the bill
    ValidationError,
    /// Target folder or file already present
    AlreadyExists,
    /// Header pattern not found
    ParseError,
    /// Include markers missing from the main file
    StructuralError,
    /// Filesystem failure
    IoError,
    /// Configuration error
    ConfigError,
    /// Malformed payload value
    InvalidFormat,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::AlreadyExists => write!(f, "ALREADY_EXISTS"),
            ErrorCode::ParseError => write!(f, "PARSE_ERROR"),
            ErrorCode::StructuralError => write!(f, "STRUCTURAL_ERROR"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
            ErrorCode::InvalidFormat => write!(f, "INVALID_FORMAT"),
        }
    }
}

/// Detailed error information for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Path involved (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
            file: None,
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    /// Add the path involved
    pub fn with_file(mut self, file: String) -> Self {
        self.file = Some(file);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        if let Some(ref file) = self.file {
            write!(f, "\nLocation: {}", file)?;
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Warning - operation skipped or needs attention
    Warning,
    /// Error - operation failed
    Error,
    /// Critical - nothing can work until fixed
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for beanbills-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Structural error: {message}")]
    StructuralError { message: String },

    #[error("IO error on {path}: {message}")]
    IoError { path: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid format for {field}: {value}")]
    InvalidFormat { field: String, value: String },
}

impl CoreError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: &Path, error: io::Error) -> Self {
        CoreError::IoError {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            CoreError::ParseError { .. } => ErrorCode::ParseError,
            CoreError::StructuralError { .. } => ErrorCode::StructuralError,
            CoreError::IoError { .. } => ErrorCode::IoError,
            CoreError::ConfigError { .. } => ErrorCode::ConfigError,
            CoreError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::ValidationError { .. } => ErrorSeverity::Error,
            CoreError::AlreadyExists { .. } => ErrorSeverity::Error,
            CoreError::ParseError { .. } => ErrorSeverity::Warning,
            CoreError::StructuralError { .. } => ErrorSeverity::Critical,
            CoreError::IoError { .. } => ErrorSeverity::Error,
            CoreError::ConfigError { .. } => ErrorSeverity::Critical,
            CoreError::InvalidFormat { .. } => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::ValidationError { message } => {
                details = details.with_detail(serde_json::json!({ "validation_message": message }));
                details = details.with_suggestion(
                    "Add at least one transaction, balance or note to the bill.".to_string(),
                );
            }
            CoreError::AlreadyExists { path } => {
                details = details.with_file(path.clone());
                details = details.with_suggestion(
                    "Nothing was overwritten. Rename or remove the existing entry by hand.".to_string(),
                );
                details = details.with_suggestion(
                    "Or change the payee, narration or date so the folder name differs.".to_string(),
                );
            }
            CoreError::ParseError { message } => {
                details = details.with_detail(serde_json::json!({ "parse_message": message }));
                details = details.with_suggestion(
                    "The first line must look like: 2016-02-12 * \"Payee\" \"Narration\"".to_string(),
                );
            }
            CoreError::StructuralError { .. } => {
                details = details.with_suggestion(
                    "Restore the begin and end marker lines in the main ledger file.".to_string(),
                );
            }
            CoreError::IoError { path, .. } => {
                details = details.with_file(path.clone());
                details = details.with_suggestion(
                    "Check that the path exists and is writable.".to_string(),
                );
            }
            CoreError::InvalidFormat { field, value } => {
                details = details.with_detail(serde_json::json!({ "field": field, "value": value }));
                details = details.with_suggestion(
                    "Dates are YYYY-MM-DD and amounts plain decimals such as -5.50.".to_string(),
                );
            }
            CoreError::ConfigError { .. } => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<ParseError> for CoreError {
    fn from(error: ParseError) -> Self {
        CoreError::ParseError {
            message: error.to_string(),
        }
    }
}

/// One log record for a failed operation
fn error_line(error: &CoreError, operation: &str) -> String {
    format!(
        "{} [{}] {} - Operation: {}",
        error.severity().to_string().to_uppercase(),
        error.code(),
        error.to_details(),
        operation
    )
}

/// Error logger trait
pub trait ErrorLogger {
    /// Log an error
    fn log_error(&self, error: &CoreError, operation: &str);
    /// Log a warning
    fn log_warning(&self, message: &str, operation: &str);
}

/// Default error logger using log crate
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, operation: &str) {
        let line = error_line(error, operation);
        match error.severity() {
            ErrorSeverity::Warning => log::warn!(target: "beanbills::error", "{}", line),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                log::error!(target: "beanbills::error", "{}", line)
            }
        }
    }

    fn log_warning(&self, message: &str, operation: &str) {
        log::warn!(
            target: "beanbills::error",
            "WARNING: {} - Operation: {}",
            message,
            operation
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::AlreadyExists.to_string(), "ALREADY_EXISTS");
        assert_eq!(ErrorCode::StructuralError.to_string(), "STRUCTURAL_ERROR");
        assert_eq!(ErrorCode::ParseError.to_string(), "PARSE_ERROR");
    }

    #[test]
    fn test_core_error_code_and_severity() {
        let error = CoreError::AlreadyExists { path: "bills/2016/02/x".to_string() };
        assert_eq!(error.code(), ErrorCode::AlreadyExists);
        assert_eq!(error.severity(), ErrorSeverity::Error);

        let error = CoreError::StructuralError { message: "markers".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_from_parse_error() {
        let error: CoreError = ParseError::NoMatches.into();
        assert_eq!(error.code(), ErrorCode::ParseError);
        assert_eq!(error.to_string(), "Parse error: no matches");
    }

    #[test]
    fn test_error_line_carries_severity() {
        let error = CoreError::StructuralError { message: "markers".to_string() };
        let line = error_line(&error, "rebuild_includes");
        assert!(line.starts_with("CRITICAL [STRUCTURAL_ERROR] Structural error: markers"));
        assert!(line.ends_with("Operation: rebuild_includes"));

        let error: CoreError = ParseError::NoMatches.into();
        assert!(error_line(&error, "extract_completions").starts_with("WARNING [PARSE_ERROR]"));
    }

    #[test]
    fn test_io_error_keeps_path() {
        let error = CoreError::io(
            Path::new("/nope/bill.beancount"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let details = error.to_details();
        assert_eq!(details.file.as_deref(), Some("/nope/bill.beancount"));
        assert!(details.message.contains("denied"));
    }

    #[test]
    fn test_already_exists_details() {
        let error = CoreError::AlreadyExists { path: "bills/2016/02/x".to_string() };
        let details = error.to_details();
        assert_eq!(details.code, ErrorCode::AlreadyExists);
        assert_eq!(details.suggestions.len(), 2);
        assert!(details.to_string().contains("Location: bills/2016/02/x"));
    }

    #[test]
    fn test_invalid_format_details() {
        let error = CoreError::InvalidFormat {
            field: "transactions[0].date".to_string(),
            value: "tomorrow".to_string(),
        };
        let details = error.to_details();
        assert!(details.details.is_some());
        assert_eq!(error.to_string(), "Invalid format for transactions[0].date: tomorrow");
    }
}
