//! Error types for dashboard lookups

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Dashboard lookup errors
#[derive(Debug, Error)]
pub enum StockError {
    /// A required input (company name, start or end date) was not supplied
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// An input was supplied but is not acceptable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The listed-company directory could not be fetched or parsed
    #[error("Company directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// No listed company carries the given name
    #[error("'{input}' was not found")]
    NotFound { input: String },

    /// The provider answered successfully with zero trading rows
    #[error("No price data for {ticker} between {start} and {end}")]
    EmptyResult {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// Too few trading rows to derive a summary
    #[error("Insufficient data: {rows} trading row(s), at least 2 required")]
    InsufficientData { rows: usize },

    /// Price provider returned an error response
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Spreadsheet encoding or decoding failed
    #[error("Export error: {0}")]
    ExportError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Coarse error category consumed by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInput,
    DirectoryUnavailable,
    NotFound,
    EmptyResult,
    UnexpectedFailure,
}

/// How loudly a failure should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl ErrorKind {
    pub fn severity(self) -> Severity {
        match self {
            ErrorKind::EmptyResult => Severity::Info,
            ErrorKind::MissingInput | ErrorKind::NotFound => Severity::Warning,
            ErrorKind::DirectoryUnavailable | ErrorKind::UnexpectedFailure => Severity::Error,
        }
    }
}

impl StockError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StockError::MissingInput(_) | StockError::InvalidInput(_) => ErrorKind::MissingInput,
            StockError::DirectoryUnavailable(_) => ErrorKind::DirectoryUnavailable,
            StockError::NotFound { .. } => ErrorKind::NotFound,
            StockError::EmptyResult { .. } | StockError::InsufficientData { .. } => {
                ErrorKind::EmptyResult
            }
            _ => ErrorKind::UnexpectedFailure,
        }
    }

    /// Follow-up suggestion shown next to the message, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            StockError::NotFound { .. } | StockError::DirectoryUnavailable(_) => {
                Some("Try entering the 6-digit ticker code directly.")
            }
            StockError::MissingInput(_) => {
                Some("Enter a company name and select both a start and an end date.")
            }
            _ => None,
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for StockError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        StockError::ExportError(err.to_string())
    }
}

impl From<calamine::XlsxError> for StockError {
    fn from(err: calamine::XlsxError) -> Self {
        StockError::ExportError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockError::NotFound {
            input: "없는회사".to_string(),
        };
        assert_eq!(err.to_string(), "'없는회사' was not found");

        let err = StockError::InsufficientData { rows: 1 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: 1 trading row(s), at least 2 required"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            StockError::MissingInput("name".into()).kind(),
            ErrorKind::MissingInput
        );
        assert_eq!(
            StockError::InvalidInput("range".into()).kind(),
            ErrorKind::MissingInput
        );
        assert_eq!(
            StockError::InsufficientData { rows: 0 }.kind(),
            ErrorKind::EmptyResult
        );
        assert_eq!(
            StockError::ParseError("bad".into()).kind(),
            ErrorKind::UnexpectedFailure
        );
        assert_eq!(ErrorKind::EmptyResult.severity(), Severity::Info);
        assert_eq!(ErrorKind::UnexpectedFailure.severity(), Severity::Error);
    }

    #[test]
    fn test_not_found_hint() {
        let err = StockError::NotFound { input: "x".into() };
        assert!(err.hint().is_some_and(|h| h.contains("6-digit")));
        assert!(StockError::Other("x".into()).hint().is_none());
    }
}
