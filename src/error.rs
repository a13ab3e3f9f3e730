//! Unified error handling for the activity-skyline library.
//!
//! Every fallible operation (loading records, aggregating, building and
//! writing the skyline) reports through [`SkylineError`].

use thiserror::Error;

/// Unified error type for activity-skyline operations.
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error), uniffi(flat_error))]
pub enum SkylineError {
    /// Date range is reversed or spans more than one calendar year
    #[error("Invalid date range {min} to {max}: {message}")]
    InvalidDateRange {
        min: String,
        max: String,
        message: String,
    },
    /// A date bound could not be parsed
    #[error("Could not parse date '{value}' (expected {expected})")]
    DateParse { value: String, expected: String },
    /// A required column is absent from the activity export
    #[error("Missing required column '{column}'")]
    MissingColumn { column: String },
    /// A row of the activity export could not be interpreted
    #[error("Invalid record on line {line}: {message}")]
    InvalidRecord { line: u64, message: String },
    /// Grid data does not have the 52x7 shape
    #[error("Grid must be {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    InvalidGridShape {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },
    /// A grid cell or builder parameter is out of its allowed domain
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },
    /// Grid has no positive cell, so bar heights cannot be scaled
    #[error("Grid has no positive cell; nothing to scale")]
    EmptyGrid,
    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for activity-skyline operations.
pub type Result<T> = std::result::Result<T, SkylineError>;

impl SkylineError {
    pub(crate) fn invalid_parameter(name: &str, message: impl Into<String>) -> Self {
        SkylineError::InvalidParameter {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn missing_column(column: &str) -> Self {
        SkylineError::MissingColumn {
            column: column.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SkylineError::InvalidDateRange {
            min: "12/1/2023".to_string(),
            max: "1/31/2024".to_string(),
            message: "bounds must share a calendar year".to_string(),
        };
        assert!(err.to_string().contains("12/1/2023"));
        assert!(err.to_string().contains("calendar year"));

        let err = SkylineError::missing_column("Distance");
        assert_eq!(err.to_string(), "Missing required column 'Distance'");
    }

    #[test]
    fn test_io_conversion() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(SkylineError::Io(_))));
    }
}
