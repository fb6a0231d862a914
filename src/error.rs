use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Dashboard errors
// ---------------------------------------------------------------------------

/// Everything that can keep a chart (or the whole dashboard) from rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("'{}' not found. Please ensure the file is in the correct directory.", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("'{}' has an unsupported extension (expected .csv, .json, .parquet)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read '{}': {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("No data available for {view}.")]
    EmptySelection { view: String },

    #[error("Please select two different manufacturers to plot.")]
    InvalidManufacturerPair,

    #[error("Column '{column}' is not available in the dataset.")]
    InvalidColumnChoice { column: String },
}

/// How a [`DashboardError`] is surfaced in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Halts the dashboard.
    Error,
    Warning,
    Info,
}

impl DashboardError {
    pub fn empty(view: impl Into<String>) -> Self {
        DashboardError::EmptySelection { view: view.into() }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DashboardError::FileNotFound { .. }
            | DashboardError::UnsupportedFormat { .. }
            | DashboardError::Malformed { .. } => Severity::Error,
            DashboardError::InvalidManufacturerPair
            | DashboardError::InvalidColumnChoice { .. } => Severity::Warning,
            DashboardError::EmptySelection { .. } => Severity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_path() {
        let err = DashboardError::FileNotFound {
            path: PathBuf::from("./vehicles_us_cleaned.csv"),
        };
        assert!(err.to_string().contains("./vehicles_us_cleaned.csv"));
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn selection_problems_are_recoverable() {
        assert_eq!(DashboardError::empty("x").severity(), Severity::Info);
        assert_eq!(
            DashboardError::InvalidManufacturerPair.severity(),
            Severity::Warning
        );
    }
}
