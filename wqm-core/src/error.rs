/// Error types for loading, exporting and overlay handling
use thiserror::Error;

/// Fatal errors raised while turning a delimited source into a Dataset.
///
/// No partial dataset is ever produced alongside one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The source could not be parsed as delimited tabular data
    #[error("Could not read tabular data: {0}")]
    Unreadable(String),

    /// One or more of the required headers is absent
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Unreadable(err.to_string())
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Unreadable(err.to_string())
    }
}

/// Errors raised while re-serializing a Dataset
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to write CSV output
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying writer failed
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Output was not valid UTF-8 (only possible with non-UTF-8 input cells)
    #[error("Export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Errors raised while reading a boundary overlay file
#[derive(Error, Debug)]
pub enum OverlayError {
    /// The overlay file could not be opened or read
    #[error("Failed to read overlay: {0}")]
    Io(#[from] std::io::Error),

    /// The overlay is not valid JSON
    #[error("Overlay is not valid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
}
