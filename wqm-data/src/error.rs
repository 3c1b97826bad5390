/// Recoverable analysis errors.
///
/// None of these invalidate the loaded Dataset; callers render an explicit
/// "no data" or "flat scale" state instead of stale output.
use thiserror::Error;

/// A value set that cannot be spread over a color range.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DegenerateScale {
    /// No finite values at all
    #[error("No values to build a color scale from")]
    Empty,

    /// Every value is the same
    #[error("All {count} values equal {value}; the color scale has no range")]
    Flat { value: f64, count: usize },

    /// An explicit range whose bounds are not finite and increasing
    #[error("Invalid color scale range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error(transparent)]
    DegenerateScale(#[from] DegenerateScale),

    /// A stage produced zero rows or zero sites
    #[error("No data: {0}")]
    EmptyResult(&'static str),

    /// The parameter is not a numeric column of the dataset
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A value bound was given without naming the parameter it applies to
    #[error("A value bound needs a parameter to filter on")]
    UnboundValueFilter,

    /// No row of the dataset has this site name
    #[error("Unknown site: {0}")]
    UnknownSite(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
