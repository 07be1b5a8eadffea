use std::path::PathBuf;
use thiserror::Error;

/// A result type for sampling methods
pub type Result<T> = std::result::Result<T, SamplingError>;

/// An error when building a design with one of the sampling methods
#[derive(Error, Debug)]
pub enum SamplingError {
    /// When an external NOLH table file cannot be opened or read
    #[error("cannot open NOLH design file '{path}'")]
    NolhIo {
        /// File which was requested
        path: PathBuf,
        /// Underlying io error
        #[source]
        source: std::io::Error,
    },
    /// When an external NOLH table file content is not a valid table
    #[error("invalid format in NOLH file '{path}', line={line}: {reason}")]
    NolhFormat {
        /// File which was parsed
        path: PathBuf,
        /// Line number (1-based) where the problem was found
        line: usize,
        /// What is wrong with the line
        reason: String,
    },
    /// When a sampler is given parameters it cannot work with
    #[error("InvalidValue error: {0}")]
    InvalidValue(String),
    /// When the caller requested the cancellation of the sampling
    #[error("sampling cancelled")]
    Cancelled,
}

impl SamplingError {
    /// Recovery hint to be shown along with the error cause
    pub fn hint(&self) -> &'static str {
        match self {
            SamplingError::NolhIo { .. } => "check if the requested file exists",
            SamplingError::NolhFormat { .. } => "check the file contents",
            SamplingError::InvalidValue(_) => "check the design",
            SamplingError::Cancelled => "restart the design generation",
        }
    }
}
