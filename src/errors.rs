use std::path::PathBuf;
use thiserror::Error;

/// A result type for DoE generation errors
pub type Result<T> = std::result::Result<T, DoeError>;

/// A hard error aborting a DoE generation
#[derive(Error, Debug)]
pub enum DoeError {
    /// When a sampling method fails
    #[error(transparent)]
    Sampling(#[from] simdoe_sampling::SamplingError),
    /// When IO fails
    #[error("IO error")]
    Io(#[from] std::io::Error),
    /// When the design table cannot be serialized
    #[error("CSV error")]
    Csv(#[from] csv::Error),
    /// When configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// When configuration file cannot be read or written
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
    /// When the design file cannot be created
    #[error("cannot create DoE configuration file '{path}'")]
    WriteDesign {
        /// Requested design file
        path: PathBuf,
        /// Underlying io error
        #[source]
        source: std::io::Error,
    },
}

impl DoeError {
    /// Recovery hint to be shown along with the error cause
    pub fn hint(&self) -> &'static str {
        match self {
            DoeError::Sampling(err) => err.hint(),
            DoeError::Io(_) | DoeError::Csv(_) | DoeError::WriteDesign { .. } => {
                "check if disk is not full or set READ-ONLY"
            }
            DoeError::Config(_) => "check the design",
            DoeError::Json(_) => "check the file contents",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simdoe_sampling::SamplingError;

    #[test]
    fn test_hints() {
        let err = DoeError::from(SamplingError::Cancelled);
        assert_eq!(err.hint(), "restart the design generation");
        let err = DoeError::WriteDesign {
            path: "out/doe_1_9.csv".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.hint(), "check if disk is not full or set READ-ONLY");
        assert_eq!(
            err.to_string(),
            "cannot create DoE configuration file 'out/doe_1_9.csv'"
        );
    }
}
