use crate::series::FloatValue;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum FWFError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("No ocean level bound {relation} {target} m. The depth window lies outside the vertical grid")]
    LevelNotFound {
        relation: &'static str,
        target: FloatValue,
    },
    #[error("Weighted mean over {0} is undefined: every weight is zero")]
    EmptySelection(String),
    #[error("Shape mismatch for {what}: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("Inconsistent experiment state: {0}")]
    StateConsistency(String),
    #[error("Could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {} at line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("Response function {} has {found} coefficients, expected {expected}", .path.display())]
    KernelLength {
        path: PathBuf,
        found: usize,
        expected: usize,
    },
    #[error("NetCDF error: {0}")]
    NetCDF(String),
}

impl FWFError {
    /// Wrap an I/O error together with the path that caused it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FWFError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience type for `Result<T, FWFError>`.
pub type FWFResult<T> = Result<T, FWFError>;
