use std::path::PathBuf;
use thiserror::Error;

/// An error from soak.
#[derive(Debug, Error)]
pub enum SoakError {
    /// The run configuration could not be loaded or is invalid.
    #[error("{0}")]
    Config(String),

    /// A fault not attributable to any single test.
    #[error("harness fault: {0}")]
    Harness(String),

    /// A report file or its directory could not be written.
    #[error("failed to write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JUnit document could not be serialized.
    #[error("failed to serialize JUnit report {}: {message}", path.display())]
    Junit { path: PathBuf, message: String },

    /// The mail dispatcher rejected the report.
    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SoakError {
    /// Wrap an io error raised while writing the report at `path`.
    pub fn report(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SoakError::Report {
            path: path.into(),
            source,
        }
    }
}
