//! Error types for analysis runs.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort an analysis run.
///
/// Resolution misses are never errors; they produce external stand-ins.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The language tag does not name a known language.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The registry has no capability bundle for the language.
    #[error("No {capability} registered for language `{language}`")]
    MissingCapability {
        capability: &'static str,
        language: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error while reading a source file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The collector could not process a file.
    #[error("Collect failed for {path}: {message}")]
    Collect { path: String, message: String },

    /// The extractor could not process a file.
    #[error("Extract failed for {path}: {message}")]
    Extract { path: String, message: String },

    /// The worker pool could not be created.
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl AnalysisError {
    /// Create a collect error.
    pub fn collect(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collect {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an extract error.
    pub fn extract(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extract {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an IO error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error comes from configuration rather than a file.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLanguage(_)
                | Self::MissingCapability { .. }
                | Self::InvalidConfig(_)
                | Self::WorkerPool(_)
        )
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
