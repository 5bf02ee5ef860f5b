//! Application-wide error types.
//!
//! Library modules use specific error variants via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - Per-file pipeline failures are caught at the worker boundary and
//!   reported as warnings; nothing here is fatal to a batch except
//!   startup-time misconfiguration.

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tag reading/writing error
    #[error("Metadata error for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Catalog client error
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Fingerprint recognizer error
    #[error("Fingerprint error: {0}")]
    Fingerprint(String),

    /// Lyrics lookup error
    #[error("Lyrics error: {0}")]
    Lyrics(String),

    /// Timed out waiting for a path lock
    #[error("Timed out waiting for lock on {0}")]
    LockTimeout(PathBuf),

    /// File organization error
    #[error("Organization error: {0}")]
    Organize(String),

    /// Extension outside the supported set
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a metadata error.
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a catalog error.
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }

    /// Create a fingerprint error.
    pub fn fingerprint(message: impl Into<String>) -> Self {
        Self::Fingerprint(message.into())
    }

    /// Create a lyrics error.
    pub fn lyrics(message: impl Into<String>) -> Self {
        Self::Lyrics(message.into())
    }

    /// Create an organization error.
    pub fn organize(message: impl Into<String>) -> Self {
        Self::Organize(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
