//! Error types for the link catalog bot.
//!
//! Library crates use [`LinkCatalogError`] via `thiserror`.
//! The bot binary wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all link catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkCatalogError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Webpage fetch failed (transport, timeout, non-2xx, non-HTML).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The content-analysis service could not be reached or refused the request.
    #[error("analysis error: {0}")]
    Analysis(String),

    /// The model replied, but not with the structured data we asked for.
    #[error("analysis reply could not be parsed: {message}")]
    AnalysisParse { message: String },

    /// Remote dataset read or write failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The dataset changed between read and write.
    #[error("revision conflict on {path}: the dataset was modified concurrently")]
    RevisionConflict { path: String },

    /// User input is not one of the category labels.
    #[error("invalid category: {label:?}")]
    InvalidCategory { label: String },

    /// Session store failure.
    #[error("session store error: {0}")]
    SessionStore(String),

    /// Chat transport failure (Telegram API, outbound messages).
    #[error("channel error: {0}")]
    Channel(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LinkCatalogError>;

impl LinkCatalogError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an analysis parse error from any displayable message.
    pub fn analysis_parse(msg: impl Into<String>) -> Self {
        Self::AnalysisParse {
            message: msg.into(),
        }
    }

    /// Create an invalid-category error for the given user input.
    pub fn invalid_category(label: impl Into<String>) -> Self {
        Self::InvalidCategory {
            label: label.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the remote dataset (read, write, or conflict).
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::RevisionConflict { .. })
    }
}
