//! Error types for the dcilint library.

/// Errors produced outside the diagnostic flow.
///
/// Convention violations in analyzed code are *not* errors — they are
/// collected by the [`DiagnosticSink`](crate::diagnostics::DiagnosticSink).
/// `DciError` covers the operational failures around the analysis: bad
/// configuration, unreadable input, failed export writes.
#[derive(Debug, thiserror::Error)]
pub enum DciError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid naming pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DciError>;
