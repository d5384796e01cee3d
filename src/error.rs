//! Error types shared by the report builder, renderer and HTTP boundary.

use thiserror::Error;

/// Result alias used across the crate.
pub type ReportResult<T> = Result<T, ReportError>;

/// Failures that can occur while turning a request into a report document.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Caller supplied data that cannot produce a report (e.g. no expenses).
    #[error("{0}")]
    Validation(String),

    /// The request body could not be decoded into a report request.
    #[error("{0}")]
    MalformedRequest(String),

    /// The sum of the kept prices does not fit into a `Decimal`.
    #[error("Expense total exceeds the supported range")]
    TotalOverflow,

    /// Layout or serialization of the PDF document failed.
    #[error("{0}")]
    Render(#[from] genpdf::error::Error),

    /// No usable font family could be loaded.
    #[error("Failed to load fonts: {0}")]
    FontLoad(#[source] genpdf::error::Error),

    /// Any other unexpected failure.
    #[error("{0}")]
    Internal(String),
}

impl ReportError {
    /// Returns the HTTP status code this error maps to.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::MalformedRequest(_)
            | Self::TotalOverflow
            | Self::Render(_)
            | Self::FontLoad(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Whether the caller, rather than the service, is at fault.
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
