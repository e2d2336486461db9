use thiserror::Error;

/// Errors raised by the report save and archival pipelines.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A save was requested with no active project in the session
    #[error("No active project; cannot save a report without one")]
    NoActiveProject,

    /// Report header not found by id
    #[error("Report {0} not found")]
    NotFound(String),

    /// Serializing or deserializing a persisted JSON region failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A store operation exceeded its budget
    #[error("Store operation timed out: {0}")]
    Timeout(String),
}

impl ReportError {
    /// True when retrying on the next debounced save is the right response.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Timeout(_))
    }
}
