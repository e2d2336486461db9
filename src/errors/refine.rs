use thiserror::Error;

/// Errors raised by the refine webhook call and its offline queue.
#[derive(Error, Debug)]
pub enum RefineError {
    /// The webhook request could not be sent or timed out
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a non-success status
    #[error("Webhook returned status {0}")]
    Status(u16),

    /// No webhook URL configured
    #[error("No refine webhook URL configured")]
    NotConfigured,

    /// The report has no header row yet; save before refining
    #[error("Report has not been saved yet; nothing to refine")]
    Unsaved,

    /// Retry requested but nothing is queued for the report
    #[error("No queued refine payload for report {0}")]
    QueueEmpty(String),

    /// Persisting the response or the queued payload failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The response body was not the expected JSON shape
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
