//! Domain-specific error types for the report data core.
//!
//! - **ReportError**: assembling, saving, and archiving reports
//! - **RefineError**: the generated-content webhook and its offline queue
//!
//! Read paths that feed UI state deliberately do not surface these types:
//! they degrade to empty defaults and log a warning instead (see the
//! service modules). The enums below cover the write paths, where a caller
//! must know the save or submission did not complete.

pub mod refine;
pub mod report;

pub use refine::RefineError;
pub use report::ReportError;

/// Result type alias for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type alias for refine operations
pub type RefineResult<T> = Result<T, RefineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_result_alias() {
        let result: ReportResult<()> = Err(ReportError::NoActiveProject);
        assert!(result.is_err());
    }

    #[test]
    fn refine_result_alias() {
        let result: RefineResult<()> = Err(RefineError::QueueEmpty("r1".to_string()));
        assert!(result.is_err());
    }
}
