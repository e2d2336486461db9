pub mod ai_cache_service;
pub mod archive_service;
pub mod draft_service;
pub mod local_state;
pub mod photo_service;
pub mod profile_service;
pub mod project_service;
pub mod refine_service;
pub mod report_service;

pub use ai_cache_service::AiCacheService;
pub use archive_service::{ArchiveService, ArchiveSummary, FinalSnapshot};
pub use draft_service::{DraftEntry, DraftService};
pub use local_state::LocalStateService;
pub use photo_service::{NewPhoto, PhotoService};
pub use profile_service::ProfileService;
pub use project_service::ProjectService;
pub use refine_service::RefineService;
pub use report_service::ReportService;
