//! sea-orm entities for the local store.
//!
//! Synced tables (replicated by the external sync layer): projects,
//! project_equipment, contractors, user_profiles, reports,
//! report_raw_captures, photos, ai_responses, final_reports.
//!
//! Local-only tables (device state, never replicated): drafts,
//! local_state, ai_cache, refine_queue.

pub mod ai_cache;
pub mod ai_responses;
pub mod contractors;
pub mod drafts;
pub mod final_reports;
pub mod local_state;
pub mod photos;
pub mod project_equipment;
pub mod projects;
pub mod refine_queue;
pub mod report_raw_captures;
pub mod reports;
pub mod user_profiles;
