use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::entities::{ai_responses, photos, report_raw_captures, reports};
use crate::errors::{ReportError, ReportResult};
use crate::project::Project;
use crate::report::{CaptureMode, RawEntries, Report, ReportStatus, Weather};
use crate::services::ai_cache_service::{AiCacheService, PREEMPT_WINDOW};
use crate::services::photo_service::photo_view;
use crate::session::ReportSession;

/// Assembles one report aggregate from its four persisted sources and
/// writes it back: header upsert plus a transactional replace of the
/// raw-capture row. Reads never fail: a missing or unreadable report
/// becomes a fresh one seeded from the project.
#[derive(Clone)]
pub struct ReportService {
    db: DatabaseConnection,
    storage_base_url: String,
}

impl ReportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            storage_base_url: String::new(),
        }
    }

    pub fn with_storage_base(mut self, url: impl Into<String>) -> Self {
        self.storage_base_url = url.into();
        self
    }

    /// Load the report for (project, date), or by explicit header id when
    /// one is known (e.g. after a redirect). Falls back to a fresh report
    /// on not-found and on store errors.
    pub async fn load_session(
        &self,
        project: Option<Project>,
        date: &str,
        report_id: Option<&str>,
    ) -> ReportSession {
        match self.try_load(project.as_ref(), date, report_id).await {
            Ok(Some((report, id))) => ReportSession::new(project, report, Some(id), date),
            Ok(None) => {
                ReportSession::new(project.clone(), Report::fresh(project.as_ref(), date), None, date)
            }
            Err(err) => {
                warn!("loading report for {date} failed, starting fresh: {err}");
                ReportSession::new(project.clone(), Report::fresh(project.as_ref(), date), None, date)
            }
        }
    }

    async fn try_load(
        &self,
        project: Option<&Project>,
        date: &str,
        report_id: Option<&str>,
    ) -> Result<Option<(Report, String)>, DbErr> {
        let mut header = None;
        if let Some(id) = report_id {
            header = reports::Entity::find_by_id(id).one(&self.db).await?;
        }
        if header.is_none() {
            if let Some(project) = project {
                header = reports::Entity::find()
                    .filter(reports::Column::ProjectId.eq(project.id.as_str()))
                    .filter(reports::Column::ReportDate.eq(date))
                    .one(&self.db)
                    .await?;
            }
        }
        let Some(header) = header else {
            return Ok(None);
        };

        let raw_capture = report_raw_captures::Entity::find()
            .filter(report_raw_captures::Column::ReportId.eq(header.id.as_str()))
            .one(&self.db)
            .await?;
        let photo_rows = photos::Entity::find()
            .filter(photos::Column::ReportId.eq(header.id.as_str()))
            .order_by_asc(photos::Column::CreatedAt)
            .all(&self.db)
            .await?;

        // A just-generated payload preempts the persisted rows for one read
        let cache = AiCacheService::new(self.db.clone());
        let mut generated = cache.take_fresh(&header.id, PREEMPT_WINDOW).await;
        if generated.is_none() {
            generated = self.latest_response(&header.id).await?;
        }

        let mut report = Report::fresh(project, &header.report_date);
        report.meta.created_at = header.created_at;
        report.meta.last_saved = Some(header.updated_at);
        report.meta.status = ReportStatus::parse(&header.status);
        report.meta.report_viewed = true;
        report.overview.date = header.report_date.clone();
        report.overview.completed_by = header.inspector_name.clone();

        if let Some(capture) = raw_capture {
            report.meta.capture_mode = CaptureMode::parse(&capture.capture_mode);
            report.field_notes.freeform_notes = capture.freeform_notes;
            report.guided_notes.work_summary = capture.work_summary;
            report.guided_notes.issues = capture.issues_notes.clone();
            report.guided_notes.safety = capture.safety_notes.clone();
            report.issues = capture.issues_notes;
            report.safety.notes = capture.safety_notes;
            if let Ok(weather) = serde_json::from_str::<Weather>(&capture.weather_json) {
                report.overview.weather = weather;
            }
            match serde_json::from_str::<RawEntries>(&capture.entries_json) {
                Ok(entries) => report.apply_raw_entries(entries),
                Err(err) => warn!("entries region for {} is unreadable: {err}", header.id),
            }
        }

        report.photos = photo_rows
            .iter()
            .map(|row| photo_view(row, &self.storage_base_url))
            .collect();
        report.ai_generated = generated;

        Ok(Some((report, header.id)))
    }

    async fn latest_response(&self, report_id: &str) -> Result<Option<serde_json::Value>, DbErr> {
        let row = ai_responses::Entity::find()
            .filter(ai_responses::Column::ReportId.eq(report_id))
            .order_by_desc(ai_responses::Column::CreatedAt)
            .one(&self.db)
            .await?;
        Ok(row.and_then(|r| serde_json::from_str(&r.response_json).ok()))
    }

    /// Persist the session's report. Idempotent and safe to call on every
    /// debounced edit. A save arriving while another runs is dropped; the
    /// debounce restart on the next edit is the retry.
    pub async fn save(
        &self,
        session: &mut ReportSession,
        inspector_fallback: Option<&str>,
    ) -> ReportResult<()> {
        let Some(project) = session.project.clone() else {
            return Err(ReportError::NoActiveProject);
        };
        let Some(_guard) = session.begin_save() else {
            debug!("save already in flight, dropping this request");
            return Ok(());
        };

        let date = session.report_date.clone();
        let now = Utc::now();

        // Step 1: resolve or mint the header id. The lookup guards against
        // duplicate rows when another device already created the header.
        let report_id = match session.report_id.clone() {
            Some(id) => id,
            None => {
                let existing = reports::Entity::find()
                    .filter(reports::Column::ProjectId.eq(project.id.as_str()))
                    .filter(reports::Column::ReportDate.eq(date.as_str()))
                    .one(&self.db)
                    .await?;
                existing
                    .map(|row| row.id)
                    .unwrap_or_else(|| Uuid::new_v4().to_string())
            }
        };

        let inspector = if session.report.overview.completed_by.is_empty() {
            inspector_fallback.unwrap_or_default().to_string()
        } else {
            session.report.overview.completed_by.clone()
        };

        // Step 2: header upsert, last-write-wins at row level
        let existing = reports::Entity::find_by_id(&report_id).one(&self.db).await?;
        match existing {
            Some(row) => {
                let mut active: reports::ActiveModel = row.into();
                active.inspector_name = Set(inspector);
                active.status = Set(session.report.meta.status.as_str().to_string());
                active.updated_at = Set(now);
                active.update(&self.db).await?;
            }
            None => {
                reports::ActiveModel {
                    id: Set(report_id.clone()),
                    project_id: Set(project.id.clone()),
                    report_date: Set(date.clone()),
                    inspector_name: Set(inspector),
                    status: Set(session.report.meta.status.as_str().to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?;
            }
        }
        session.report_id = Some(report_id.clone());

        // Steps 3-4: serialize the nested lists and replace the raw-capture
        // row atomically. Delete-then-insert inside one transaction keeps
        // the one-row-per-report invariant under retries; the completed
        // header upsert above is deliberately not rolled back on failure.
        let report = &session.report;
        let entries = report.to_raw_entries(now);
        let entries_json = serde_json::to_string(&entries)?;
        let weather_json = serde_json::to_string(&report.overview.weather)?;
        let issues_notes = if report.issues.is_empty() {
            report.guided_notes.issues.clone()
        } else {
            report.issues.clone()
        };
        let safety_notes = if report.safety.notes.is_empty() {
            report.guided_notes.safety.clone()
        } else {
            report.safety.notes.clone()
        };

        let txn = self.db.begin().await?;
        report_raw_captures::Entity::delete_many()
            .filter(report_raw_captures::Column::ReportId.eq(report_id.as_str()))
            .exec(&txn)
            .await?;
        report_raw_captures::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            report_id: Set(report_id.clone()),
            capture_mode: Set(report.meta.capture_mode.as_str().to_string()),
            freeform_notes: Set(report.field_notes.freeform_notes.clone()),
            work_summary: Set(report.guided_notes.work_summary.clone()),
            issues_notes: Set(issues_notes),
            safety_notes: Set(safety_notes),
            weather_json: Set(weather_json),
            entries_json: Set(entries_json),
            captured_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        session.report.meta.last_saved = Some(now);
        info!("report {report_id} saved");
        Ok(())
    }

    /// Update the header status (refine pipeline and submission mark
    /// progress through it).
    pub async fn update_status(&self, report_id: &str, status: ReportStatus) -> ReportResult<()> {
        let row = reports::Entity::find_by_id(report_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ReportError::NotFound(report_id.to_string()))?;
        let mut active: reports::ActiveModel = row.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::entities::projects;
    use crate::database::test_utils::setup_test_db;
    use crate::report::Activity;
    use sea_orm::PaginatorTrait;
    use serde_json::json;

    /// Seed a minimal project + report header pair for tests that exercise
    /// child tables directly.
    pub async fn seed_report_header(
        db: &DatabaseConnection,
        project_id: &str,
        report_id: &str,
        date: &str,
    ) {
        let now = Utc::now();
        projects::ActiveModel {
            id: Set(project_id.to_string()),
            project_name: Set(format!("Project {project_id}")),
            location: Set(String::new()),
            status: Set("active".to_string()),
            prime_contractor: Set(String::new()),
            engineer: Set(String::new()),
            logo_url: Set(None),
            cno_solicitation_no: Set(String::new()),
            noab_project_no: Set(String::new()),
            contract_duration: Set(String::new()),
            notice_to_proceed: Set(String::new()),
            expected_completion: Set(String::new()),
            weather_days: Set(0),
            default_start_time: Set(String::new()),
            default_end_time: Set(String::new()),
            created_by: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed project");

        reports::ActiveModel {
            id: Set(report_id.to_string()),
            project_id: Set(project_id.to_string()),
            report_date: Set(date.to_string()),
            inspector_name: Set(String::new()),
            status: Set("draft".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed report header");
    }

    fn test_project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            project_name: "Seeded".to_string(),
            ..Default::default()
        }
    }

    async fn seed_project_row(db: &DatabaseConnection, id: &str) {
        let now = Utc::now();
        projects::ActiveModel {
            id: Set(id.to_string()),
            project_name: Set("Seeded".to_string()),
            location: Set(String::new()),
            status: Set("active".to_string()),
            prime_contractor: Set(String::new()),
            engineer: Set(String::new()),
            logo_url: Set(None),
            cno_solicitation_no: Set(String::new()),
            noab_project_no: Set(String::new()),
            contract_duration: Set(String::new()),
            notice_to_proceed: Set(String::new()),
            expected_completion: Set(String::new()),
            weather_days: Set(0),
            default_start_time: Set(String::new()),
            default_end_time: Set(String::new()),
            created_by: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed project row");
    }

    #[tokio::test]
    async fn save_twice_keeps_one_raw_capture_row() {
        let db = setup_test_db().await;
        seed_project_row(&db, "p1").await;
        let service = ReportService::new(db.clone());

        let mut session =
            service.load_session(Some(test_project("p1")), "2026-03-02", None).await;
        session.record_edit("issues", json!("Crane arrived late"));
        service.save(&mut session, None).await.unwrap();
        service.save(&mut session, None).await.unwrap();

        let report_id = session.report_id.clone().unwrap();
        let rows = report_raw_captures::Entity::find()
            .filter(report_raw_captures::Column::ReportId.eq(report_id.as_str()))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let headers = reports::Entity::find().count(&db).await.unwrap();
        assert_eq!(headers, 1);
    }

    #[tokio::test]
    async fn save_without_project_is_an_error() {
        let db = setup_test_db().await;
        let service = ReportService::new(db);
        let mut session = service.load_session(None, "2026-03-02", None).await;
        let err = service.save(&mut session, None).await.unwrap_err();
        assert!(matches!(err, ReportError::NoActiveProject));
    }

    #[tokio::test]
    async fn lookup_before_insert_reuses_existing_header() {
        let db = setup_test_db().await;
        seed_report_header(&db, "p1", "r-existing", "2026-03-02").await;
        let service = ReportService::new(db.clone());

        // A second session without the cached id must find the same row
        let mut session =
            ReportSession::new(Some(test_project("p1")), Report::default(), None, "2026-03-02");
        service.save(&mut session, None).await.unwrap();
        assert_eq!(session.report_id.as_deref(), Some("r-existing"));
    }

    #[tokio::test]
    async fn assembled_report_round_trips_entries() {
        let db = setup_test_db().await;
        seed_project_row(&db, "p1").await;
        let service = ReportService::new(db.clone());

        let mut session =
            service.load_session(Some(test_project("p1")), "2026-03-02", None).await;
        session.report.activities.push(Activity {
            contractor_id: "c1".to_string(),
            narrative: "Set rebar".to_string(),
            ..Default::default()
        });
        session.record_edit("qaqc", json!("Slump test passed"));
        service.save(&mut session, None).await.unwrap();

        let reloaded = service
            .load_session(Some(test_project("p1")), "2026-03-02", None)
            .await;
        assert_eq!(reloaded.report_id, session.report_id);
        assert_eq!(reloaded.report.activities.len(), 1);
        assert_eq!(reloaded.report.activities[0].narrative, "Set rebar");
        assert_eq!(
            reloaded.report.user_edits.get("qaqc"),
            Some(&json!("Slump test passed"))
        );
    }

    #[tokio::test]
    async fn inspector_falls_back_to_profile_name() {
        let db = setup_test_db().await;
        seed_project_row(&db, "p1").await;
        let service = ReportService::new(db.clone());

        let mut session =
            service.load_session(Some(test_project("p1")), "2026-03-02", None).await;
        service.save(&mut session, Some("R. Inspector")).await.unwrap();

        let header = reports::Entity::find_by_id(session.report_id.clone().unwrap())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(header.inspector_name, "R. Inspector");
    }
}
