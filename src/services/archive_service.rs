use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::entities::{final_reports, projects};
use crate::errors::{ReportError, ReportResult};
use crate::project::Project;
use crate::report::{Report, ReportStatus};
use crate::resolve::{FieldSpec, Resolver};
use crate::services::ai_cache_service::AiCacheService;
use crate::services::draft_service::DraftService;
use crate::services::photo_service::PhotoService;
use crate::services::report_service::ReportService;

/// The flattened, immutable snapshot written at submission time.
#[derive(Debug, Clone, Default)]
pub struct FinalSnapshot {
    pub project_id: String,
    pub report_id: String,
    pub report_date: String,

    pub executive_summary: String,
    pub work_performed: String,
    pub materials_used: String,
    pub delays_issues: String,
    pub inspector_notes: String,

    pub general_condition: String,
    pub high_temp: String,
    pub low_temp: String,
    pub precipitation: String,
    pub wind_speed: String,
    pub humidity: String,

    pub has_work_performed: bool,
    pub has_materials: bool,
    pub has_delays: bool,
    pub has_visitors: bool,
    pub has_safety: bool,
    pub has_photos: bool,

    pub work_performed_json: String,
    pub materials_json: String,
    pub delays_json: String,
    pub visitors_json: String,
    pub safety_json: String,
    pub photos_json: String,

    pub work_performed_notes: String,
    pub materials_notes: String,
    pub delays_notes: String,
    pub visitors_notes: String,
    pub safety_notes: String,

    pub pdf_url: String,
    pub pdf_storage_path: String,
}

#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub id: String,
    pub project_id: String,
    pub project_name: String,
    pub report_date: String,
    pub submitted_at: DateTime<Utc>,
}

/// Submission and archive access. Submitting writes the denormalized
/// snapshot, marks the header, and then clears the temporary artifacts
/// the archived copy supersedes. The cleanup is best-effort and never
/// blocks a successful submission.
#[derive(Clone)]
pub struct ArchiveService {
    db: DatabaseConnection,
    drafts: DraftService,
    ai_cache: AiCacheService,
    photos: PhotoService,
    reports: ReportService,
}

impl ArchiveService {
    pub fn new(db: DatabaseConnection) -> Self {
        let drafts = DraftService::new(db.clone());
        let ai_cache = AiCacheService::new(db.clone());
        let photos = PhotoService::new(db.clone());
        let reports = ReportService::new(db.clone());
        Self {
            db,
            drafts,
            ai_cache,
            photos,
            reports,
        }
    }

    /// Flatten a reconciled report into the snapshot shape. Field values
    /// run through the precedence resolver so submissions reflect exactly
    /// what the review screen showed.
    pub fn build_snapshot(report: &Report, project: &Project, report_id: Option<&str>) -> FinalSnapshot {
        let resolver = Resolver::new(report);

        let work_narratives: Vec<&str> = report
            .activities
            .iter()
            .filter(|a| !a.no_work && !a.narrative.is_empty())
            .map(|a| a.narrative.as_str())
            .collect();
        let work_performed = if work_narratives.is_empty() {
            if report.guided_notes.work_summary.is_empty() {
                report.field_notes.freeform_notes.clone()
            } else {
                report.guided_notes.work_summary.clone()
            }
        } else {
            work_narratives.join("\n\n")
        };

        let delays_issues = resolver.resolve_text(
            "issues",
            FieldSpec::new("issues", "issues_delays").with_legacy("generalIssues"),
            &report.guided_notes.issues,
        );
        let safety_notes = resolver.resolve_text(
            "safety.notes",
            FieldSpec::new("safety.notes", "safety.summary").with_legacy("safety.notes"),
            &report.guided_notes.safety,
        );
        let visitors = resolver.resolve_text(
            "visitors",
            FieldSpec::new("visitors", "visitors_deliveries").with_legacy("visitorsRemarks"),
            "",
        );
        let executive_summary = resolver.resolve_text(
            "executiveSummary",
            FieldSpec::new("executiveSummary", "executive_summary"),
            "",
        );
        let materials_used = resolver.resolve_text(
            "materialsUsed",
            FieldSpec::new("materialsUsed", "materials_used"),
            "",
        );

        let weather = &report.overview.weather;
        FinalSnapshot {
            project_id: project.id.clone(),
            report_id: report_id.unwrap_or_default().to_string(),
            report_date: report.overview.date.clone(),
            executive_summary,
            work_performed: work_performed.clone(),
            materials_used: materials_used.clone(),
            delays_issues: delays_issues.clone(),
            inspector_notes: report.field_notes.freeform_notes.clone(),
            general_condition: weather.general_condition.clone(),
            high_temp: weather.high_temp.clone(),
            low_temp: weather.low_temp.clone(),
            precipitation: weather.precipitation.clone(),
            wind_speed: String::new(),
            humidity: String::new(),
            has_work_performed: !work_performed.is_empty(),
            has_materials: !materials_used.is_empty(),
            has_delays: !delays_issues.is_empty(),
            has_visitors: !visitors.is_empty(),
            has_safety: report.safety.has_incident || !safety_notes.is_empty(),
            has_photos: !report.photos.is_empty(),
            work_performed_json: serde_json::to_string(&report.activities).unwrap_or_default(),
            materials_json: json!({ "notes": materials_used }).to_string(),
            delays_json: json!({ "notes": delays_issues }).to_string(),
            visitors_json: json!({ "notes": visitors.clone() }).to_string(),
            safety_json: json!({
                "hasIncident": report.safety.has_incident,
                "notes": safety_notes.clone(),
            })
            .to_string(),
            photos_json: serde_json::to_string(&report.photos).unwrap_or_default(),
            work_performed_notes: report.guided_notes.work_summary.clone(),
            materials_notes: String::new(),
            delays_notes: report.guided_notes.issues.clone(),
            visitors_notes: visitors,
            safety_notes,
            pdf_url: String::new(),
            pdf_storage_path: String::new(),
        }
    }

    /// Write the archived row and run cleanup. Returns the archive id.
    pub async fn submit(&self, snapshot: FinalSnapshot, submitted_by: &str) -> ReportResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        final_reports::ActiveModel {
            id: Set(id.clone()),
            project_id: Set(snapshot.project_id.clone()),
            report_id: Set(snapshot.report_id.clone()),
            report_date: Set(snapshot.report_date.clone()),
            submitted_at: Set(now),
            submitted_by: Set(submitted_by.to_string()),
            executive_summary: Set(snapshot.executive_summary),
            work_performed: Set(snapshot.work_performed),
            materials_used: Set(snapshot.materials_used),
            delays_issues: Set(snapshot.delays_issues),
            inspector_notes: Set(snapshot.inspector_notes),
            general_condition: Set(snapshot.general_condition),
            high_temp: Set(snapshot.high_temp),
            low_temp: Set(snapshot.low_temp),
            precipitation: Set(snapshot.precipitation),
            wind_speed: Set(snapshot.wind_speed),
            humidity: Set(snapshot.humidity),
            has_work_performed: Set(snapshot.has_work_performed),
            has_materials: Set(snapshot.has_materials),
            has_delays: Set(snapshot.has_delays),
            has_visitors: Set(snapshot.has_visitors),
            has_safety: Set(snapshot.has_safety),
            has_photos: Set(snapshot.has_photos),
            work_performed_json: Set(snapshot.work_performed_json),
            materials_json: Set(snapshot.materials_json),
            delays_json: Set(snapshot.delays_json),
            visitors_json: Set(snapshot.visitors_json),
            safety_json: Set(snapshot.safety_json),
            photos_json: Set(snapshot.photos_json),
            work_performed_notes: Set(snapshot.work_performed_notes),
            materials_notes: Set(snapshot.materials_notes),
            delays_notes: Set(snapshot.delays_notes),
            visitors_notes: Set(snapshot.visitors_notes),
            safety_notes: Set(snapshot.safety_notes),
            pdf_url: Set(snapshot.pdf_url),
            pdf_storage_path: Set(snapshot.pdf_storage_path),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        if !snapshot.report_id.is_empty() {
            if let Err(err) = self
                .reports
                .update_status(&snapshot.report_id, ReportStatus::Submitted)
                .await
            {
                warn!("marking header {} submitted failed: {err}", snapshot.report_id);
            }
        }

        self.clear_after_submit(&snapshot.project_id, &snapshot.report_date, &snapshot.report_id)
            .await;

        info!("report archived as {id}");
        Ok(id)
    }

    /// Free the temporary artifacts the archived snapshot supersedes: the
    /// draft for (project, date), the generated-content latch, and photo
    /// rows that never uploaded. Failures are logged, not retried.
    pub async fn clear_after_submit(&self, project_id: &str, date: &str, report_id: &str) {
        if let Err(err) = self.drafts.delete(project_id, date).await {
            warn!("draft cleanup for {project_id}_{date} failed: {err}");
        }
        if !report_id.is_empty() {
            if let Err(err) = self.ai_cache.clear(report_id).await {
                warn!("generated-content cache cleanup for {report_id} failed: {err}");
            }
            match self.photos.delete_pending_for_report(report_id).await {
                Ok(count) if count > 0 => info!("removed {count} pending photo rows for {report_id}"),
                Ok(_) => {}
                Err(err) => warn!("photo cleanup for {report_id} failed: {err}"),
            }
        }
    }

    /// Recent archives, newest first, with project names stitched in (the
    /// store does not join). Empty on timeout or store errors.
    pub async fn list(&self, limit: u64) -> Vec<ArchiveSummary> {
        crate::utils::soft_timeout(
            self.query_list(limit),
            std::time::Duration::from_secs(5),
            "list_archives",
        )
        .await
        .unwrap_or_default()
    }

    async fn query_list(&self, limit: u64) -> Result<Vec<ArchiveSummary>, DbErr> {
        let rows = final_reports::Entity::find()
            .order_by_desc(final_reports::Column::SubmittedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        let project_rows = projects::Entity::find().all(&self.db).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let project_name = project_rows
                    .iter()
                    .find(|p| p.id == row.project_id)
                    .map(|p| p.project_name.clone())
                    .unwrap_or_else(|| "Unknown Project".to_string());
                ArchiveSummary {
                    id: row.id,
                    project_id: row.project_id,
                    project_name,
                    report_date: row.report_date,
                    submitted_at: row.submitted_at,
                }
            })
            .collect())
    }

    pub async fn get(&self, archive_id: &str) -> ReportResult<final_reports::Model> {
        final_reports::Entity::find_by_id(archive_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ReportError::NotFound(archive_id.to_string()))
    }

    /// Archived snapshots are immutable; deletion is the only mutation.
    pub async fn delete(&self, archive_id: &str) -> ReportResult<()> {
        let result = final_reports::Entity::delete_by_id(archive_id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ReportError::NotFound(archive_id.to_string()));
        }
        Ok(())
    }
}
