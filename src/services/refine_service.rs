use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::entities::refine_queue;
use crate::errors::{RefineError, RefineResult};
use crate::report::ReportStatus;
use crate::services::ai_cache_service::AiCacheService;
use crate::services::report_service::ReportService;
use crate::session::ReportSession;

const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Calls the external refine webhook that turns captured notes into
/// generated report content. The webhook is a remote function that either
/// returns a JSON payload or fails; on failure the request payload is
/// queued locally and the report parks in `pending_refine` until the user
/// retries.
#[derive(Clone)]
pub struct RefineService {
    db: DatabaseConnection,
    http: reqwest::Client,
    webhook_url: String,
    timeout: Duration,
    ai_cache: AiCacheService,
    reports: ReportService,
}

impl RefineService {
    pub fn new(db: DatabaseConnection, webhook_url: impl Into<String>) -> Self {
        let ai_cache = AiCacheService::new(db.clone());
        let reports = ReportService::new(db.clone());
        Self {
            db,
            http: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
            ai_cache,
            reports,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The request payload: capture-mode notes plus the contractor and
    /// personnel context the generator matches entries against.
    pub fn build_payload(session: &ReportSession) -> Value {
        let report = &session.report;
        json!({
            "reportId": session.report_id,
            "projectId": session.project.as_ref().map(|p| p.id.clone()),
            "reportDate": session.report_date,
            "captureMode": report.meta.capture_mode.as_str(),
            "fieldNotes": report.field_notes,
            "guidedNotes": report.guided_notes,
            "weather": report.overview.weather,
            "contractors": session.contractors().iter().map(|c| json!({
                "contractorId": c.id,
                "name": c.name,
                "abbreviation": c.abbreviation,
                "type": c.kind,
                "trades": c.trades,
            })).collect::<Vec<_>>(),
            "personnel": report.operations,
        })
    }

    /// Send the capture to the webhook. On success the generated payload
    /// is stored, the latch primed, and the session updated to `refined`.
    /// On failure the payload is queued for a manual retry and the error
    /// is returned.
    pub async fn refine(&self, session: &mut ReportSession) -> RefineResult<Value> {
        if self.webhook_url.is_empty() {
            return Err(RefineError::NotConfigured);
        }
        let Some(report_id) = session.report_id.clone() else {
            return Err(RefineError::Unsaved);
        };

        let payload = Self::build_payload(session);
        match self.deliver(&payload).await {
            Ok(generated) => {
                self.accept(session, &report_id, generated).await
            }
            Err(err) => {
                warn!("refine call for {report_id} failed: {err}");
                self.queue_payload(&report_id, &payload).await;
                self.park_pending(session, &report_id).await;
                Err(err)
            }
        }
    }

    /// Re-send the queued payload for a report. Drains the queue entry on
    /// success.
    pub async fn retry_queued(&self, session: &mut ReportSession) -> RefineResult<Value> {
        if self.webhook_url.is_empty() {
            return Err(RefineError::NotConfigured);
        }
        let Some(report_id) = session.report_id.clone() else {
            return Err(RefineError::Unsaved);
        };

        let queued = refine_queue::Entity::find()
            .filter(refine_queue::Column::ReportId.eq(report_id.as_str()))
            .order_by_desc(refine_queue::Column::QueuedAt)
            .one(&self.db)
            .await?
            .ok_or_else(|| RefineError::QueueEmpty(report_id.clone()))?;
        let payload: Value = serde_json::from_str(&queued.payload_json)?;

        let generated = self.deliver(&payload).await?;
        refine_queue::Entity::delete_many()
            .filter(refine_queue::Column::ReportId.eq(report_id.as_str()))
            .exec(&self.db)
            .await?;
        self.accept(session, &report_id, generated).await
    }

    pub async fn has_queued(&self, report_id: &str) -> bool {
        refine_queue::Entity::find()
            .filter(refine_queue::Column::ReportId.eq(report_id))
            .one(&self.db)
            .await
            .map(|row| row.is_some())
            .unwrap_or(false)
    }

    async fn deliver(&self, payload: &Value) -> RefineResult<Value> {
        let response = self
            .http
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RefineError::Status(response.status().as_u16()));
        }
        let body: Value = response.json().await?;
        // Some deployments wrap the payload, some return it bare
        Ok(body.get("aiGenerated").cloned().unwrap_or(body))
    }

    async fn accept(
        &self,
        session: &mut ReportSession,
        report_id: &str,
        generated: Value,
    ) -> RefineResult<Value> {
        self.ai_cache.store_response(report_id, &generated).await;
        session.report.ai_generated = Some(generated.clone());
        session.report.meta.status = ReportStatus::Refined;
        if let Err(err) = self.reports.update_status(report_id, ReportStatus::Refined).await {
            warn!("marking header {report_id} refined failed: {err}");
        }
        info!("report {report_id} refined");
        Ok(generated)
    }

    async fn queue_payload(&self, report_id: &str, payload: &Value) {
        let insert = refine_queue::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            report_id: Set(report_id.to_string()),
            payload_json: Set(payload.to_string()),
            queued_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;
        if let Err(err) = insert {
            warn!("queueing refine payload for {report_id} failed: {err}");
        }
    }

    async fn park_pending(&self, session: &mut ReportSession, report_id: &str) {
        session.report.meta.status = ReportStatus::PendingRefine;
        if let Err(err) = self
            .reports
            .update_status(report_id, ReportStatus::PendingRefine)
            .await
        {
            warn!("marking header {report_id} pending_refine failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::project::{Contractor, Project};
    use crate::report::Report;
    use crate::services::report_service::tests::seed_report_header;

    fn session_for(report_id: Option<&str>) -> ReportSession {
        let project = Project {
            id: "p1".to_string(),
            contractors: vec![Contractor {
                id: "c1".to_string(),
                name: "Acme".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        ReportSession::new(
            Some(project),
            Report::default(),
            report_id.map(String::from),
            "2026-03-02",
        )
    }

    #[test]
    fn payload_carries_notes_and_contractor_context() {
        let mut session = session_for(Some("r1"));
        session.report.guided_notes.work_summary = "Formed columns".to_string();

        let payload = RefineService::build_payload(&session);
        assert_eq!(payload["reportId"], "r1");
        assert_eq!(payload["captureMode"], "guided");
        assert_eq!(payload["guidedNotes"]["workSummary"], "Formed columns");
        assert_eq!(payload["contractors"][0]["contractorId"], "c1");
    }

    #[tokio::test]
    async fn unsaved_session_cannot_refine() {
        let db = setup_test_db().await;
        let service = RefineService::new(db, "http://127.0.0.1:1/webhook");
        let mut session = session_for(None);
        assert!(matches!(
            service.refine(&mut session).await,
            Err(RefineError::Unsaved)
        ));
    }

    #[tokio::test]
    async fn unconfigured_webhook_is_rejected() {
        let db = setup_test_db().await;
        let service = RefineService::new(db, "");
        let mut session = session_for(Some("r1"));
        assert!(matches!(
            service.refine(&mut session).await,
            Err(RefineError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn failed_delivery_queues_payload_and_parks_report() {
        let db = setup_test_db().await;
        seed_report_header(&db, "p1", "r1", "2026-03-02").await;
        // Nothing listens on this port; delivery fails fast
        let service = RefineService::new(db.clone(), "http://127.0.0.1:1/webhook")
            .with_timeout(Duration::from_millis(500));

        let mut session = session_for(Some("r1"));
        let result = service.refine(&mut session).await;
        assert!(result.is_err());
        assert!(service.has_queued("r1").await);
        assert_eq!(session.report.meta.status, ReportStatus::PendingRefine);

        use crate::database::entities::reports;
        let header = reports::Entity::find_by_id("r1").one(&db).await.unwrap().unwrap();
        assert_eq!(header.status, "pending_refine");
    }

    #[tokio::test]
    async fn retry_without_queue_entry_reports_empty() {
        let db = setup_test_db().await;
        seed_report_header(&db, "p1", "r1", "2026-03-02").await;
        let service = RefineService::new(db, "http://127.0.0.1:1/webhook");
        let mut session = session_for(Some("r1"));
        assert!(matches!(
            service.retry_queued(&mut session).await,
            Err(RefineError::QueueEmpty(_))
        ));
    }
}
