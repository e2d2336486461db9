use anyhow::Result;
use sea_orm::Database;
use serde_json::json;

use sitelog::database::migrations::Migrator;
use sitelog::project::{Contractor, Project};
use sitelog::resolve::{contractor_activity, FieldSpec};
use sitelog::services::{AiCacheService, ProjectService, ReportService};

async fn setup_with_contractor(name: &str) -> Result<(sea_orm::DatabaseConnection, Project)> {
    let db = Database::connect("sqlite::memory:").await?;
    use sea_orm_migration::MigratorTrait;
    Migrator::up(&db, None).await?;

    let projects = ProjectService::new(db.clone());
    let project = projects
        .save_project(&Project {
            project_name: "Terminal Apron".to_string(),
            ..Default::default()
        })
        .await?;
    projects
        .save_contractor(&Contractor {
            project_id: project.id.clone(),
            name: name.to_string(),
            ..Default::default()
        })
        .await?;
    let project = projects.load_project(&project.id).await.expect("project reloads");
    Ok((db, project))
}

/// A user edit persisted through the store still beats generated content
/// after a full save/reload cycle, even when the edited value is falsy.
#[tokio::test]
async fn persisted_falsy_edit_beats_generated_content() -> Result<()> {
    let (db, project) = setup_with_contractor("Acme").await?;
    let service = ReportService::new(db.clone());

    let mut session = service
        .load_session(Some(project.clone()), "2026-03-02", None)
        .await;
    session.report.guided_notes.issues = "Captured issue text".to_string();
    session.record_edit("issues", json!(""));
    service.save(&mut session, None).await?;

    // Generated content arrives after the edit
    let report_id = session.report_id.clone().expect("saved");
    AiCacheService::new(db.clone())
        .store_response(&report_id, &json!({"issues_delays": ["Generated issue"]}))
        .await;

    let reloaded = service
        .load_session(Some(project.clone()), "2026-03-02", None)
        .await;
    let resolver = reloaded.resolver();
    let value = resolver.resolve(
        "issues",
        FieldSpec::new("issues", "issues_delays").with_legacy("generalIssues"),
        json!("default"),
    );
    assert_eq!(value, json!(""));
    Ok(())
}

/// Generated entries carrying only a contractor name (freeform capture)
/// resolve to the matching contractor case-insensitively, end to end.
#[tokio::test]
async fn freeform_name_matching_resolves_through_the_store() -> Result<()> {
    let (db, project) = setup_with_contractor("ACME").await?;
    let service = ReportService::new(db.clone());

    let mut session = service
        .load_session(Some(project.clone()), "2026-03-02", None)
        .await;
    service.save(&mut session, None).await?;
    let report_id = session.report_id.clone().expect("saved");

    AiCacheService::new(db.clone())
        .store_response(
            &report_id,
            &json!({
                "activities": [
                    {"contractorId": null, "contractorName": "Acme", "narrative": "Saw-cut joints"}
                ]
            }),
        )
        .await;

    let reloaded = service
        .load_session(Some(project.clone()), "2026-03-02", None)
        .await;
    let contractor_id = project.contractors[0].id.clone();
    let activity = contractor_activity(&reloaded.report, reloaded.contractors(), &contractor_id)
        .expect("name match resolves the generated entry");
    assert_eq!(activity.narrative, "Saw-cut joints");
    assert_eq!(activity.contractor_id, contractor_id);
    Ok(())
}

/// Without any generated payload, resolution falls through to the captured
/// notes without error.
#[tokio::test]
async fn missing_generated_payload_falls_back_to_notes() -> Result<()> {
    let (db, project) = setup_with_contractor("Acme").await?;
    let service = ReportService::new(db);

    let mut session = service
        .load_session(Some(project.clone()), "2026-03-02", None)
        .await;
    session.report.guided_notes.work_summary = "Poured foundation".to_string();
    service.save(&mut session, None).await?;

    let reloaded = service
        .load_session(Some(project.clone()), "2026-03-02", None)
        .await;
    assert!(reloaded.report.ai_generated.is_none());
    let resolver = reloaded.resolver();
    let value = resolver.resolve_text(
        "guidedNotes.workSummary",
        FieldSpec::new("guidedNotes.workSummary", "work_summary"),
        "",
    );
    assert_eq!(value, "Poured foundation");
    Ok(())
}
