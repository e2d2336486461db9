use anyhow::Result;
use sea_orm::{ColumnTrait, Database, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use sitelog::database::entities::report_raw_captures;
use sitelog::database::migrations::Migrator;
use sitelog::project::{Contractor, ContractorKind, Project};
use sitelog::report::{Activity, EquipmentEntry, Operation};
use sitelog::services::{ProjectService, ReportService};

async fn setup() -> Result<(sea_orm::DatabaseConnection, Project)> {
    let db = Database::connect("sqlite::memory:").await?;
    use sea_orm_migration::MigratorTrait;
    Migrator::up(&db, None).await?;

    let projects = ProjectService::new(db.clone());
    let project = projects
        .save_project(&Project {
            project_name: "Canal Levee Rehab".to_string(),
            prime_contractor: "Acme Civil".to_string(),
            ..Default::default()
        })
        .await?;
    projects
        .save_contractor(&Contractor {
            project_id: project.id.clone(),
            name: "Acme Civil".to_string(),
            kind: ContractorKind::Prime,
            ..Default::default()
        })
        .await?;
    let project = projects.load_project(&project.id).await.expect("project reloads");
    Ok((db, project))
}

#[tokio::test]
async fn nested_lists_and_edits_survive_a_save_reload_cycle() -> Result<()> {
    let (db, project) = setup().await?;
    let service = ReportService::new(db);

    let mut session = service
        .load_session(Some(project.clone()), "2026-03-02", None)
        .await;
    let contractor_id = project.contractors[0].id.clone();

    session.report.activities = vec![Activity {
        contractor_id: contractor_id.clone(),
        no_work: false,
        narrative: "Drove sheet pile, stations 4+00 to 5+50".to_string(),
        equipment_used: "Vibratory hammer (1)".to_string(),
        crew: "Foreman (1), Operators (2)".to_string(),
    }];
    session.report.operations = vec![Operation {
        contractor_id: contractor_id.clone(),
        foremen: 1,
        operators: 2,
        ..Default::default()
    }];
    session.report.equipment = vec![EquipmentEntry {
        contractor_id: contractor_id.clone(),
        kind: "Crane".to_string(),
        qty: 1,
        status: "6 hrs".to_string(),
        hours_utilized: Some(6),
        ..Default::default()
    }];
    session.record_edit("issues", json!("Barge delivery slipped a day"));
    session.record_edit("safety.hasIncident", json!(false));
    session.record_edit("overview.weather.highTemp", json!("88"));

    service.save(&mut session, None).await?;

    let reloaded = service
        .load_session(Some(project.clone()), "2026-03-02", None)
        .await;

    assert_eq!(reloaded.report_id, session.report_id);
    assert_eq!(reloaded.report.activities, session.report.activities);
    assert_eq!(reloaded.report.operations, session.report.operations);
    assert_eq!(reloaded.report.equipment, session.report.equipment);
    assert_eq!(reloaded.report.user_edits, session.report.user_edits);
    // Falsy overrides survive intact
    assert_eq!(
        reloaded.report.user_edits.get("safety.hasIncident"),
        Some(&json!(false))
    );
    // Header scalars round-trip exactly
    assert_eq!(reloaded.report.overview.date, "2026-03-02");
    assert_eq!(
        reloaded.report.overview.weather.high_temp,
        session.report.overview.weather.high_temp
    );
    Ok(())
}

#[tokio::test]
async fn repeated_saves_keep_exactly_one_raw_capture_row() -> Result<()> {
    let (db, project) = setup().await?;
    let service = ReportService::new(db.clone());

    let mut session = service
        .load_session(Some(project.clone()), "2026-03-02", None)
        .await;
    service.save(&mut session, None).await?;
    session.record_edit("qaqc", json!("Density tests passed"));
    service.save(&mut session, None).await?;
    service.save(&mut session, None).await?;

    let report_id = session.report_id.clone().expect("header id assigned");
    let rows = report_raw_captures::Entity::find()
        .filter(report_raw_captures::Column::ReportId.eq(report_id))
        .count(&db)
        .await?;
    assert_eq!(rows, 1);
    Ok(())
}
