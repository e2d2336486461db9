use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Projects
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Projects::ProjectName).string().not_null())
                    .col(ColumnDef::new(Projects::Location).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::Status).string().not_null().default("active"))
                    .col(ColumnDef::new(Projects::PrimeContractor).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::Engineer).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::LogoUrl).string())
                    .col(ColumnDef::new(Projects::CnoSolicitationNo).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::NoabProjectNo).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::ContractDuration).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::NoticeToProceed).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::ExpectedCompletion).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::WeatherDays).integer().not_null().default(0))
                    .col(ColumnDef::new(Projects::DefaultStartTime).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::DefaultEndTime).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::CreatedBy).string().not_null().default(""))
                    .col(ColumnDef::new(Projects::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Projects::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Project equipment catalog
        manager
            .create_table(
                Table::create()
                    .table(ProjectEquipment::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProjectEquipment::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ProjectEquipment::ProjectId).string().not_null())
                    .col(ColumnDef::new(ProjectEquipment::EquipmentType).string().not_null().default(""))
                    .col(ColumnDef::new(ProjectEquipment::Model).string().not_null().default(""))
                    .col(ColumnDef::new(ProjectEquipment::Status).string().not_null().default("active"))
                    .col(ColumnDef::new(ProjectEquipment::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_equipment_project_id")
                            .from(ProjectEquipment::Table, ProjectEquipment::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Contractors
        manager
            .create_table(
                Table::create()
                    .table(Contractors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Contractors::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Contractors::ProjectId).string().not_null())
                    .col(ColumnDef::new(Contractors::Name).string().not_null())
                    .col(ColumnDef::new(Contractors::Company).string().not_null().default(""))
                    .col(ColumnDef::new(Contractors::Abbreviation).string().not_null().default(""))
                    .col(ColumnDef::new(Contractors::Kind).string().not_null().default("sub"))
                    .col(ColumnDef::new(Contractors::Trades).string().not_null().default(""))
                    .col(ColumnDef::new(Contractors::Status).string().not_null().default("active"))
                    .col(ColumnDef::new(Contractors::AddedDate).string().not_null().default(""))
                    .col(ColumnDef::new(Contractors::RemovedDate).string().not_null().default(""))
                    .col(ColumnDef::new(Contractors::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Contractors::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contractors_project_id")
                            .from(Contractors::Table, Contractors::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // User profiles
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserProfiles::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(UserProfiles::DeviceId).string().not_null())
                    .col(ColumnDef::new(UserProfiles::FullName).string().not_null().default(""))
                    .col(ColumnDef::new(UserProfiles::Title).string().not_null().default(""))
                    .col(ColumnDef::new(UserProfiles::Company).string().not_null().default(""))
                    .col(ColumnDef::new(UserProfiles::Email).string().not_null().default(""))
                    .col(ColumnDef::new(UserProfiles::Phone).string().not_null().default(""))
                    .col(ColumnDef::new(UserProfiles::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(UserProfiles::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Report headers
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reports::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Reports::ProjectId).string().not_null())
                    .col(ColumnDef::new(Reports::ReportDate).string().not_null())
                    .col(ColumnDef::new(Reports::InspectorName).string().not_null().default(""))
                    .col(ColumnDef::new(Reports::Status).string().not_null().default("draft"))
                    .col(ColumnDef::new(Reports::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Reports::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reports_project_id")
                            .from(Reports::Table, Reports::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reports_project_date")
                    .table(Reports::Table)
                    .col(Reports::ProjectId)
                    .col(Reports::ReportDate)
                    .to_owned(),
            )
            .await?;

        // Raw capture, one row per report
        manager
            .create_table(
                Table::create()
                    .table(ReportRawCaptures::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ReportRawCaptures::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ReportRawCaptures::ReportId).string().not_null())
                    .col(ColumnDef::new(ReportRawCaptures::CaptureMode).string().not_null().default("guided"))
                    .col(ColumnDef::new(ReportRawCaptures::FreeformNotes).text().not_null().default(""))
                    .col(ColumnDef::new(ReportRawCaptures::WorkSummary).text().not_null().default(""))
                    .col(ColumnDef::new(ReportRawCaptures::IssuesNotes).text().not_null().default(""))
                    .col(ColumnDef::new(ReportRawCaptures::SafetyNotes).text().not_null().default(""))
                    .col(ColumnDef::new(ReportRawCaptures::WeatherJson).text().not_null().default("{}"))
                    .col(ColumnDef::new(ReportRawCaptures::EntriesJson).text().not_null().default("{}"))
                    .col(ColumnDef::new(ReportRawCaptures::CapturedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_raw_captures_report_id")
                            .from(ReportRawCaptures::Table, ReportRawCaptures::ReportId)
                            .to(Reports::Table, Reports::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_raw_captures_report_id")
                    .table(ReportRawCaptures::Table)
                    .col(ReportRawCaptures::ReportId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Photos
        manager
            .create_table(
                Table::create()
                    .table(Photos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Photos::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Photos::ReportId).string().not_null())
                    .col(ColumnDef::new(Photos::StoragePath).string().not_null().default(""))
                    .col(ColumnDef::new(Photos::Filename).string().not_null().default(""))
                    .col(ColumnDef::new(Photos::Caption).text().not_null().default(""))
                    .col(ColumnDef::new(Photos::TakenAt).timestamp())
                    .col(ColumnDef::new(Photos::GpsLat).double())
                    .col(ColumnDef::new(Photos::GpsLng).double())
                    .col(ColumnDef::new(Photos::SyncStatus).string().not_null().default("pending"))
                    .col(ColumnDef::new(Photos::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_photos_report_id")
                            .from(Photos::Table, Photos::ReportId)
                            .to(Reports::Table, Reports::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Generated responses, append-only
        manager
            .create_table(
                Table::create()
                    .table(AiResponses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AiResponses::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(AiResponses::ReportId).string().not_null())
                    .col(ColumnDef::new(AiResponses::ResponseJson).text().not_null())
                    .col(ColumnDef::new(AiResponses::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ai_responses_report_id")
                            .from(AiResponses::Table, AiResponses::ReportId)
                            .to(Reports::Table, Reports::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Archived snapshots
        manager
            .create_table(
                Table::create()
                    .table(FinalReports::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FinalReports::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(FinalReports::ProjectId).string().not_null())
                    .col(ColumnDef::new(FinalReports::ReportId).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::ReportDate).string().not_null())
                    .col(ColumnDef::new(FinalReports::SubmittedAt).timestamp().not_null())
                    .col(ColumnDef::new(FinalReports::SubmittedBy).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::ExecutiveSummary).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::WorkPerformed).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::MaterialsUsed).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::DelaysIssues).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::InspectorNotes).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::GeneralCondition).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::HighTemp).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::LowTemp).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::Precipitation).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::WindSpeed).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::Humidity).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::HasWorkPerformed).boolean().not_null().default(false))
                    .col(ColumnDef::new(FinalReports::HasMaterials).boolean().not_null().default(false))
                    .col(ColumnDef::new(FinalReports::HasDelays).boolean().not_null().default(false))
                    .col(ColumnDef::new(FinalReports::HasVisitors).boolean().not_null().default(false))
                    .col(ColumnDef::new(FinalReports::HasSafety).boolean().not_null().default(false))
                    .col(ColumnDef::new(FinalReports::HasPhotos).boolean().not_null().default(false))
                    .col(ColumnDef::new(FinalReports::WorkPerformedJson).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::MaterialsJson).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::DelaysJson).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::VisitorsJson).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::SafetyJson).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::PhotosJson).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::WorkPerformedNotes).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::MaterialsNotes).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::DelaysNotes).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::VisitorsNotes).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::SafetyNotes).text().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::PdfUrl).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::PdfStoragePath).string().not_null().default(""))
                    .col(ColumnDef::new(FinalReports::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_final_reports_submitted_at")
                    .table(FinalReports::Table)
                    .col(FinalReports::SubmittedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FinalReports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AiResponses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Photos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReportRawCaptures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contractors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectEquipment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    ProjectName,
    Location,
    Status,
    PrimeContractor,
    Engineer,
    LogoUrl,
    CnoSolicitationNo,
    NoabProjectNo,
    ContractDuration,
    NoticeToProceed,
    ExpectedCompletion,
    WeatherDays,
    DefaultStartTime,
    DefaultEndTime,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProjectEquipment {
    Table,
    Id,
    ProjectId,
    EquipmentType,
    Model,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Contractors {
    Table,
    Id,
    ProjectId,
    Name,
    Company,
    Abbreviation,
    Kind,
    Trades,
    Status,
    AddedDate,
    RemovedDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum UserProfiles {
    Table,
    Id,
    DeviceId,
    FullName,
    Title,
    Company,
    Email,
    Phone,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Reports {
    Table,
    Id,
    ProjectId,
    ReportDate,
    InspectorName,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ReportRawCaptures {
    Table,
    Id,
    ReportId,
    CaptureMode,
    FreeformNotes,
    WorkSummary,
    IssuesNotes,
    SafetyNotes,
    WeatherJson,
    EntriesJson,
    CapturedAt,
}

#[derive(Iden)]
enum Photos {
    Table,
    Id,
    ReportId,
    StoragePath,
    Filename,
    Caption,
    TakenAt,
    GpsLat,
    GpsLng,
    SyncStatus,
    CreatedAt,
}

#[derive(Iden)]
enum AiResponses {
    Table,
    Id,
    ReportId,
    ResponseJson,
    CreatedAt,
}

#[derive(Iden)]
enum FinalReports {
    Table,
    Id,
    ProjectId,
    ReportId,
    ReportDate,
    SubmittedAt,
    SubmittedBy,
    ExecutiveSummary,
    WorkPerformed,
    MaterialsUsed,
    DelaysIssues,
    InspectorNotes,
    GeneralCondition,
    HighTemp,
    LowTemp,
    Precipitation,
    WindSpeed,
    Humidity,
    HasWorkPerformed,
    HasMaterials,
    HasDelays,
    HasVisitors,
    HasSafety,
    HasPhotos,
    WorkPerformedJson,
    MaterialsJson,
    DelaysJson,
    VisitorsJson,
    SafetyJson,
    PhotosJson,
    WorkPerformedNotes,
    MaterialsNotes,
    DelaysNotes,
    VisitorsNotes,
    SafetyNotes,
    PdfUrl,
    PdfStoragePath,
    CreatedAt,
}
