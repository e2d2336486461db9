use sea_orm_migration::prelude::*;

/// Device-local tables: drafts, key/value state, the generated-content
/// preemption cache, and the offline webhook queue. The sync layer never
/// replicates these.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Drafts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Drafts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Drafts::ProjectId).string().not_null())
                    .col(ColumnDef::new(Drafts::ReportDate).string().not_null())
                    .col(ColumnDef::new(Drafts::PayloadJson).text().not_null().default("{}"))
                    .col(ColumnDef::new(Drafts::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_drafts_project_date")
                    .table(Drafts::Table)
                    .col(Drafts::ProjectId)
                    .col(Drafts::ReportDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LocalState::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LocalState::Key).string().not_null().primary_key())
                    .col(ColumnDef::new(LocalState::Value).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AiCache::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AiCache::ReportId).string().not_null().primary_key())
                    .col(ColumnDef::new(AiCache::PayloadJson).text().not_null())
                    .col(ColumnDef::new(AiCache::CachedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RefineQueue::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RefineQueue::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(RefineQueue::ReportId).string().not_null())
                    .col(ColumnDef::new(RefineQueue::PayloadJson).text().not_null())
                    .col(ColumnDef::new(RefineQueue::QueuedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RefineQueue::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AiCache::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LocalState::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Drafts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Drafts {
    Table,
    Id,
    ProjectId,
    ReportDate,
    PayloadJson,
    UpdatedAt,
}

#[derive(Iden)]
enum LocalState {
    Table,
    Key,
    Value,
}

#[derive(Iden)]
enum AiCache {
    Table,
    ReportId,
    PayloadJson,
    CachedAt,
}

#[derive(Iden)]
enum RefineQueue {
    Table,
    Id,
    ReportId,
    PayloadJson,
    QueuedAt,
}
