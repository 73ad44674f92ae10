//! Migration to create the items table.
//!
//! Items are the per-record audit artifacts of a synchronization run: one row
//! per imported remote record, carrying the assigned change-state and, for
//! rejected records, the failure reason.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Items::RunId).uuid().not_null())
                    .col(ColumnDef::new(Items::ExternalId).uuid().not_null())
                    .col(ColumnDef::new(Items::Kind).text().not_null())
                    .col(ColumnDef::new(Items::State).text().not_null())
                    .col(ColumnDef::new(Items::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(Items::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Items::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_run_id")
                            .from(Items::Table, Items::RunId)
                            .to(SyncRuns::Table, SyncRuns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Audit key: one item per external record per run.
        manager
            .create_index(
                Index::create()
                    .name("idx_items_run_external")
                    .table(Items::Table)
                    .col(Items::RunId)
                    .col(Items::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Per-run state summaries (status reports, error review).
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_items_run_state ON items (run_id, state)"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_items_run_state").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_items_run_external").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    RunId,
    ExternalId,
    Kind,
    State,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SyncRuns {
    Table,
    Id,
}
