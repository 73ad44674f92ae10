//! Migration to create the concepts table.
//!
//! Concepts are the local dictionary entities produced from concept-like
//! remote records, keyed by their stable external uuid so re-imports update
//! in place instead of duplicating.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Concepts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Concepts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Concepts::ExternalId).uuid().not_null())
                    .col(ColumnDef::new(Concepts::Code).text().not_null())
                    .col(ColumnDef::new(Concepts::ConceptClass).text().not_null())
                    .col(ColumnDef::new(Concepts::Datatype).text().not_null())
                    .col(ColumnDef::new(Concepts::DisplayName).text().null())
                    .col(ColumnDef::new(Concepts::Payload).json_binary().not_null())
                    .col(
                        ColumnDef::new(Concepts::Retired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Concepts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Concepts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // The idempotent-upsert key.
        manager
            .create_index(
                Index::create()
                    .name("idx_concepts_external_id")
                    .table(Concepts::Table)
                    .col(Concepts::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_concepts_external_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Concepts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Concepts {
    Table,
    Id,
    ExternalId,
    Code,
    ConceptClass,
    Datatype,
    DisplayName,
    Payload,
    Retired,
    CreatedAt,
    UpdatedAt,
}
