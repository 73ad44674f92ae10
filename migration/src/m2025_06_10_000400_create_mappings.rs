//! Migration to create the mappings table.
//!
//! Mappings relate concepts to each other or to codes in external sources.
//! They reference concepts by external uuid only; no foreign key is declared
//! because the remote source may ship a mapping before its concepts in a
//! later delta.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mappings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Mappings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Mappings::ExternalId).uuid().not_null())
                    .col(ColumnDef::new(Mappings::MapType).text().not_null())
                    .col(ColumnDef::new(Mappings::FromConceptId).uuid().not_null())
                    .col(ColumnDef::new(Mappings::ToConceptId).uuid().null())
                    .col(ColumnDef::new(Mappings::ToSource).text().null())
                    .col(ColumnDef::new(Mappings::ToCode).text().null())
                    .col(ColumnDef::new(Mappings::Payload).json_binary().not_null())
                    .col(
                        ColumnDef::new(Mappings::Retired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Mappings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Mappings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mappings_external_id")
                    .table(Mappings::Table)
                    .col(Mappings::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Lookup of relationships originating from a concept.
        manager
            .create_index(
                Index::create()
                    .name("idx_mappings_from_concept")
                    .table(Mappings::Table)
                    .col(Mappings::FromConceptId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_mappings_from_concept").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_mappings_external_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Mappings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Mappings {
    Table,
    Id,
    ExternalId,
    MapType,
    FromConceptId,
    ToConceptId,
    ToSource,
    ToCode,
    Payload,
    Retired,
    CreatedAt,
    UpdatedAt,
}
