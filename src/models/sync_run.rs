//! SyncRun entity model
//!
//! This module contains the SeaORM entity model for the sync_runs table,
//! one row per synchronization attempt. The server-reported checkpoint of a
//! succeeded run is the resume point for the next run.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Lifecycle status of a synchronization run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::InProgress => "in_progress",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SyncRun entity representing one synchronization attempt
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_runs")]
pub struct Model {
    /// Unique identifier for the run (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Wall-clock timestamp when the run started
    pub started_at: DateTimeWithTimeZone,

    /// Server-reported "updated to" instant of the fetched delta; the resume
    /// point for the next run once this run succeeds
    pub remote_updated_to: Option<DateTimeWithTimeZone>,

    /// Wall-clock timestamp when the run finished
    pub finished_at: Option<DateTimeWithTimeZone>,

    /// Current status of the run (in_progress, succeeded, failed)
    pub status: String,

    /// Structured error details if the run failed
    #[sea_orm(column_type = "JsonBinary")]
    pub error: Option<JsonValue>,

    /// Timestamp when the run row was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the run row was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item::Entity")]
    Item,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
