//! Item entity model
//!
//! This module contains the SeaORM entity model for the items table, the
//! per-record audit artifacts of a run, plus the change-state and record-kind
//! vocabularies assigned by the importer.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use super::sync_run::Entity as SyncRun;

/// Change-state assigned to an imported record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemState {
    /// The record produced a new local entity
    Added,
    /// The record materially changed an existing local entity
    Updated,
    /// The record retired an existing local entity (active flag cleared)
    Retired,
    /// The record matched the stored entity; nothing was mutated
    UpToDate,
    /// The record could not be imported; the item carries the reason
    Error,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Added => "added",
            ItemState::Updated => "updated",
            ItemState::Retired => "retired",
            ItemState::UpToDate => "up_to_date",
            ItemState::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "added" => Some(ItemState::Added),
            "updated" => Some(ItemState::Updated),
            "retired" => Some(ItemState::Retired),
            "up_to_date" => Some(ItemState::UpToDate),
            "error" => Some(ItemState::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of remote record an item was produced from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Concept,
    Mapping,
    /// The record carried a missing or unrecognized type tag
    Unknown,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Concept => "concept",
            RecordKind::Mapping => "mapping",
            RecordKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item entity representing one imported record's audit artifact
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Unique identifier for the item (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Run this item belongs to
    pub run_id: Uuid,

    /// External identifier of the imported record; unique within a run
    pub external_id: Uuid,

    /// Record kind (concept, mapping, unknown)
    pub kind: String,

    /// Change-state assigned by the importer
    pub state: String,

    /// Failure reason for error-state items, retained for operator review
    pub error_message: Option<String>,

    /// Timestamp when the item was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the item was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "SyncRun",
        from = "Column::RunId",
        to = "super::sync_run::Column::Id"
    )]
    SyncRun,
}

impl Related<SyncRun> for Entity {
    fn to() -> RelationDef {
        Relation::SyncRun.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Build a fresh item for one imported record.
    pub fn record(run_id: Uuid, external_id: Uuid, kind: RecordKind, state: ItemState) -> Self {
        let now = chrono::Utc::now().fixed_offset();
        Self {
            id: Uuid::new_v4(),
            run_id,
            external_id,
            kind: kind.as_str().to_string(),
            state: state.as_str().to_string(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build an error-state item carrying the rejection reason.
    pub fn rejected(
        run_id: Uuid,
        external_id: Uuid,
        kind: RecordKind,
        reason: impl Into<String>,
    ) -> Self {
        let mut item = Self::record(run_id, external_id, kind, ItemState::Error);
        item.error_message = Some(reason.into());
        item
    }

    /// True when the importer rejected the record.
    pub fn is_error(&self) -> bool {
        self.state == ItemState::Error.as_str()
    }
}
