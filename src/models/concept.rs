//! Concept entity model
//!
//! This module contains the SeaORM entity model for the concepts table,
//! the local dictionary entities produced from concept-like remote records.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Concept entity representing one dictionary concept
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "concepts")]
pub struct Model {
    /// Unique identifier for the local row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Stable external identifier assigned by the remote repository; the
    /// idempotent-upsert key
    #[sea_orm(unique)]
    pub external_id: Uuid,

    /// Concept code within its source
    pub code: String,

    /// Concept class (e.g. Diagnosis, Test, Drug)
    pub concept_class: String,

    /// Datatype of the concept (e.g. Numeric, Coded, N/A)
    pub datatype: String,

    /// Preferred display name, extracted from the record's names
    pub display_name: Option<String>,

    /// Full normalized record payload as received; the basis for material
    /// difference comparison on re-import
    #[sea_orm(column_type = "JsonBinary")]
    pub payload: JsonValue,

    /// Remote-side retirement flag; retirement is a state change, never a
    /// deletion
    pub retired: bool,

    /// Timestamp when the concept was first imported
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the concept was last updated by an import
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
