//! Mapping entity model
//!
//! This module contains the SeaORM entity model for the mappings table.
//! Mappings relate a concept to another concept or to a code in an external
//! source; they reference concepts by external uuid only.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Mapping entity representing one concept relationship
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mappings")]
pub struct Model {
    /// Unique identifier for the local row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Stable external identifier assigned by the remote repository; the
    /// idempotent-upsert key
    #[sea_orm(unique)]
    pub external_id: Uuid,

    /// Relationship kind (e.g. SAME-AS, NARROWER-THAN)
    pub map_type: String,

    /// External uuid of the concept the relationship originates from
    pub from_concept_id: Uuid,

    /// External uuid of the target concept, for internal mappings
    pub to_concept_id: Option<Uuid>,

    /// Target source name, for mappings into an external code system
    pub to_source: Option<String>,

    /// Target code within the external source
    pub to_code: Option<String>,

    /// Full normalized record payload as received
    #[sea_orm(column_type = "JsonBinary")]
    pub payload: JsonValue,

    /// Remote-side retirement flag
    pub retired: bool,

    /// Timestamp when the mapping was first imported
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the mapping was last updated by an import
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
