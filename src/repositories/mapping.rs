//! # Mapping Repository
//!
//! Data access for imported mappings, keyed by their stable external uuid.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::mapping::{ActiveModel, Column, Entity, Model};

/// Repository for mapping database operations
pub struct MappingRepository {
    db: DatabaseConnection,
}

impl MappingRepository {
    /// Create a new MappingRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Look up a mapping by its external uuid.
    pub async fn find_by_external_id(
        &self,
        external_id: Uuid,
    ) -> Result<Option<Model>, RepositoryError> {
        Entity::find()
            .filter(Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert a new mapping row.
    pub async fn insert(&self, mapping: ActiveModel) -> Result<Model, RepositoryError> {
        mapping
            .insert(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Update an existing mapping row.
    pub async fn update(&self, mapping: ActiveModel) -> Result<Model, RepositoryError> {
        mapping
            .update(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Count all mappings.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        use sea_orm::PaginatorTrait;

        Entity::find()
            .count(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
