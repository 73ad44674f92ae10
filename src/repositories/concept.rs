//! # Concept Repository
//!
//! Data access for imported concepts, keyed by their stable external uuid.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::concept::{ActiveModel, Column, Entity, Model};

/// Repository for concept database operations
pub struct ConceptRepository {
    db: DatabaseConnection,
}

impl ConceptRepository {
    /// Create a new ConceptRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Look up a concept by its external uuid.
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

    /// Insert a new concept row.
    pub async fn insert(&self, concept: ActiveModel) -> Result<Model, RepositoryError> {
        concept
            .insert(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Update an existing concept row.
    pub async fn update(&self, concept: ActiveModel) -> Result<Model, RepositoryError> {
        concept
            .update(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Count all concepts.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        use sea_orm::PaginatorTrait;

        Entity::find()
            .count(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
