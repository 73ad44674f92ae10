//! # Item Repository
//!
//! Data access for the per-record audit items of a run. Saves are idempotent
//! on the (run, external uuid) audit key: re-processing the same record
//! within a run updates the existing row instead of failing.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::item::{ActiveModel, Column, Entity, ItemState, Model};

/// Repository for item database operations
pub struct ItemRepository {
    db: DatabaseConnection,
}

impl ItemRepository {
    /// Create a new ItemRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persist an item, upserting on the (run, external uuid) key.
    pub async fn save(&self, item: Model) -> Result<Model, RepositoryError> {
        let existing = Entity::find()
            .filter(Column::RunId.eq(item.run_id))
            .filter(Column::ExternalId.eq(item.external_id))
            .one(&self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if let Some(existing) = existing {
            return self.overwrite(existing, item).await;
        }

        let active = ActiveModel {
            id: Set(item.id),
            run_id: Set(item.run_id),
            external_id: Set(item.external_id),
            kind: Set(item.kind.clone()),
            state: Set(item.state.clone()),
            error_message: Set(item.error_message.clone()),
            created_at: Set(item.created_at),
            updated_at: Set(item.updated_at),
        };

        match active.insert(&self.db).await {
            Ok(saved) => Ok(saved),
            // Lost an insert race on the audit key; degrade to an update.
            Err(err) if is_unique_violation(&err) => {
                let existing = Entity::find()
                    .filter(Column::RunId.eq(item.run_id))
                    .filter(Column::ExternalId.eq(item.external_id))
                    .one(&self.db)
                    .await
                    .map_err(RepositoryError::database_error)?
                    .ok_or(RepositoryError::NotFound { entity: "item" })?;
                self.overwrite(existing, item).await
            }
            Err(err) => Err(RepositoryError::database_error(err)),
        }
    }

    /// List all items of a run in persistence order.
    pub async fn list_by_run(&self, run_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        Entity::find()
            .filter(Column::RunId.eq(run_id))
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Count items of a run grouped by change-state.
    pub async fn count_by_state(
        &self,
        run_id: Uuid,
    ) -> Result<Vec<(String, i64)>, RepositoryError> {
        Entity::find()
            .filter(Column::RunId.eq(run_id))
            .select_only()
            .column(Column::State)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::State)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List the error-state items of a run for operator review.
    pub async fn errors_for_run(&self, run_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        Entity::find()
            .filter(Column::RunId.eq(run_id))
            .filter(Column::State.eq(ItemState::Error.as_str()))
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn overwrite(&self, existing: Model, item: Model) -> Result<Model, RepositoryError> {
        let mut active: ActiveModel = existing.into();
        active.kind = Set(item.kind);
        active.state = Set(item.state);
        active.error_message = Set(item.error_message);
        active.updated_at = Set(Utc::now().fixed_offset());

        active
            .update(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
