//! # SyncRun Repository
//!
//! Data access for the run ledger. The ledger is the only record of run
//! outcomes and doubles as the cross-process mutual-exclusion point: the
//! partial unique index on `status = 'in_progress'` rejects a second
//! concurrent run at insert time.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::sync_run::{ActiveModel, Column, Entity, Model, RunStatus};

/// Repository for sync run database operations
pub struct SyncRunRepository {
    db: DatabaseConnection,
}

impl SyncRunRepository {
    /// Create a new SyncRunRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new run in `in_progress` state.
    ///
    /// Fails with a unique violation when another run is already in
    /// progress; callers translate that into the already-in-progress outcome.
    pub async fn create(&self, started_at: DateTime<Utc>) -> Result<Model, RepositoryError> {
        let now = Utc::now().fixed_offset();

        let run = ActiveModel {
            id: Set(Uuid::new_v4()),
            started_at: Set(started_at.fixed_offset()),
            remote_updated_to: Set(None),
            finished_at: Set(None),
            status: Set(RunStatus::InProgress.as_str().to_string()),
            error: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = run
            .insert(&self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::info!(run_id = %result.id, started_at = %result.started_at, "Sync run created");

        Ok(result)
    }

    /// Return the most recent successful run, if any. Its
    /// `remote_updated_to` is the resume point for the next run.
    pub async fn last_successful(&self) -> Result<Option<Model>, RepositoryError> {
        Entity::find()
            .filter(Column::Status.eq(RunStatus::Succeeded.as_str()))
            .order_by_desc(Column::StartedAt)
            .limit(1)
            .one(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Return the in-progress run, if one exists.
    pub async fn find_in_progress(&self) -> Result<Option<Model>, RepositoryError> {
        Entity::find()
            .filter(Column::Status.eq(RunStatus::InProgress.as_str()))
            .one(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Record the server-reported "updated to" instant on the run.
    pub async fn set_remote_updated_to(
        &self,
        run_id: Uuid,
        remote_updated_to: DateTime<Utc>,
    ) -> Result<Model, RepositoryError> {
        let run = self.require(run_id).await?;

        let mut active: ActiveModel = run.into();
        active.remote_updated_to = Set(Some(remote_updated_to.fixed_offset()));
        active.updated_at = Set(Utc::now().fixed_offset());

        active
            .update(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Close the run with the given outcome and optional error details.
    pub async fn finish(
        &self,
        run_id: Uuid,
        finished_at: DateTime<Utc>,
        status: RunStatus,
        error: Option<JsonValue>,
    ) -> Result<Model, RepositoryError> {
        let run = self.require(run_id).await?;

        let mut active: ActiveModel = run.into();
        active.finished_at = Set(Some(finished_at.fixed_offset()));
        active.status = Set(status.as_str().to_string());
        if let Some(err) = error {
            active.error = Set(Some(err));
        }
        active.updated_at = Set(Utc::now().fixed_offset());

        let updated = active
            .update(&self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::info!(run_id = %run_id, status = %status, "Sync run finished");

        Ok(updated)
    }

    /// Return the most recent runs, newest first.
    pub async fn recent(&self, limit: u64) -> Result<Vec<Model>, RepositoryError> {
        Entity::find()
            .order_by_desc(Column::StartedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn require(&self, run_id: Uuid) -> Result<Model, RepositoryError> {
        Entity::find_by_id(run_id)
            .one(&self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or(RepositoryError::NotFound { entity: "sync run" })
    }
}
