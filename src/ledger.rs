//! Update ledger
//!
//! Defines the persistence contract the synchronization engine runs against:
//! subscription lookup, the run lifecycle, and item saves. The engine is the
//! only writer of the run ledger. [`DbLedger`] is the SeaORM-backed
//! implementation over the repository layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{item, subscription, sync_run};
use crate::models::sync_run::RunStatus;
use crate::repositories::{ItemRepository, SubscriptionRepository, SyncRunRepository};

/// Persistence contract of the synchronization engine.
#[async_trait]
pub trait UpdateLedger: Send + Sync {
    /// The configured subscription, if any.
    async fn subscription(&self) -> Result<Option<subscription::Model>, RepositoryError>;

    /// The run currently holding the in-progress slot, if any.
    async fn active_run(&self) -> Result<Option<sync_run::Model>, RepositoryError>;

    /// The most recent successful run; its checkpoint is the resume point.
    async fn last_successful_run(&self) -> Result<Option<sync_run::Model>, RepositoryError>;

    /// Open a new in-progress run. Rejected with a unique violation when
    /// another run is still in progress.
    async fn create_run(
        &self,
        started_at: DateTime<Utc>,
    ) -> Result<sync_run::Model, RepositoryError>;

    /// Record the server-reported checkpoint on the run.
    async fn set_remote_updated_to(
        &self,
        run_id: Uuid,
        updated_to: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Close the run with its outcome.
    async fn finish_run(
        &self,
        run_id: Uuid,
        finished_at: DateTime<Utc>,
        status: RunStatus,
        error: Option<JsonValue>,
    ) -> Result<(), RepositoryError>;

    /// Persist one item; idempotent on the (run, external uuid) key.
    async fn save_item(&self, item: item::Model) -> Result<(), RepositoryError>;
}

/// SeaORM-backed ledger over the repository layer.
pub struct DbLedger {
    subscriptions: SubscriptionRepository,
    runs: SyncRunRepository,
    items: ItemRepository,
}

impl DbLedger {
    /// Create a ledger over the given database connection.
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            subscriptions: SubscriptionRepository::new(db.clone()),
            runs: SyncRunRepository::new(db.clone()),
            items: ItemRepository::new(db),
        }
    }
}

#[async_trait]
impl UpdateLedger for DbLedger {
    async fn subscription(&self) -> Result<Option<subscription::Model>, RepositoryError> {
        self.subscriptions.get().await
    }

    async fn active_run(&self) -> Result<Option<sync_run::Model>, RepositoryError> {
        self.runs.find_in_progress().await
    }

    async fn last_successful_run(&self) -> Result<Option<sync_run::Model>, RepositoryError> {
        self.runs.last_successful().await
    }

    async fn create_run(
        &self,
        started_at: DateTime<Utc>,
    ) -> Result<sync_run::Model, RepositoryError> {
        self.runs.create(started_at).await
    }

    async fn set_remote_updated_to(
        &self,
        run_id: Uuid,
        updated_to: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.runs
            .set_remote_updated_to(run_id, updated_to)
            .await
            .map(|_| ())
    }

    async fn finish_run(
        &self,
        run_id: Uuid,
        finished_at: DateTime<Utc>,
        status: RunStatus,
        error: Option<JsonValue>,
    ) -> Result<(), RepositoryError> {
        self.runs
            .finish(run_id, finished_at, status, error)
            .await
            .map(|_| ())
    }

    async fn save_item(&self, item: item::Model) -> Result<(), RepositoryError> {
        self.items.save(item).await.map(|_| ())
    }
}
