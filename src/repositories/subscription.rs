//! # Subscription Repository
//!
//! Data access for the single-row subscriptions table. Installations carry at
//! most one subscription; when several rows exist the oldest wins.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::subscription::{ActiveModel, Column, Entity, Model};

/// Repository for subscription database operations
pub struct SubscriptionRepository {
    db: DatabaseConnection,
}

impl SubscriptionRepository {
    /// Create a new SubscriptionRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Return the configured subscription, if any.
    pub async fn get(&self) -> Result<Option<Model>, RepositoryError> {
        Entity::find()
            .order_by_asc(Column::CreatedAt)
            .limit(1)
            .one(&self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Create the subscription row.
    pub async fn create(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<Model, RepositoryError> {
        let now = Utc::now().fixed_offset();

        let subscription = ActiveModel {
            id: Set(Uuid::new_v4()),
            url: Set(url.to_string()),
            token: Set(token.map(|t| t.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = subscription
            .insert(&self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::info!(
            subscription_id = %result.id,
            url = %result.url,
            "Subscription created"
        );

        Ok(result)
    }
}
