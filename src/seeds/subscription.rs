//! Subscription seeding functionality
//!
//! Bootstraps the subscription row from configuration when none exists yet.
//! The subscription is created by configuration and mutated only by
//! administrative action, so seeding never overwrites an existing row.

use anyhow::Result;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::models::subscription::Model;
use crate::repositories::SubscriptionRepository;

/// Seeds the subscription from `TERMSYNC_SUBSCRIPTION_URL` /
/// `TERMSYNC_SUBSCRIPTION_TOKEN` when the table is empty.
///
/// Returns the effective subscription, or `None` when nothing is configured.
pub async fn seed_subscription(
    db: &DatabaseConnection,
    config: &AppConfig,
) -> Result<Option<Model>> {
    let repo = SubscriptionRepository::new(db.clone());

    if let Some(existing) = repo.get().await? {
        log::info!(
            "Subscription already exists for '{}', skipping seeding",
            existing.url
        );
        return Ok(Some(existing));
    }

    let Some(url) = &config.subscription_url else {
        log::info!("No subscription URL configured; nothing to seed");
        return Ok(None);
    };

    let created = repo
        .create(url, config.subscription_token.as_deref())
        .await?;

    log::info!("Seeded subscription for '{}'", created.url);

    Ok(Some(created))
}
