//! Database migrations for the termsync service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_10_000100_create_subscriptions;
mod m2025_06_10_000200_create_sync_runs;
mod m2025_06_10_000300_create_concepts;
mod m2025_06_10_000400_create_mappings;
mod m2025_06_10_000500_create_items;
mod m2025_06_12_000100_add_sync_run_active_guard;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_10_000100_create_subscriptions::Migration),
            Box::new(m2025_06_10_000200_create_sync_runs::Migration),
            Box::new(m2025_06_10_000300_create_concepts::Migration),
            Box::new(m2025_06_10_000400_create_mappings::Migration),
            Box::new(m2025_06_10_000500_create_items::Migration),
            Box::new(m2025_06_12_000100_add_sync_run_active_guard::Migration),
        ]
    }
}
