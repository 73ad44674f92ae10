//! # Data Models
//!
//! This module contains the SeaORM entity models for the termsync service:
//! the subscription, the run ledger, the imported dictionary entities, and
//! the per-record audit items.

pub mod concept;
pub mod item;
pub mod mapping;
pub mod subscription;
pub mod sync_run;

pub use concept::Entity as Concept;
pub use item::Entity as Item;
pub use mapping::Entity as Mapping;
pub use subscription::Entity as Subscription;
pub use sync_run::Entity as SyncRun;
