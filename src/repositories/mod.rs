//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access.

pub mod concept;
pub mod item;
pub mod mapping;
pub mod subscription;
pub mod sync_run;

pub use concept::ConceptRepository;
pub use item::ItemRepository;
pub use mapping::MappingRepository;
pub use subscription::SubscriptionRepository;
pub use sync_run::SyncRunRepository;
