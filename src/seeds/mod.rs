//! Database seeding functionality
//!
//! This module provides functionality to seed the database with initial data.

pub mod subscription;

pub use subscription::seed_subscription;
