//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories only translate between Diesel rows and domain aggregates;
//! row structs (`models.rs`) and the table definitions (`schema.rs`) stay
//! private to this module.
//!
//! # Example
//!
//! ```no_run
//! use cancel_flow::outbound::persistence::{
//!     DbPool, DieselCancellationRepository, DieselSubscriptionRepository, PoolConfig,
//! };
//!
//! # async fn example() -> Result<(), cancel_flow::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/cancel_flow")).await?;
//! let subscriptions = DieselSubscriptionRepository::new(pool.clone());
//! let cancellations = DieselCancellationRepository::new(pool);
//! # Ok(())
//! # }
//! ```

mod diesel_cancellation_repository;
mod diesel_subscription_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_cancellation_repository::DieselCancellationRepository;
pub use diesel_subscription_repository::DieselSubscriptionRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
