//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel and `bb8`.
//! - **memory**: in-process store for local runs and end-to-end tests.
//! - **variant_source**: OS-entropy coin for experiment assignment.
//!
//! Adapters translate between domain types and infrastructure
//! representations and contain no business rules.

pub mod memory;
pub mod persistence;
pub mod variant_source;
