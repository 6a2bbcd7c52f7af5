//! Port abstraction for cancellation record persistence.
//!
//! Adapters must provide an insert-or-fetch primitive keyed by
//! `(owner, subscription)` so concurrent first-time writers converge on a
//! single record and therefore a single experiment variant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CancellationRecord, SubscriptionId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by cancellation repository adapters.
    pub enum CancellationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "cancellation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "cancellation repository query failed: {message}",
        /// No record exists for the requested subscription.
        Missing => "cancellation record not found",
    }
}

/// Final disposition written onto a cancellation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationDecision {
    /// Whether the user accepted the retention offer.
    pub accepted: bool,
    /// Sanitised reason text.
    pub reason: Option<String>,
    /// When the decision was taken.
    pub decided_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CancellationRepository: Send + Sync {
    /// Most recently created record for `(owner, subscription)`.
    async fn latest_for(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
    ) -> Result<Option<CancellationRecord>, CancellationRepositoryError>;

    /// Insert `record` unless one already exists for its owner and
    /// subscription; returns whichever record is stored afterwards.
    async fn insert_or_fetch(
        &self,
        record: &CancellationRecord,
    ) -> Result<CancellationRecord, CancellationRepositoryError>;

    /// Write the decision onto the latest record, leaving the variant intact.
    async fn update_decision(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
        decision: &CancellationDecision,
    ) -> Result<CancellationRecord, CancellationRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCancellationRepository;

#[async_trait]
impl CancellationRepository for FixtureCancellationRepository {
    async fn latest_for(
        &self,
        _owner: &UserId,
        _subscription: &SubscriptionId,
    ) -> Result<Option<CancellationRecord>, CancellationRepositoryError> {
        Ok(None)
    }

    async fn insert_or_fetch(
        &self,
        record: &CancellationRecord,
    ) -> Result<CancellationRecord, CancellationRepositoryError> {
        Ok(record.clone())
    }

    async fn update_decision(
        &self,
        _owner: &UserId,
        _subscription: &SubscriptionId,
        _decision: &CancellationDecision,
    ) -> Result<CancellationRecord, CancellationRepositoryError> {
        Err(CancellationRepositoryError::missing())
    }
}
