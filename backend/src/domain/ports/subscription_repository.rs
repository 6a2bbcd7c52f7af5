//! Port abstraction for subscription persistence adapters and their errors.
//!
//! Every lookup is keyed by the owning user as well as the subscription, so
//! adapters cannot return rows that belong to someone else.

use async_trait::async_trait;

use crate::domain::{Subscription, SubscriptionId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by subscription repository adapters.
    pub enum SubscriptionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "subscription repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "subscription repository query failed: {message}",
        /// The stored row no longer matches the state the caller read.
        StaleState => "subscription changed concurrently",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Fetch a subscription only if `owner` owns it.
    async fn find_owned(
        &self,
        owner: &UserId,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError>;

    /// Newest subscription owned by `owner` whose status is `active` or
    /// `pending_cancellation`.
    async fn latest_open_for(
        &self,
        owner: &UserId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError>;

    /// Replace `previous` with `next` atomically.
    ///
    /// Fails with [`SubscriptionRepositoryError::StaleState`] when the stored
    /// status, price or discount flag no longer equal `previous`, or when the
    /// row is not owned by `owner`.
    async fn compare_and_set(
        &self,
        owner: &UserId,
        previous: &Subscription,
        next: &Subscription,
    ) -> Result<(), SubscriptionRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSubscriptionRepository;

#[async_trait]
impl SubscriptionRepository for FixtureSubscriptionRepository {
    async fn find_owned(
        &self,
        _owner: &UserId,
        _id: &SubscriptionId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError> {
        Ok(None)
    }

    async fn latest_open_for(
        &self,
        _owner: &UserId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError> {
        Ok(None)
    }

    async fn compare_and_set(
        &self,
        _owner: &UserId,
        _previous: &Subscription,
        _next: &Subscription,
    ) -> Result<(), SubscriptionRepositoryError> {
        Ok(())
    }
}
