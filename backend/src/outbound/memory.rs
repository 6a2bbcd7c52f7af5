//! In-process store implementing both persistence ports.
//!
//! Used when no database is configured and by the end-to-end tests. Each
//! mutation holds the relevant mutex for its whole read-compare-write, which
//! gives the same atomicity the SQL adapters get from single statements.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    CancellationDecision, CancellationRepository, CancellationRepositoryError,
    SubscriptionRepository, SubscriptionRepositoryError,
};
use crate::domain::{CancellationRecord, Subscription, SubscriptionId, UserId};

/// Memory-backed subscription and cancellation store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subscriptions: Mutex<HashMap<SubscriptionId, Subscription>>,
    cancellations: Mutex<HashMap<(UserId, SubscriptionId), CancellationRecord>>,
}

fn poisoned<E>(make: impl FnOnce(&'static str) -> E) -> E {
    make("memory store lock poisoned")
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn subscriptions(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<SubscriptionId, Subscription>>, SubscriptionRepositoryError>
    {
        self.subscriptions
            .lock()
            .map_err(|_| poisoned(SubscriptionRepositoryError::query))
    }

    fn cancellations(
        &self,
    ) -> Result<
        MutexGuard<'_, HashMap<(UserId, SubscriptionId), CancellationRecord>>,
        CancellationRepositoryError,
    > {
        self.cancellations
            .lock()
            .map_err(|_| poisoned(CancellationRepositoryError::query))
    }

    /// Insert or replace a subscription.
    ///
    /// Subscriptions are created outside the cancellation flow; this is the
    /// provisioning hook for the memory store.
    pub fn put_subscription(&self, subscription: Subscription) -> Result<(), SubscriptionRepositoryError> {
        self.subscriptions()?.insert(subscription.id(), subscription);
        Ok(())
    }

    /// Snapshot a subscription regardless of owner. Intended for tests and
    /// diagnostics.
    pub fn subscription(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError> {
        Ok(self.subscriptions()?.get(id).cloned())
    }

    /// Snapshot the cancellation record for `(owner, subscription)`.
    pub fn cancellation(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
    ) -> Result<Option<CancellationRecord>, CancellationRepositoryError> {
        Ok(self
            .cancellations()?
            .get(&(owner.clone(), *subscription))
            .cloned())
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn find_owned(
        &self,
        owner: &UserId,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError> {
        Ok(self
            .subscriptions()?
            .get(id)
            .filter(|subscription| subscription.owner() == owner)
            .cloned())
    }

    async fn latest_open_for(
        &self,
        owner: &UserId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError> {
        Ok(self
            .subscriptions()?
            .values()
            .filter(|subscription| subscription.owner() == owner && subscription.status().is_open())
            .max_by_key(|subscription| (subscription.created_at(), *subscription.id().as_uuid()))
            .cloned())
    }

    async fn compare_and_set(
        &self,
        owner: &UserId,
        previous: &Subscription,
        next: &Subscription,
    ) -> Result<(), SubscriptionRepositoryError> {
        let mut subscriptions = self.subscriptions()?;
        match subscriptions.get_mut(&previous.id()) {
            Some(stored) if stored.owner() == owner && stored.same_state_as(previous) => {
                *stored = next.clone();
                Ok(())
            }
            _ => Err(SubscriptionRepositoryError::stale_state()),
        }
    }
}

#[async_trait]
impl CancellationRepository for MemoryStore {
    async fn latest_for(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
    ) -> Result<Option<CancellationRecord>, CancellationRepositoryError> {
        Ok(self
            .cancellations()?
            .get(&(owner.clone(), *subscription))
            .cloned())
    }

    async fn insert_or_fetch(
        &self,
        record: &CancellationRecord,
    ) -> Result<CancellationRecord, CancellationRepositoryError> {
        let key = (record.owner().clone(), record.subscription_id());
        Ok(self
            .cancellations()?
            .entry(key)
            .or_insert_with(|| record.clone())
            .clone())
    }

    async fn update_decision(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
        decision: &CancellationDecision,
    ) -> Result<CancellationRecord, CancellationRepositoryError> {
        let mut cancellations = self.cancellations()?;
        let stored = cancellations
            .get_mut(&(owner.clone(), *subscription))
            .ok_or_else(CancellationRepositoryError::missing)?;
        *stored = stored.clone().with_decision(
            decision.accepted,
            decision.reason.clone(),
            decision.decided_at,
        );
        Ok(stored.clone())
    }
}
