//! Cancellation record store operations.

use tracing::debug;

use crate::domain::ports::{
    CancellationDecision, CancellationRepository, SubscriptionRepository, VariantSource,
};
use crate::domain::{CancellationRecord, DownsellVariant, Error, SubscriptionId, UserId};

use super::CancelFlowService;
use super::error_mapping::map_cancellation_error;

impl<S, C, V> CancelFlowService<S, C, V>
where
    S: SubscriptionRepository,
    C: CancellationRepository,
    V: VariantSource,
{
    pub(super) async fn latest_record(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
    ) -> Result<Option<CancellationRecord>, Error> {
        self.cancellations
            .latest_for(owner, subscription)
            .await
            .map_err(map_cancellation_error)
    }

    /// Insert a record unless one exists; concurrent inserts converge on the
    /// stored winner.
    async fn insert_record(&self, candidate: CancellationRecord) -> Result<CancellationRecord, Error> {
        let stored = self
            .cancellations
            .insert_or_fetch(&candidate)
            .await
            .map_err(map_cancellation_error)?;
        if stored.id() != candidate.id() {
            debug!(
                subscription = %candidate.subscription_id(),
                "cancellation record already existed; reusing stored variant"
            );
        }
        Ok(stored)
    }

    /// Return the persisted variant, creating the record with a variant from
    /// `supply` only when none exists yet.
    pub(super) async fn ensure_and_get_variant<F>(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
        supply: F,
    ) -> Result<DownsellVariant, Error>
    where
        F: FnOnce() -> DownsellVariant + Send,
    {
        if let Some(existing) = self.latest_record(owner, subscription).await? {
            return Ok(existing.variant());
        }

        let candidate =
            CancellationRecord::new(owner.clone(), *subscription, supply(), self.clock.utc());
        Ok(self.insert_record(candidate).await?.variant())
    }

    /// Write the user's decision onto the record.
    ///
    /// A user who never reached the priced offer gets a record with variant
    /// `A`; an existing variant is never rewritten.
    pub(super) async fn record_decision(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
        accepted: bool,
        reason: Option<String>,
    ) -> Result<CancellationRecord, Error> {
        let decided_at = self.clock.utc();
        if self.latest_record(owner, subscription).await?.is_none() {
            let candidate =
                CancellationRecord::new(owner.clone(), *subscription, DownsellVariant::A, decided_at);
            self.insert_record(candidate).await?;
        }

        let decision = CancellationDecision {
            accepted,
            reason,
            decided_at,
        };
        self.cancellations
            .update_decision(owner, subscription, &decision)
            .await
            .map_err(map_cancellation_error)
    }
}
