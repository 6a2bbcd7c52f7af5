//! Subscription state transitions.
//!
//! Transitions are computed on a fresh read and written with
//! compare-and-set. A stale write re-reads and recomputes; store failures are
//! returned immediately.

use tracing::debug;

use crate::domain::ports::{
    CancellationRepository, SubscriptionRepository, SubscriptionRepositoryError, VariantSource,
};
use crate::domain::{Error, FIXED_DISCOUNT, Subscription, SubscriptionId, UserId};

use super::error_mapping::{map_subscription_error, map_transition_error};
use super::{CancelFlowService, MAX_TRANSITION_ATTEMPTS};

fn exhausted() -> Error {
    Error::conflict("subscription changed concurrently; retry the request")
}

impl<S, C, V> CancelFlowService<S, C, V>
where
    S: SubscriptionRepository,
    C: CancellationRepository,
    V: VariantSource,
{
    /// Move the owner's newest open subscription to `pending_cancellation`.
    ///
    /// Already-pending subscriptions are returned unchanged.
    pub(super) async fn begin_cancellation(&self, owner: &UserId) -> Result<Subscription, Error> {
        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let current = self.require_latest_open(owner).await?;
            let Some(next) = current
                .begin_cancellation(self.clock.utc())
                .map_err(map_transition_error)?
            else {
                return Ok(current);
            };

            match self.subscriptions.compare_and_set(owner, &current, &next).await {
                Ok(()) => return Ok(next),
                Err(SubscriptionRepositoryError::StaleState) => {
                    debug!(attempt, "stale subscription while beginning cancellation");
                }
                Err(err) => return Err(map_subscription_error(err)),
            }
        }
        Err(exhausted())
    }

    /// Resolve the subscription to `active` (offer accepted) or `cancelled`.
    ///
    /// The fixed discount is granted at most once per subscription.
    pub(super) async fn finalize(
        &self,
        owner: &UserId,
        id: &SubscriptionId,
        accepted: bool,
    ) -> Result<Subscription, Error> {
        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let current = self.require_owned(owner, id).await?;
            let Some(next) = current
                .finalize(accepted, FIXED_DISCOUNT, self.clock.utc())
                .map_err(map_transition_error)?
            else {
                return Ok(current);
            };

            match self.subscriptions.compare_and_set(owner, &current, &next).await {
                Ok(()) => return Ok(next),
                Err(SubscriptionRepositoryError::StaleState) => {
                    debug!(attempt, "stale subscription while finalising");
                }
                Err(err) => return Err(map_subscription_error(err)),
            }
        }
        Err(exhausted())
    }
}
