//! Ownership guard.
//!
//! Absent and foreign subscriptions are indistinguishable to the caller:
//! both surface as the same `not_found` error.

use crate::domain::ports::{CancellationRepository, SubscriptionRepository, VariantSource};
use crate::domain::{Error, Subscription, SubscriptionId, UserId};

use super::CancelFlowService;
use super::error_mapping::map_subscription_error;

fn subscription_not_found() -> Error {
    Error::not_found("subscription not found")
}

impl<S, C, V> CancelFlowService<S, C, V>
where
    S: SubscriptionRepository,
    C: CancellationRepository,
    V: VariantSource,
{
    /// Load a subscription owned by `owner` or fail with `not_found`.
    pub(super) async fn require_owned(
        &self,
        owner: &UserId,
        id: &SubscriptionId,
    ) -> Result<Subscription, Error> {
        self.subscriptions
            .find_owned(owner, id)
            .await
            .map_err(map_subscription_error)?
            .filter(|subscription| subscription.owner() == owner)
            .ok_or_else(subscription_not_found)
    }

    /// Newest open subscription owned by `owner` or `not_found`.
    pub(super) async fn require_latest_open(&self, owner: &UserId) -> Result<Subscription, Error> {
        self.subscriptions
            .latest_open_for(owner)
            .await
            .map_err(map_subscription_error)?
            .filter(|subscription| subscription.owner() == owner && subscription.status().is_open())
            .ok_or_else(|| Error::not_found("no active subscription"))
    }
}
