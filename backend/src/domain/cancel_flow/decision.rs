//! Decision reconciliation.

use tracing::info;

use crate::domain::ports::{
    CancellationRepository, DecideRequest, DecideResponse, SubscriptionRepository, VariantSource,
};
use crate::domain::{
    Error, SubscriptionStatus, SubscriptionTransitionError, sanitize_reason,
};

use super::CancelFlowService;
use super::error_mapping::map_transition_error;

impl<S, C, V> CancelFlowService<S, C, V>
where
    S: SubscriptionRepository,
    C: CancellationRepository,
    V: VariantSource,
{
    /// Record the decision and settle the subscription status.
    ///
    /// Declining again on a cancelled subscription is a no-op; accepting an
    /// offer on one is a `conflict`.
    pub(super) async fn reconcile(&self, request: DecideRequest) -> Result<DecideResponse, Error> {
        let DecideRequest {
            owner,
            subscription_id,
            accepted,
            reason,
        } = request;

        let current = self.require_owned(&owner, &subscription_id).await?;
        if current.status() == SubscriptionStatus::Cancelled {
            if accepted {
                return Err(map_transition_error(
                    SubscriptionTransitionError::AlreadyCancelled,
                ));
            }
            return Ok(DecideResponse {
                status: SubscriptionStatus::Cancelled,
            });
        }

        let reason = reason.as_deref().and_then(sanitize_reason);
        self.record_decision(&owner, &subscription_id, accepted, reason)
            .await?;
        let settled = self.finalize(&owner, &subscription_id, accepted).await?;
        info!(status = %settled.status(), "cancellation decision recorded");

        Ok(DecideResponse {
            status: settled.status(),
        })
    }
}
