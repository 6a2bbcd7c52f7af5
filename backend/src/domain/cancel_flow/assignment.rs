//! Variant assignment.

use tracing::info;

use crate::domain::ports::{
    AssignVariantResponse, CancellationRepository, SubscriptionRepository, VariantSource,
};
use crate::domain::{
    Error, SubscriptionId, SubscriptionStatus, SubscriptionTransitionError, UserId,
};

use super::CancelFlowService;
use super::error_mapping::map_transition_error;

impl<S, C, V> CancelFlowService<S, C, V>
where
    S: SubscriptionRepository,
    C: CancellationRepository,
    V: VariantSource,
{
    /// Assign the experiment variant once and price the offer from the
    /// current subscription price.
    pub(super) async fn assign_variant(
        &self,
        owner: &UserId,
        id: &SubscriptionId,
    ) -> Result<AssignVariantResponse, Error> {
        let subscription = self.require_owned(owner, id).await?;
        if subscription.status() == SubscriptionStatus::Cancelled {
            return Err(map_transition_error(
                SubscriptionTransitionError::AlreadyCancelled,
            ));
        }

        let variants = &self.variants;
        let variant = self
            .ensure_and_get_variant(owner, id, || variants.flip())
            .await?;
        let price = subscription.monthly_price();
        let offer = variant.offer_for(price);
        info!(%variant, "downsell variant resolved");

        Ok(AssignVariantResponse {
            variant,
            price,
            offer,
        })
    }
}
