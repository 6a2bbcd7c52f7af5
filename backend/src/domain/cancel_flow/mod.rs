//! Cancellation flow domain service.
//!
//! `CancelFlowService` implements the [`CancelFlowCommand`] driving port by
//! composing four concerns, each in its own module:
//! - [`ownership`]: every store access is scoped to the acting user;
//! - [`lifecycle`]: subscription status transitions under compare-and-set;
//! - [`records`]: the per-subscription cancellation record;
//! - [`assignment`] and [`decision`]: the two user-facing steps.
//!
//! No state is held between calls. Replays, skipped steps and concurrent
//! callers are reconciled against whatever the stores hold.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::instrument;

use crate::domain::Error;
use crate::domain::ports::{
    AssignVariantResponse, CancelFlowCommand, CancellationRepository, DecideRequest,
    DecideResponse, StartCancellationResponse, SubscriptionRepository, VariantSource,
};
use crate::domain::{SubscriptionId, UserId};

mod assignment;
mod decision;
mod error_mapping;
mod lifecycle;
mod ownership;
mod records;

/// Compare-and-set attempts before a transition gives up with `conflict`.
pub const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// Domain service implementing the cancellation wizard.
#[derive(Clone)]
pub struct CancelFlowService<S, C, V> {
    subscriptions: Arc<S>,
    cancellations: Arc<C>,
    variants: Arc<V>,
    clock: Arc<dyn Clock>,
}

impl<S, C, V> CancelFlowService<S, C, V> {
    /// Create a new service over the given stores, variant source and clock.
    pub fn new(
        subscriptions: Arc<S>,
        cancellations: Arc<C>,
        variants: Arc<V>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subscriptions,
            cancellations,
            variants,
            clock,
        }
    }
}

#[async_trait]
impl<S, C, V> CancelFlowCommand for CancelFlowService<S, C, V>
where
    S: SubscriptionRepository,
    C: CancellationRepository,
    V: VariantSource,
{
    #[instrument(skip_all, fields(owner = %owner))]
    async fn start(&self, owner: &UserId) -> Result<StartCancellationResponse, Error> {
        let subscription = self.begin_cancellation(owner).await?;
        let existing = self.latest_record(owner, &subscription.id()).await?;

        Ok(StartCancellationResponse {
            subscription_id: subscription.id(),
            price: subscription.monthly_price(),
            status: subscription.status(),
            variant: existing.map(|record| record.variant()),
        })
    }

    #[instrument(skip_all, fields(owner = %owner, subscription = %subscription))]
    async fn assign(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
    ) -> Result<AssignVariantResponse, Error> {
        self.assign_variant(owner, subscription).await
    }

    #[instrument(
        skip_all,
        fields(owner = %request.owner, subscription = %request.subscription_id, accepted = request.accepted)
    )]
    async fn decide(&self, request: DecideRequest) -> Result<DecideResponse, Error> {
        self.reconcile(request).await
    }
}
