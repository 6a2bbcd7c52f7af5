//! Driving port for the cancellation wizard.
//!
//! Inbound adapters resolve the acting user and call these operations; each
//! call is an independent unit that reads all state from the stores.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, DownsellVariant, Error, SubscriptionId, SubscriptionStatus, UserId};

/// Result of opening the cancellation flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCancellationResponse {
    pub subscription_id: SubscriptionId,
    pub price: Cents,
    pub status: SubscriptionStatus,
    /// Previously assigned variant, if any. Starting never assigns one.
    pub variant: Option<DownsellVariant>,
}

/// Result of a variant assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVariantResponse {
    pub variant: DownsellVariant,
    pub price: Cents,
    pub offer: Cents,
}

/// Final choice submitted by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    pub owner: UserId,
    pub subscription_id: SubscriptionId,
    pub accepted: bool,
    /// Raw reason text; sanitised before it is stored and never echoed.
    pub reason: Option<String>,
}

/// Outcome of a decision. Deliberately carries only the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideResponse {
    pub status: SubscriptionStatus,
}

/// Driving port for cancellation flow operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CancelFlowCommand: Send + Sync {
    /// Open the flow on the owner's newest active or pending subscription.
    ///
    /// Fails with `not_found` when no such subscription exists.
    async fn start(&self, owner: &UserId) -> Result<StartCancellationResponse, Error>;

    /// Assign (or reuse) the pricing-experiment variant for a subscription.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use cancel_flow::domain::{SubscriptionId, UserId};
    /// # use cancel_flow::domain::ports::{CancelFlowCommand, FixtureCancelFlowCommand};
    /// # async fn example() -> Result<(), cancel_flow::domain::Error> {
    /// let command = FixtureCancelFlowCommand;
    /// let response = command
    ///     .assign(&UserId::random(), &SubscriptionId::random())
    ///     .await?;
    /// assert!(response.offer <= response.price);
    /// # Ok(())
    /// # }
    /// ```
    async fn assign(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
    ) -> Result<AssignVariantResponse, Error>;

    /// Reconcile the user's final choice into the record and subscription.
    async fn decide(&self, request: DecideRequest) -> Result<DecideResponse, Error>;
}

/// Fixture command implementation for adapter tests that do not need stores.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCancelFlowCommand;

#[async_trait]
impl CancelFlowCommand for FixtureCancelFlowCommand {
    async fn start(&self, _owner: &UserId) -> Result<StartCancellationResponse, Error> {
        Ok(StartCancellationResponse {
            subscription_id: SubscriptionId::random(),
            price: Cents::new(2_500),
            status: SubscriptionStatus::PendingCancellation,
            variant: None,
        })
    }

    async fn assign(
        &self,
        _owner: &UserId,
        _subscription: &SubscriptionId,
    ) -> Result<AssignVariantResponse, Error> {
        let price = Cents::new(2_500);
        Ok(AssignVariantResponse {
            variant: DownsellVariant::B,
            price,
            offer: DownsellVariant::B.offer_for(price),
        })
    }

    async fn decide(&self, request: DecideRequest) -> Result<DecideResponse, Error> {
        let status = if request.accepted {
            SubscriptionStatus::Active
        } else {
            SubscriptionStatus::Cancelled
        };
        Ok(DecideResponse { status })
    }
}
