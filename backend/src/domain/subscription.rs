//! Subscription aggregate and its cancellation state machine.
//!
//! Status only moves `active → pending_cancellation → {active, cancelled}`;
//! `cancelled` is terminal. Transitions are pure: they return the next state
//! and leave persistence to the caller.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, UserId};

/// Opaque subscription identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriptionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Billing normally.
    Active,
    /// The owner opened the cancellation flow but has not decided yet.
    PendingCancellation,
    /// Terminal state.
    Cancelled,
}

impl SubscriptionStatus {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingCancellation => "pending_cancellation",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the cancellation flow may still act on the subscription.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::PendingCancellation)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown subscription status: {0}")]
pub struct ParseSubscriptionStatusError(pub String);

impl FromStr for SubscriptionStatus {
    type Err = ParseSubscriptionStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "pending_cancellation" => Ok(Self::PendingCancellation),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseSubscriptionStatusError(other.to_owned())),
        }
    }
}

/// Rejected state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionTransitionError {
    /// The subscription already reached its terminal state.
    #[error("subscription is already cancelled")]
    AlreadyCancelled,
}

/// Field bundle used to construct or rehydrate a [`Subscription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDraft {
    pub id: SubscriptionId,
    pub owner: UserId,
    pub monthly_price: Cents,
    pub status: SubscriptionStatus,
    pub discount_applied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's subscription.
///
/// ## Invariants
/// - `monthly_price` is never negative (enforced by [`Cents`]).
/// - The retention discount is applied at most once; `discount_applied`
///   records that it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    id: SubscriptionId,
    owner: UserId,
    monthly_price: Cents,
    status: SubscriptionStatus,
    discount_applied: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubscriptionDraft> for Subscription {
    fn from(draft: SubscriptionDraft) -> Self {
        let SubscriptionDraft {
            id,
            owner,
            monthly_price,
            status,
            discount_applied,
            created_at,
            updated_at,
        } = draft;
        Self {
            id,
            owner,
            monthly_price,
            status,
            discount_applied,
            created_at,
            updated_at,
        }
    }
}

impl Subscription {
    /// Create a fresh active subscription.
    #[must_use]
    pub fn new(owner: UserId, monthly_price: Cents, at: DateTime<Utc>) -> Self {
        Self {
            id: SubscriptionId::random(),
            owner,
            monthly_price,
            status: SubscriptionStatus::Active,
            discount_applied: false,
            created_at: at,
            updated_at: at,
        }
    }

    /// Subscription identifier.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Owning user.
    #[must_use]
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Current monthly price.
    #[must_use]
    pub fn monthly_price(&self) -> Cents {
        self.monthly_price
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    /// Whether the retention discount has been granted.
    #[must_use]
    pub fn discount_applied(&self) -> bool {
        self.discount_applied
    }

    /// Creation timestamp, used to pick the newest open subscription.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Timestamp of the last transition.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `other` holds the same mutable state as `self`.
    ///
    /// Used by stores as the compare-and-set predicate.
    #[must_use]
    pub fn same_state_as(&self, other: &Self) -> bool {
        self.id == other.id
            && self.owner == other.owner
            && self.status == other.status
            && self.monthly_price == other.monthly_price
            && self.discount_applied == other.discount_applied
    }

    /// Move an active subscription to `pending_cancellation`.
    ///
    /// Returns `Ok(None)` when the subscription is already pending so callers
    /// can treat repeated starts as a no-op.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use cancel_flow::domain::{Cents, Subscription, SubscriptionStatus, UserId};
    ///
    /// let sub = Subscription::new(UserId::random(), Cents::new(5_000), Utc::now());
    /// let next = sub
    ///     .begin_cancellation(Utc::now())
    ///     .expect("active subscriptions can begin cancelling")
    ///     .expect("status changes");
    /// assert_eq!(next.status(), SubscriptionStatus::PendingCancellation);
    /// assert_eq!(next.begin_cancellation(Utc::now()), Ok(None));
    /// ```
    pub fn begin_cancellation(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, SubscriptionTransitionError> {
        match self.status {
            SubscriptionStatus::Active => Ok(Some(Self {
                status: SubscriptionStatus::PendingCancellation,
                updated_at: at,
                ..self.clone()
            })),
            SubscriptionStatus::PendingCancellation => Ok(None),
            SubscriptionStatus::Cancelled => Err(SubscriptionTransitionError::AlreadyCancelled),
        }
    }

    /// Resolve the cancellation flow.
    ///
    /// `accepted = true` keeps the subscription active and grants `discount`
    /// unless a discount was already granted; the price floors at zero.
    /// `accepted = false` cancels. Repeating a cancellation on an already
    /// cancelled subscription returns `Ok(None)`; accepting an offer on one
    /// fails with [`SubscriptionTransitionError::AlreadyCancelled`].
    pub fn finalize(
        &self,
        accepted: bool,
        discount: Cents,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, SubscriptionTransitionError> {
        if self.status == SubscriptionStatus::Cancelled {
            return if accepted {
                Err(SubscriptionTransitionError::AlreadyCancelled)
            } else {
                Ok(None)
            };
        }

        if !accepted {
            return Ok(Some(Self {
                status: SubscriptionStatus::Cancelled,
                updated_at: at,
                ..self.clone()
            }));
        }

        let monthly_price = if self.discount_applied {
            self.monthly_price
        } else {
            self.monthly_price.saturating_sub(discount)
        };
        Ok(Some(Self {
            status: SubscriptionStatus::Active,
            monthly_price,
            discount_applied: true,
            updated_at: at,
            ..self.clone()
        }))
    }
}
