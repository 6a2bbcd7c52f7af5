//! Cancellation attempt records and the pricing-experiment variant.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, FIXED_DISCOUNT, SubscriptionId, UserId};

/// Pricing-experiment arm shown during cancellation.
///
/// `A` surfaces no discount up front; `B` shows a discounted retention offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DownsellVariant {
    /// Control arm.
    A,
    /// Discounted retention offer.
    B,
}

impl DownsellVariant {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    /// Offer presented for a subscription priced at `price`.
    ///
    /// # Examples
    /// ```
    /// use cancel_flow::domain::{Cents, DownsellVariant};
    ///
    /// assert_eq!(DownsellVariant::A.offer_for(Cents::new(5_000)), Cents::new(5_000));
    /// assert_eq!(DownsellVariant::B.offer_for(Cents::new(5_000)), Cents::new(4_000));
    /// ```
    #[must_use]
    pub const fn offer_for(self, price: Cents) -> Cents {
        match self {
            Self::A => price,
            Self::B => price.saturating_sub(FIXED_DISCOUNT),
        }
    }
}

impl fmt::Display for DownsellVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown variant string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown downsell variant: {0}")]
pub struct ParseDownsellVariantError(pub String);

impl FromStr for DownsellVariant {
    type Err = ParseDownsellVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            other => Err(ParseDownsellVariantError(other.to_owned())),
        }
    }
}

/// Field bundle used to rehydrate a [`CancellationRecord`] from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationRecordDraft {
    pub id: Uuid,
    pub owner: UserId,
    pub subscription_id: SubscriptionId,
    pub variant: DownsellVariant,
    pub reason: Option<String>,
    pub accepted_downsell: bool,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// One subscription's cancellation attempt.
///
/// ## Invariants
/// - `variant` never changes after the record is first persisted.
/// - `reason`, when present, has already been through
///   [`sanitize_reason`](super::sanitize_reason).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationRecord {
    id: Uuid,
    owner: UserId,
    subscription_id: SubscriptionId,
    variant: DownsellVariant,
    reason: Option<String>,
    accepted_downsell: bool,
    created_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}

impl From<CancellationRecordDraft> for CancellationRecord {
    fn from(draft: CancellationRecordDraft) -> Self {
        let CancellationRecordDraft {
            id,
            owner,
            subscription_id,
            variant,
            reason,
            accepted_downsell,
            created_at,
            decided_at,
        } = draft;
        Self {
            id,
            owner,
            subscription_id,
            variant,
            reason,
            accepted_downsell,
            created_at,
            decided_at,
        }
    }
}

impl CancellationRecord {
    /// Start an undecided record with the given variant.
    #[must_use]
    pub fn new(
        owner: UserId,
        subscription_id: SubscriptionId,
        variant: DownsellVariant,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            subscription_id,
            variant,
            reason: None,
            accepted_downsell: false,
            created_at,
            decided_at: None,
        }
    }

    /// Record identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owning user.
    #[must_use]
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Subscription the attempt belongs to.
    #[must_use]
    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Assigned experiment arm.
    #[must_use]
    pub fn variant(&self) -> DownsellVariant {
        self.variant
    }

    /// Sanitised cancellation reason, if the user gave one.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Whether the user took the retention offer.
    #[must_use]
    pub fn accepted_downsell(&self) -> bool {
        self.accepted_downsell
    }

    /// Creation time; the newest record is authoritative.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the decision was recorded.
    #[must_use]
    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    /// Apply a decision, keeping the variant untouched.
    #[must_use]
    pub fn with_decision(
        self,
        accepted: bool,
        reason: Option<String>,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            accepted_downsell: accepted,
            reason,
            decided_at: Some(decided_at),
            ..self
        }
    }
}
