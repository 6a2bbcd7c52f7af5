//! Domain primitives, aggregates and services.
//!
//! Purpose: hold the cancellation wizard's rules independent of transport
//! and storage. Adapters reach the domain only through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - Subscription / CancellationRecord: the two persisted aggregates.
//! - DownsellVariant: the pricing-experiment arm.
//! - CancelFlowService: implementation of the cancellation driving port.

pub mod cancel_flow;
pub mod cancellation;
pub mod error;
pub mod money;
pub mod ports;
pub mod reason;
pub mod subscription;
pub mod trace_id;
pub mod user;

pub use self::cancel_flow::{CancelFlowService, MAX_TRANSITION_ATTEMPTS};
pub use self::cancellation::{
    CancellationRecord, CancellationRecordDraft, DownsellVariant, ParseDownsellVariantError,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::money::{Cents, FIXED_DISCOUNT};
pub use self::reason::{MAX_REASON_CHARS, sanitize_reason};
pub use self::subscription::{
    ParseSubscriptionStatusError, Subscription, SubscriptionDraft, SubscriptionId,
    SubscriptionStatus, SubscriptionTransitionError,
};
pub use self::trace_id::TraceId;
pub use self::user::{UserId, UserValidationError};

