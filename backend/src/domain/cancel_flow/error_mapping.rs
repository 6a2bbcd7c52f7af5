//! Port error to domain error translation.

use tracing::warn;

use crate::domain::ports::{CancellationRepositoryError, SubscriptionRepositoryError};
use crate::domain::{Error, SubscriptionTransitionError};

pub(super) fn map_subscription_error(error: SubscriptionRepositoryError) -> Error {
    match error {
        SubscriptionRepositoryError::Connection { message } => {
            warn!(%message, "subscription store unavailable");
            Error::service_unavailable("subscription store unavailable")
        }
        SubscriptionRepositoryError::Query { message } => {
            Error::internal(format!("subscription store error: {message}"))
        }
        SubscriptionRepositoryError::StaleState => {
            Error::conflict("subscription changed concurrently; retry the request")
        }
    }
}

pub(super) fn map_cancellation_error(error: CancellationRepositoryError) -> Error {
    match error {
        CancellationRepositoryError::Connection { message } => {
            warn!(%message, "cancellation store unavailable");
            Error::service_unavailable("cancellation store unavailable")
        }
        CancellationRepositoryError::Query { message } => {
            Error::internal(format!("cancellation store error: {message}"))
        }
        CancellationRepositoryError::Missing => {
            Error::internal("cancellation record vanished during update")
        }
    }
}

pub(super) fn map_transition_error(error: SubscriptionTransitionError) -> Error {
    match error {
        SubscriptionTransitionError::AlreadyCancelled => {
            Error::conflict("subscription is already cancelled")
        }
    }
}
