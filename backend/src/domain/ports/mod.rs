//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod cancel_flow_command;
mod cancellation_repository;
mod subscription_repository;
mod variant_source;

#[cfg(test)]
pub use cancel_flow_command::MockCancelFlowCommand;
pub use cancel_flow_command::{
    AssignVariantResponse, CancelFlowCommand, DecideRequest, DecideResponse,
    FixtureCancelFlowCommand, StartCancellationResponse,
};
#[cfg(test)]
pub use cancellation_repository::MockCancellationRepository;
pub use cancellation_repository::{
    CancellationDecision, CancellationRepository, CancellationRepositoryError,
    FixtureCancellationRepository,
};
#[cfg(test)]
pub use subscription_repository::MockSubscriptionRepository;
pub use subscription_repository::{
    FixtureSubscriptionRepository, SubscriptionRepository, SubscriptionRepositoryError,
};
#[cfg(test)]
pub use variant_source::MockVariantSource;
pub use variant_source::{FixtureVariantSource, VariantSource};
