//! Subscription cancellation flow with a retention downsell experiment.
//!
//! The crate is laid out hexagonally: [`domain`] holds the entities, the
//! ports and the cancellation service; [`inbound`] adapts HTTP requests onto
//! the driving port; [`outbound`] implements the driven ports against
//! PostgreSQL, process memory and the operating-system RNG.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
