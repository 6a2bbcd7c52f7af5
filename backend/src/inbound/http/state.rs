//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{CancelFlowCommand, FixtureCancelFlowCommand};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub cancel_flow: Arc<dyn CancelFlowCommand>,
}

impl HttpState {
    /// Construct state from the cancellation use-case port.
    pub fn new(cancel_flow: Arc<dyn CancelFlowCommand>) -> Self {
        Self { cancel_flow }
    }
}

impl Default for HttpState {
    fn default() -> Self {
        Self::new(Arc::new(FixtureCancelFlowCommand))
    }
}
