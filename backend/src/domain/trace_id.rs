//! Per-request correlation id.
//!
//! The `Trace` middleware mints one id per request and runs the handler
//! inside [`TraceId::in_scope`]; [`Error`](super::Error) constructors read it
//! back with [`TraceId::current`]. Task-locals do not follow `tokio::spawn`,
//! so spawned work sees no id unless it is scoped again.

use std::fmt;
use std::future::Future;

use uuid::Uuid;

tokio::task_local! {
    static CURRENT: TraceId;
}

/// Random request id rendered as a hyphenated UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Mint a fresh id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The id of the request being served on this task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Run `fut` with this id as the current one.
    ///
    /// # Examples
    /// ```
    /// use cancel_flow::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
    /// let id = TraceId::generate();
    /// assert_eq!(id.in_scope(async { TraceId::current() }).await, Some(id));
    /// assert_eq!(TraceId::current(), None);
    /// # });
    /// ```
    pub async fn in_scope<Fut: Future>(self, fut: Fut) -> Fut::Output {
        CURRENT.scope(self, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
