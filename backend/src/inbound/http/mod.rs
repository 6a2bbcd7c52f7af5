//! HTTP inbound adapter exposing the cancellation wizard.

pub mod cancel;
pub mod csrf;
pub mod error;
pub mod health;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
