//! Source of fresh pricing-experiment assignments.

use crate::domain::DownsellVariant;

/// Supplies a new variant when a subscription has none yet.
///
/// Implementations must draw uniformly from `{A, B}`.
#[cfg_attr(test, mockall::automock)]
pub trait VariantSource: Send + Sync {
    /// Draw a variant.
    fn flip(&self) -> DownsellVariant;
}

/// Deterministic source that always yields the configured variant.
#[derive(Debug, Clone, Copy)]
pub struct FixtureVariantSource(pub DownsellVariant);

impl Default for FixtureVariantSource {
    fn default() -> Self {
        Self(DownsellVariant::A)
    }
}

impl VariantSource for FixtureVariantSource {
    fn flip(&self) -> DownsellVariant {
        self.0
    }
}
