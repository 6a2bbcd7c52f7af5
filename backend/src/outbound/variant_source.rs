//! Operating-system entropy backed variant source.

use rand::Rng;
use rand::rngs::OsRng;

use crate::domain::DownsellVariant;
use crate::domain::ports::VariantSource;

/// Fair coin drawn from the OS CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngVariantSource;

impl VariantSource for OsRngVariantSource {
    fn flip(&self) -> DownsellVariant {
        if OsRng.gen_bool(0.5) {
            DownsellVariant::B
        } else {
            DownsellVariant::A
        }
    }
}
