//! Minor-currency amounts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Non-negative amount in minor currency units (cents).
///
/// Subtraction saturates at zero so a price can never go negative.
///
/// # Examples
/// ```
/// use cancel_flow::domain::{Cents, FIXED_DISCOUNT};
///
/// assert_eq!(Cents::new(5_000).saturating_sub(FIXED_DISCOUNT), Cents::new(4_000));
/// assert_eq!(Cents::new(500).saturating_sub(FIXED_DISCOUNT), Cents::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(u32);

/// Retention discount granted at most once per subscription ($10.00).
pub const FIXED_DISCOUNT: Cents = Cents(1_000);

impl Cents {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw number of cents.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw number of cents.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Subtract `other`, flooring the result at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u32> for Cents {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<i32> for Cents {
    type Error = std::num::TryFromIntError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u32::try_from(value).map(Self)
    }
}

impl TryFrom<i64> for Cents {
    type Error = std::num::TryFromIntError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value).map(Self)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
