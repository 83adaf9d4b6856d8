use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "INR";

//--------------------------------------        Paise          ---------------------------------------------------------
/// A monetary amount in the minor unit of the marketplace currency (1 rupee = 100 paise).
///
/// All amounts in the system are integers of this type, so sums and comparisons are exact.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize, Hash)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Paise(i64);

op!(binary Paise, Add, add);
op!(binary Paise, Sub, sub);
op!(inplace Paise, AddAssign, add_assign);
op!(inplace Paise, SubAssign, sub_assign);
op!(unary Paise, Neg, neg);

impl Sum for Paise {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Paise> for Paise {
    fn sum<I: Iterator<Item = &'a Paise>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paise: {0}")]
pub struct PaiseConversionError(String);

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Paise {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Paise {}

impl TryFrom<u64> for Paise {
    type Error = PaiseConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PaiseConversionError(format!("Value {value} is too large to convert to Paise")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}₹{}.{:02}", abs / 100, abs % 100)
    }
}

impl Paise {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whole rupees in paise. Saturates at the bounds of `i64`; use [`Self::try_from_rupees`] for untrusted input.
    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees.saturating_mul(100))
    }

    pub fn try_from_rupees(rupees: i64) -> Result<Self, PaiseConversionError> {
        rupees
            .checked_mul(100)
            .map(Self)
            .ok_or_else(|| PaiseConversionError(format!("{rupees} rupees is too large to convert to Paise")))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// Adds up `amounts`, or returns `None` if the total does not fit in an `i64`.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts.into_iter().try_fold(Self::default(), Self::checked_add)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}
