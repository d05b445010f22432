use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------     UsdCents       ----------------------------------------------------------
/// Deposit amounts in US cents. Affiliate networks report decimal dollar strings; everything downstream of ingestion
/// works in integer cents so that ledger accumulation is exact.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UsdCents(i64);

op!(binary UsdCents, Add, add);
op!(binary UsdCents, Sub, sub);
op!(inplace UsdCents, SubAssign, sub_assign);
op!(unary UsdCents, Neg, neg);

impl Mul<i64> for UsdCents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for UsdCents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in US cents: {0}")]
pub struct UsdConversionError(String);

impl From<i64> for UsdCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for UsdCents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for UsdCents {}

impl TryFrom<u64> for UsdCents {
    type Error = UsdConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(UsdConversionError(format!("Value {} is too large to convert to UsdCents", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl FromStr for UsdCents {
    type Err = UsdConversionError;

    /// Parses a decimal dollar amount ("12", "12.5", "12.50") into cents. Fractions beyond cents are truncated,
    /// which is what the upstream networks send anyway.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UsdConversionError("empty string".to_string()));
        }
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };
        let (dollars, frac) = match s.split_once('.') {
            Some((d, f)) => (d, f),
            None => (s, ""),
        };
        if !dollars.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(UsdConversionError(format!("{s} is not a decimal dollar amount")));
        }
        let dollars = if dollars.is_empty() {
            0
        } else {
            dollars.parse::<i64>().map_err(|e| UsdConversionError(format!("{s}: {e}")))?
        };
        let cents = match frac.len() {
            0 => 0,
            _ => {
                // Only ASCII digits reach here, so a byte slice lands on a char boundary.
                let f = &frac[..frac.len().min(2)];
                let val = f.parse::<i64>().map_err(|e| UsdConversionError(format!("{s}: {e}")))?;
                if f.len() == 1 {
                    val * 10
                } else {
                    val
                }
            },
        };
        dollars
            .checked_mul(100)
            .and_then(|d| d.checked_add(cents))
            .and_then(|v| v.checked_mul(sign))
            .map(Self)
            .ok_or_else(|| UsdConversionError(format!("{s} does not fit in US cents")))
    }
}

impl Display for UsdCents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

impl UsdCents {
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }
}
