//! Fixed-point money arithmetic.
//!
//! Every [`Money`] value carries exactly two fraction digits. Rounding is
//! round-half-up in magnitude (`1.005 -> 1.01`, `-1.005 -> -1.01`) and is applied
//! on construction and after *every* operation, never once at the end:
//!
//! - `add(a, b)  = scale(scale(a) + scale(b))`
//! - `sub(a, b)  = scale(scale(a) - scale(b))`
//! - `mul(a, b)  = scale(scale(a) * scale(b))`
//!
//! Historical invoice figures depend on this exact policy, including the fact
//! that a multiplier (quantity, tax fraction) is itself rounded to two digits
//! before the product is taken.
//!
//! Absent operands are zero. A result that does not fit rust_decimal's 96-bit
//! mantissa at scale 2 is reported as [`DomainError::InvariantViolation`]
//! instead of panicking.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Number of fraction digits carried by every money value.
pub const MONEY_SCALE: u32 = 2;

/// A decimal amount fixed at two fraction digits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl ValueObject for Money {}

impl Money {
    /// `0.00`
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    /// Round a raw decimal to two digits; an absent value is zero.
    pub fn scale(value: Option<Decimal>) -> Self {
        match value {
            Some(v) => Self(round_half_up(v)),
            None => Self::ZERO,
        }
    }

    /// Build from an integer number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_SCALE))
    }

    /// Underlying decimal (always scale 2).
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// `self + rhs`, rounded; `None` on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).and_then(fit)
    }

    /// `self - rhs`, rounded; `None` on overflow.
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).and_then(fit)
    }

    /// Multiply by a raw factor.
    ///
    /// The factor is rounded to two digits first and the product is rounded
    /// again, so `Money(100.00) * 0.075` is `8.00`, not `7.50`.
    pub fn checked_mul(self, factor: Decimal) -> Option<Money> {
        self.0.checked_mul(round_half_up(factor)).and_then(fit)
    }

    /// Left-to-right sum, rounding after each step.
    pub fn checked_sum<I>(values: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        values
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

fn round_half_up(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // round_dp never widens the scale; pad so `5` becomes `5.00`.
    rounded.rescale(MONEY_SCALE);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

/// Round an arithmetic result, rejecting magnitudes too wide to keep two
/// fraction digits.
fn fit(value: Decimal) -> Option<Money> {
    let rounded = round_half_up(value);
    (rounded.scale() == MONEY_SCALE).then_some(Money(rounded))
}

fn overflow(op: &str) -> DomainError {
    DomainError::invariant(format!("money {op} overflowed the decimal range"))
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(round_half_up(value))
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::validation(format!("invalid money amount {s:?}: {e}")))?;
        Ok(Money::from(raw))
    }
}

/// `scale(x)`: round to two digits, absent = zero.
pub fn scale(value: Option<Decimal>) -> Money {
    Money::scale(value)
}

/// `add(a, b)`: both operands scaled, summed, result scaled.
pub fn add(a: Option<Decimal>, b: Option<Decimal>) -> DomainResult<Money> {
    Money::scale(a)
        .checked_add(Money::scale(b))
        .ok_or_else(|| overflow("add"))
}

/// `sub(a, b)`: both operands scaled, subtracted, result scaled.
pub fn sub(a: Option<Decimal>, b: Option<Decimal>) -> DomainResult<Money> {
    Money::scale(a)
        .checked_sub(Money::scale(b))
        .ok_or_else(|| overflow("sub"))
}

/// `mul(a, b)`: both operands scaled, multiplied, result scaled.
pub fn mul(a: Option<Decimal>, b: Option<Decimal>) -> DomainResult<Money> {
    Money::scale(a)
        .checked_mul(b.unwrap_or(Decimal::ZERO))
        .ok_or_else(|| overflow("mul"))
}
