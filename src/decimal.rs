use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// basis points in one whole
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Money type with 8 decimal places precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(8))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?.round_dp(8)))
    }

    /// create from whole token units
    pub fn from_major(amount: u64) -> Self {
        Money(Decimal::from(amount))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// add, capping at the largest representable amount
    pub fn saturating_add(self, other: Self) -> Self {
        self.checked_add(other).unwrap_or(Money(Decimal::MAX))
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(|sum| Money(sum.round_dp(8)))
    }

    /// apply a rate (e.g. 50 bps of 1000 = 5)
    pub fn apply(&self, rate: Rate) -> Self {
        Money((self.0 * rate.as_decimal()).round_dp(8))
    }

    /// `apply`, or `None` when the product is not representable
    pub fn checked_apply(&self, rate: Rate) -> Option<Self> {
        self.0
            .checked_mul(rate.as_decimal())
            .map(|product| Money(product.round_dp(8)))
    }

    /// this amount relative to `base`, in basis points; `None` for a zero base.
    /// ratios beyond the decimal range saturate at `Decimal::MAX`
    pub fn ratio_bps(&self, base: Money) -> Option<Decimal> {
        if base.is_zero() {
            return None;
        }
        let bps = Decimal::from(BPS_DENOMINATOR);
        let ratio = self
            .0
            .checked_mul(bps)
            .and_then(|scaled| scaled.checked_div(base.0))
            .or_else(|| self.0.checked_div(base.0).and_then(|r| r.checked_mul(bps)))
            .unwrap_or(Decimal::MAX);
        Some(ratio)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<u64> for Money {
    fn from(i: u64) -> Self {
        Money::from_major(i)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as u64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(8))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(8))
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money((self.0 * other).round_dp(8))
    }
}

/// rate type for interest rates and collateral ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from basis points (e.g., 500 for 5%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(BPS_DENOMINATOR))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.123456789").unwrap();
        assert_eq!(m.to_string(), "100.12345679"); // rounded to 8 places
    }

    #[test]
    fn test_bps_application() {
        let principal = Money::from_major(1_000);

        assert_eq!(principal.apply(Rate::from_bps(50)), Money::from_major(5));
        assert_eq!(principal.apply(Rate::from_bps(10_000)), principal);
        assert_eq!(principal.apply(Rate::ZERO), Money::ZERO);
    }

    #[test]
    fn test_ratio_bps() {
        let collateral = Money::from_major(2_500);
        let principal = Money::from_major(1_000);

        assert_eq!(collateral.ratio_bps(principal), Some(dec!(25000)));
        assert_eq!(collateral.ratio_bps(Money::ZERO), None);
    }

    #[test]
    fn test_ratio_bps_of_huge_collateral_saturates() {
        let collateral = Money::from_str_exact("10000000000000000000000000").unwrap();
        let principal = Money::from_major(1_000);
        assert_eq!(collateral.ratio_bps(principal), Some(dec!(100000000000000000000000000)));

        let tiny = Money::from_str_exact("0.00000001").unwrap();
        assert_eq!(Money::from_decimal(Decimal::MAX).ratio_bps(tiny), Some(Decimal::MAX));
    }

    #[test]
    fn test_checked_arithmetic_at_the_top_of_the_range() {
        let max = Money::from_decimal(Decimal::MAX);

        assert_eq!(max.checked_add(Money::from_major(1)), None);
        assert_eq!(max.saturating_add(Money::from_major(1)), max);
        assert_eq!(max.checked_apply(Rate::from_bps(20_000)), None);
        assert_eq!(
            Money::from_major(1_000).checked_apply(Rate::from_bps(50)),
            Some(Money::from_major(5))
        );
    }

    #[test]
    fn test_positive_excludes_zero() {
        assert!(!Money::ZERO.is_positive());
        assert!(Money::from_major(1).is_positive());
    }
}
