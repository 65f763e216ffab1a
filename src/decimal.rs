use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

/// fractional digits kept on every stored amount
pub const MONEY_SCALE: u32 = 2;

/// quantize to cents, rounding half-up (midpoint away from zero)
fn quantize(d: Decimal) -> Decimal {
    let mut q = d.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    q.rescale(MONEY_SCALE);
    q
}

/// Money with exactly two fractional digits.
///
/// Every constructor and every arithmetic result is quantized half-up, so a
/// `Money` is always safe to store into a schedule entry or an allocation.
/// Intermediate rate math should stay in `Decimal` and convert once at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, MONEY_SCALE));

    /// create from decimal, rounding half-up to cents
    pub fn from_decimal(d: Decimal) -> Self {
        Money(quantize(d))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(quantize(Decimal::from_str(s)?)))
    }

    /// create from whole currency units
    pub fn from_major(amount: i64) -> Self {
        Money(quantize(Decimal::from(amount)))
    }

    /// create from cents
    pub fn from_minor(cents: i64) -> Self {
        Money(Decimal::new(cents, MONEY_SCALE))
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

    /// strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// apply a rate (e.g. 2% of 100.00 = 2.00), rounding once at the end
    pub fn percentage(&self, rate: Rate) -> Self {
        Money::from_decimal(self.0 * rate.as_decimal())
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

impl From<Money> for Decimal {
    fn from(m: Money) -> Self {
        m.0
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(quantize(self.0 + other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = quantize(self.0 + other.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(quantize(self.0 - other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = quantize(self.0 - other.0);
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money(quantize(self.0 * other))
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money(quantize(self.0 / other))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + *x)
    }
}

/// rate type for interest rates, fee rates and ratios, kept at full precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 12 for 12%)
    pub fn from_percentage(p: Decimal) -> Self {
        Rate(p / Decimal::ONE_HUNDRED)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// split an annual rate into `periods_per_year` equal periods
    pub fn per_period(&self, periods_per_year: u32) -> Rate {
        Rate(self.0 / Decimal::from(periods_per_year))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
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
    fn test_money_rounds_half_up_to_cents() {
        assert_eq!(Money::from_decimal(dec!(0.005)).to_string(), "0.01");
        assert_eq!(Money::from_decimal(dec!(0.0049)).to_string(), "0.00");
        assert_eq!(Money::from_decimal(dec!(2.675)).to_string(), "2.68");
        assert_eq!(Money::from_str_exact("100.125").unwrap().to_string(), "100.13");
    }

    #[test]
    fn test_money_always_displays_two_places() {
        assert_eq!(Money::from_major(506).to_string(), "506.00");
        assert_eq!(Money::from_minor(49_400).to_string(), "494.00");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_division_rounds_once() {
        // 100 / 3 = 33.333.. -> 33.33, never compounded
        let third = Money::from_major(100) / dec!(3);
        assert_eq!(third, Money::from_minor(3_333));
        assert_eq!(third * dec!(3), Money::from_minor(9_999));
    }

    #[test]
    fn test_positive_excludes_zero() {
        assert!(!Money::ZERO.is_positive());
        assert!(Money::CENT.is_positive());
        assert!(Money::from_minor(-1).is_negative());
    }

    #[test]
    fn test_rate_percentage_and_period_split() {
        let annual = Rate::from_percentage(dec!(12));
        assert_eq!(annual.as_decimal(), dec!(0.12));
        assert_eq!(annual.per_period(24).as_decimal(), dec!(0.005));
        assert_eq!(annual.to_string(), "12%");
        assert!(!Rate::ZERO.is_negative());
        assert!(Rate::from_percentage(dec!(-1)).is_negative());
    }

    #[test]
    fn test_money_serializes_as_string() {
        let json = serde_json::to_string(&Money::from_major(506)).unwrap();
        assert_eq!(json, "\"506.00\"");
        let back: Money = serde_json::from_str("\"12.345\"").unwrap();
        assert_eq!(back, Money::from_minor(1_235));
    }
}
