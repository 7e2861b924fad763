//! Fixed-precision money representation.
//!
//! All balances, targets, and ledger deltas in the system are [`Money`]: a
//! base-10 fixed-point value held at two fractional digits (currency minor
//! units), backed by [`rust_decimal::Decimal`]. Binary floating point is never
//! used for storage, arithmetic, or comparison. Values round-trip exactly
//! through their canonical decimal string form and are stored in
//! `DECIMAL(10, 2)` columns.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::sea_query::{ArrayType, ColumnType, Nullable, ValueType, ValueTypeErr};
use sea_orm::{ColIdx, QueryResult, TryGetError, TryGetable, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Neg};
use std::str::FromStr;

const SCALE: u32 = 2;

/// A monetary amount at scale 2.
///
/// `Money` is signed: balances are kept non-negative by the operations that
/// mutate them, but ledger deltas legitimately carry either sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars and zero cents.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Builds a `Money` from an arbitrary decimal, rounding half-even to two
    /// fractional digits and normalizing the scale.
    #[must_use]
    pub fn new(value: Decimal) -> Self {
        let mut d = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointNearestEven);
        d.rescale(SCALE);
        Money(d)
    }

    /// The underlying decimal, always at scale 2.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Subtraction that refuses to go below zero.
    ///
    /// This is the draw-down primitive for balances, which are conceptually
    /// non-negative; use [`Money::saturating_sub`] when clamping is wanted
    /// instead of an error.
    pub fn sub(self, rhs: Money) -> Result<Money> {
        if rhs.0 > self.0 {
            return Err(Error::NegativeResult {
                available: self,
                requested: rhs,
            });
        }
        Ok(Money::new(self.0 - rhs.0))
    }

    /// Subtraction clamped at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Money) -> Money {
        if rhs.0 >= self.0 {
            Money::ZERO
        } else {
            Money::new(self.0 - rhs.0)
        }
    }

    /// Applies a percentage (`pct` is in percent units, e.g. `10` for 10%),
    /// truncating toward zero at scale 2 so the share never exceeds the exact
    /// proportion.
    #[must_use]
    pub fn percent(self, pct: Decimal) -> Money {
        let raw = self.0 * pct / Decimal::ONE_HUNDRED;
        let mut d = raw.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero);
        d.rescale(SCALE);
        Money(d)
    }

    #[must_use]
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 { self } else { other }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::new(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money::new(-self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Scale is normalized at construction, so this prints `-?\d+\.\d{2}`.
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = Error;

    /// Parses the canonical decimal form. Inputs with more than two
    /// fractional digits are rejected rather than silently rounded.
    fn from_str(s: &str) -> Result<Money> {
        let d = Decimal::from_str(s).map_err(|_| Error::ParseMoney {
            input: s.to_string(),
        })?;
        if d.scale() > SCALE {
            return Err(Error::ParseMoney {
                input: s.to_string(),
            });
        }
        Ok(Money::new(d))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// sea-orm value plumbing so entities store Money directly. Reads are
// re-normalized through `Money::new`: the SQLite driver round-trips decimals
// through their shortest representation, which can drop trailing zeros.

impl From<Money> for Value {
    fn from(m: Money) -> Self {
        Value::Decimal(Some(Box::new(m.0)))
    }
}

impl TryGetable for Money {
    fn try_get_by<I: ColIdx>(res: &QueryResult, idx: I) -> std::result::Result<Self, TryGetError> {
        Decimal::try_get_by(res, idx).map(Money::new)
    }
}

impl ValueType for Money {
    fn try_from(v: Value) -> std::result::Result<Self, ValueTypeErr> {
        <Decimal as ValueType>::try_from(v).map(Money::new)
    }

    fn type_name() -> String {
        stringify!(Money).to_owned()
    }

    fn array_type() -> ArrayType {
        ArrayType::Decimal
    }

    fn column_type() -> ColumnType {
        ColumnType::Decimal(Some((10, SCALE)))
    }
}

impl Nullable for Money {
    fn null() -> Value {
        Value::Decimal(None)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_construction_normalizes_scale() {
        assert_eq!(Money::new(dec!(850)).to_string(), "850.00");
        assert_eq!(Money::new(dec!(12.5)).to_string(), "12.50");
        assert_eq!(Money::new(dec!(0.005)).to_string(), "0.00"); // half-even
        assert_eq!(Money::new(dec!(0.015)).to_string(), "0.02");
    }

    #[test]
    fn test_canonical_string_round_trip() {
        for s in ["0.00", "12.34", "-5.00", "1000000.99"] {
            let m: Money = s.parse().unwrap();
            assert_eq!(m.to_string(), s);
        }
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        assert!(matches!(
            "1.005".parse::<Money>(),
            Err(Error::ParseMoney { .. })
        ));
        assert!(matches!(
            "abc".parse::<Money>(),
            Err(Error::ParseMoney { .. })
        ));
    }

    #[test]
    fn test_sub_refuses_negative_result() {
        let ten = Money::new(dec!(10.00));
        let twenty = Money::new(dec!(20.00));

        assert_eq!(twenty.sub(ten).unwrap(), ten);
        assert_eq!(ten.sub(ten).unwrap(), Money::ZERO);

        let err = ten.sub(twenty).unwrap_err();
        assert!(matches!(err, Error::NegativeResult { .. }));
    }

    #[test]
    fn test_saturating_sub_clamps_at_zero() {
        let ten = Money::new(dec!(10.00));
        let twenty = Money::new(dec!(20.00));

        assert_eq!(ten.saturating_sub(twenty), Money::ZERO);
        assert_eq!(twenty.saturating_sub(ten), ten);
    }

    #[test]
    fn test_percent_truncates_toward_zero() {
        let amount = Money::new(dec!(200.00));
        assert_eq!(amount.percent(dec!(10)), Money::new(dec!(20.00)));

        // 33.333... truncates, never rounds up past the exact share.
        let odd = Money::new(dec!(100.00));
        assert_eq!(odd.percent(dec!(33.33)), Money::new(dec!(33.33)));
        assert_eq!(Money::new(dec!(0.10)).percent(dec!(33)), Money::new(dec!(0.03)));
    }

    #[test]
    fn test_signed_deltas() {
        let m = Money::new(dec!(12.34));
        assert_eq!((-m).to_string(), "-12.34");
        assert!((-m).is_negative());
        assert_eq!(m + (-m), Money::ZERO);
    }

    #[test]
    fn test_ordering_and_min() {
        let a = Money::new(dec!(1.00));
        let b = Money::new(dec!(2.00));
        assert!(a < b);
        assert_eq!(a.min(b), a);
        assert_eq!(b.min(a), a);
    }

    #[derive(Serialize, Deserialize)]
    struct Wrap {
        value: Money,
    }

    #[test]
    fn test_serde_round_trips_canonical_string() {
        let w = Wrap {
            value: Money::new(dec!(42.50)),
        };
        let s = toml::to_string(&w).unwrap();
        assert_eq!(s.trim(), "value = \"42.50\"");

        let back: Wrap = toml::from_str(&s).unwrap();
        assert_eq!(back.value, w.value);
    }
}
