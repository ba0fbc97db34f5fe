//! Integer money in the smallest currency unit (Rupiah has no minor unit).

use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub};

use serde::{Deserialize, Serialize};

/// An amount of money in the smallest currency unit.
///
/// Signed: a negative amount is meaningful (e.g. change owed when the customer
/// underpaid). Arithmetic saturates at the `i64` bounds, so a typed amount far
/// out of range can never wrap into the opposite sign.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    pub const fn amount(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Unit price × quantity.
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Mean of `total` over `count` items, rounded half away from zero.
    ///
    /// Returns zero when `count` is zero.
    pub fn average(total: Money, count: usize) -> Money {
        if count == 0 {
            return Money::ZERO;
        }
        let count = count as i64;
        let half = count / 2;
        let rounded = if total.0 >= 0 {
            total.0.saturating_add(half) / count
        } else {
            total.0.saturating_sub(half) / count
        };
        Money(rounded)
    }

    /// Parse a cashier-typed amount the way a numeric text field does.
    ///
    /// Leading whitespace and an optional sign are accepted, then the longest
    /// run of ASCII digits; anything after is ignored. Empty or non-numeric
    /// input yields zero. A digit run too long for `i64` saturates to the
    /// bound on its side.
    pub fn parse_input(input: &str) -> Money {
        let s = input.trim_start();
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return Money::ZERO;
        }
        let digits = &rest[..digits_len];
        let parsed = if negative {
            format!("-{digits}").parse::<i64>()
        } else {
            digits.parse::<i64>()
        };
        match parsed {
            Ok(value) => Money(value),
            Err(_) if negative => Money(i64::MIN),
            Err(_) => Money(i64::MAX),
        }
    }

    /// Format as Indonesian Rupiah with no fraction digits, e.g. `Rp 15.000`.
    pub fn to_rupiah(self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            format!("-Rp {grouped}")
        } else {
            format!("Rp {grouped}")
        }
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_rupiah())
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_rupiah_with_dot_grouping() {
        assert_eq!(Money::new(0).to_rupiah(), "Rp 0");
        assert_eq!(Money::new(500).to_rupiah(), "Rp 500");
        assert_eq!(Money::new(15_000).to_rupiah(), "Rp 15.000");
        assert_eq!(Money::new(1_234_567).to_rupiah(), "Rp 1.234.567");
        assert_eq!(Money::new(-5_000).to_rupiah(), "-Rp 5.000");
    }

    #[test]
    fn parse_input_behaves_like_a_numeric_field() {
        assert_eq!(Money::parse_input("20000"), Money::new(20_000));
        assert_eq!(Money::parse_input("  20000"), Money::new(20_000));
        assert_eq!(Money::parse_input("12abc"), Money::new(12));
        assert_eq!(Money::parse_input("12.5"), Money::new(12));
        assert_eq!(Money::parse_input("-300"), Money::new(-300));
        assert_eq!(Money::parse_input(""), Money::ZERO);
        assert_eq!(Money::parse_input("abc"), Money::ZERO);
        assert_eq!(Money::parse_input("-"), Money::ZERO);
    }

    #[test]
    fn average_rounds_half_away_from_zero() {
        assert_eq!(Money::average(Money::new(10), 4), Money::new(3));
        assert_eq!(Money::average(Money::new(9), 4), Money::new(2));
        assert_eq!(Money::average(Money::new(45_000), 3), Money::new(15_000));
        assert_eq!(Money::average(Money::new(100), 0), Money::ZERO);
    }

    #[test]
    fn arithmetic_and_sum() {
        let total: Money = [Money::new(12_000), Money::new(15_000)].iter().sum();
        assert_eq!(total, Money::new(27_000));
        assert_eq!(Money::new(12_000).times(3), Money::new(36_000));
        assert_eq!(Money::new(10_000) - Money::new(15_000), Money::new(-5_000));
    }

    #[test]
    fn out_of_range_input_saturates() {
        assert_eq!(Money::parse_input("99999999999999999999"), Money::new(i64::MAX));
        assert_eq!(Money::parse_input("-99999999999999999999"), Money::new(i64::MIN));
        assert_eq!(Money::parse_input("-9223372036854775808"), Money::new(i64::MIN));

        let paid = Money::parse_input("-9223372036854775807");
        let change = paid - Money::new(15_000);
        assert_eq!(change, Money::new(i64::MIN));
        assert!(change.is_negative());
        assert_eq!((-change).amount(), i64::MAX);
        assert_eq!(change.abs().amount(), i64::MAX);
    }

    #[test]
    fn sums_saturate_instead_of_wrapping() {
        let huge = Money::new(i64::MAX);
        assert_eq!(huge + Money::new(1), huge);
        let total: Money = [huge, Money::new(10_000), huge].iter().sum();
        assert_eq!(total, huge);

        let mut running = Money::new(i64::MIN);
        running += Money::new(-1);
        assert_eq!(running, Money::new(i64::MIN));
        assert_eq!(Money::average(Money::new(i64::MAX), 2), Money::new(i64::MAX / 2));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: stripping the formatting yields the original amount.
        #[test]
        fn rupiah_format_preserves_digits(amount in -1_000_000_000i64..1_000_000_000i64) {
            let formatted = Money::new(amount).to_rupiah();
            let digits: String = formatted.chars().filter(char::is_ascii_digit).collect();
            prop_assert_eq!(digits.parse::<i64>().unwrap(), amount.abs());
            prop_assert_eq!(formatted.starts_with('-'), amount < 0);
        }

        /// Property: subtraction keeps the sign of the exact result.
        #[test]
        fn difference_never_flips_sign(a in any::<i64>(), b in any::<i64>()) {
            let exact = i128::from(a) - i128::from(b);
            let got = i128::from((Money::new(a) - Money::new(b)).amount());
            prop_assert_eq!(got.signum(), exact.signum());
            prop_assert!(exact.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) == got);
        }
    }
}
