use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Monetary amount stored as a whole number of cents.
///
/// Serialized as a decimal string (`"12.50"`); accepts either a string or a
/// JSON number on input. The `+`/`-` operators are for figures already
/// bounded by a stored total; anything built from user quantities goes
/// through the `checked_*` methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoneyInput", into = "String")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Multiplies by a fractional quantity (kilograms, cubic meters), rounding
    /// half away from zero to the cent. `None` when the product leaves the
    /// representable range.
    pub fn checked_times(self, quantity: f64) -> Option<Money> {
        let product = (self.0 as f64 * quantity).round();
        // i64::MAX as f64 rounds up to 2^63, which is already out of range
        if product.is_finite() && product.abs() < i64::MAX as f64 {
            Some(Money(product as i64))
        } else {
            None
        }
    }

    /// Integer percentage of the amount, rounded half away from zero.
    pub fn checked_percent(self, percent: u32) -> Option<Money> {
        let scaled = self.0.checked_mul(i64::from(percent))?;
        let quotient = scaled / 100;
        let remainder = scaled % 100;
        if remainder.abs() * 2 >= 100 {
            Some(Money(quotient + remainder.signum()))
        } else {
            Some(Money(quotient))
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyParseError {
    #[error("amount is empty")]
    Empty,
    #[error("'{0}' is not a decimal amount")]
    Malformed(String),
    #[error("'{0}' has more than two decimal places")]
    TooPrecise(String),
    #[error("amount is out of range")]
    OutOfRange,
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MoneyParseError::Empty);
        }

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (units, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        let well_formed = !units.is_empty()
            && units.chars().all(|c| c.is_ascii_digit())
            && fraction.chars().all(|c| c.is_ascii_digit())
            && !(digits.contains('.') && fraction.is_empty());
        if !well_formed {
            return Err(MoneyParseError::Malformed(trimmed.to_string()));
        }
        if fraction.len() > 2 {
            return Err(MoneyParseError::TooPrecise(trimmed.to_string()));
        }

        let units: i64 = units.parse().map_err(|_| MoneyParseError::OutOfRange)?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| MoneyParseError::OutOfRange)? * 10,
            _ => fraction.parse().map_err(|_| MoneyParseError::OutOfRange)?,
        };
        let total = units
            .checked_mul(100)
            .and_then(|value| value.checked_add(cents))
            .ok_or(MoneyParseError::OutOfRange)?;

        Ok(Money(if negative { -total } else { total }))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyInput {
    Text(String),
    Number(f64),
}

impl TryFrom<MoneyInput> for Money {
    type Error = MoneyParseError;

    fn try_from(value: MoneyInput) -> Result<Self, Self::Error> {
        match value {
            MoneyInput::Text(raw) => raw.parse(),
            MoneyInput::Number(number) => {
                let cents = (number * 100.0).round();
                if !cents.is_finite() || cents.abs() >= i64::MAX as f64 {
                    return Err(MoneyParseError::OutOfRange);
                }
                Ok(Money(cents as i64))
            }
        }
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
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

    #[test]
    fn parses_decimal_strings() {
        assert_eq!("12".parse::<Money>(), Ok(Money::from_cents(1200)));
        assert_eq!("12.5".parse::<Money>(), Ok(Money::from_cents(1250)));
        assert_eq!(" 0.07 ".parse::<Money>(), Ok(Money::from_cents(7)));
        assert_eq!("-3.10".parse::<Money>(), Ok(Money::from_cents(-310)));
        assert!(matches!(
            "1.234".parse::<Money>(),
            Err(MoneyParseError::TooPrecise(_))
        ));
        assert!(matches!(
            "12.".parse::<Money>(),
            Err(MoneyParseError::Malformed(_))
        ));
        assert!(matches!(
            "abc".parse::<Money>(),
            Err(MoneyParseError::Malformed(_))
        ));
        assert_eq!("".parse::<Money>(), Err(MoneyParseError::Empty));
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::from_cents(1250).to_string(), "12.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        // 19% of 10.50 = 1.995
        assert_eq!(Money::from_cents(1050).checked_percent(19), Some(Money::from_cents(200)));
        assert_eq!(Money::from_cents(1000).checked_percent(19), Some(Money::from_cents(190)));
        assert_eq!(Money::from_cents(-1050).checked_percent(19), Some(Money::from_cents(-200)));
        assert_eq!(Money::from_cents(i64::MAX / 10).checked_percent(19), None);
    }

    #[test]
    fn times_rounds_to_the_cent() {
        assert_eq!(Money::from_cents(150).checked_times(2.5), Some(Money::from_cents(375)));
        assert_eq!(Money::from_cents(333).checked_times(0.5), Some(Money::from_cents(167)));
    }

    #[test]
    fn arithmetic_past_the_cent_range_is_refused() {
        let huge = Money::from_cents(i64::MAX - 1);
        assert_eq!(Money::from_cents(100).checked_times(1e300), None);
        assert_eq!(Money::from_cents(100).checked_times(f64::INFINITY), None);
        assert_eq!(huge.checked_add(Money::from_cents(5)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(huge.checked_add(Money::from_cents(1)), Some(Money::from_cents(i64::MAX)));
    }

    #[test]
    fn serde_accepts_strings_and_numbers() {
        let from_text: Money = serde_json::from_str("\"4.20\"").expect("text amount");
        let from_number: Money = serde_json::from_str("4.2").expect("numeric amount");
        assert_eq!(from_text, from_number);
        assert_eq!(
            serde_json::to_string(&from_text).expect("serialize"),
            "\"4.20\""
        );
    }
}
