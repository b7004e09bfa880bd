//! Fixed-point money in integer currency subunits.
//!
//! Prices and claimed payment amounts are compared as whole cents. Converting
//! a decimal amount multiplies by 100 and truncates toward zero; the
//! conversion is done on the decimal digits themselves, so `4.35` is exactly
//! 435 cents rather than whatever `4.35 * 100.0` rounds to in binary floating
//! point.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// An amount of money in cents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cents(i64);

impl ValueObject for Cents {}

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn new(cents: i64) -> Self {
        Self(cents)
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// Parse a decimal string (`"2.50"`, `"3"`, `".5"`, `"-1.999"`, `"1.5e2"`)
    /// into cents, truncating digits past the second fractional place.
    pub fn parse_decimal(s: &str) -> DomainResult<Self> {
        let not_decimal = || DomainError::validation(format!("'{s}' is not a decimal number"));
        let too_large = || DomainError::validation(format!("'{s}' is out of range"));

        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((m, e)) => (m, parse_exponent(e).ok_or_else(not_decimal)?),
            None => (unsigned, 0),
        };

        let (whole, fraction) = match mantissa.split_once('.') {
            Some((w, f)) => (w, f),
            None => (mantissa, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(not_decimal());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(not_decimal());
        }

        let digits: Vec<i64> = whole
            .bytes()
            .chain(fraction.bytes())
            .map(|b| i64::from(b - b'0'))
            .collect();
        let leading_zeros = digits.iter().take_while(|d| **d == 0).count();
        let significant = &digits[leading_zeros..];

        // Digits that land left of the cent cut once the point moves by `exponent`.
        let kept = whole.len() as i64 - leading_zeros as i64 + exponent + 2;

        let mut cents: i64 = 0;
        if !significant.is_empty() {
            for position in 0..kept.max(0) {
                let digit = significant.get(position as usize).copied().unwrap_or(0);
                cents = cents
                    .checked_mul(10)
                    .and_then(|c| c.checked_add(digit))
                    .ok_or_else(too_large)?;
            }
        }

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Convert a floating point amount (as found in JSON catalog documents)
    /// into cents using its shortest decimal representation.
    pub fn from_f64_truncated(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation(format!("{value} is not a finite amount")));
        }
        Self::parse_decimal(&format!("{value}"))
    }

    pub fn checked_mul(self, factor: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(factor)).map(Self)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

/// Exponent part of a decimal: optional sign, then at least one digit.
fn parse_exponent(raw: &str) -> Option<i64> {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i32>().ok().map(i64::from)
}

impl core::fmt::Display for Cents {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Cents::from_f64_truncated(value).map_err(serde::de::Error::custom)
    }
}
