//! Fixed-point price with two decimal places.
//!
//! Stored as integer cents. Serialized as a string (`"5.50"`) and accepted
//! either as a string or a JSON number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest absolute value accepted: five digits with two after the point.
pub const MAX_PRICE_CENTS: i64 = 99_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct Price(i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    Invalid,
    TooManyDecimals,
    TooManyDigits,
}

impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceError::Invalid => write!(f, "A valid number is required."),
            PriceError::TooManyDecimals => {
                write!(f, "Ensure that there are no more than 2 decimal places.")
            }
            PriceError::TooManyDigits => {
                write!(f, "Ensure that there are no more than 5 digits in total.")
            }
        }
    }
}

impl std::error::Error for PriceError {}

impl Price {
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        if cents.abs() > MAX_PRICE_CENTS {
            return Err(PriceError::TooManyDigits);
        }
        Ok(Price(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(PriceError::Invalid);
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PriceError::Invalid);
        }

        // Trailing zeros past the second place carry no value
        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > 2 {
            return Err(PriceError::TooManyDecimals);
        }

        let whole = whole.trim_start_matches('0');
        if whole.len() > 3 {
            return Err(PriceError::TooManyDigits);
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| PriceError::Invalid)?
        };
        let fraction_value: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| PriceError::Invalid)? * 10,
            _ => fraction.parse().map_err(|_| PriceError::Invalid)?,
        };

        let cents = whole_value * 100 + fraction_value;
        Price::from_cents(if negative { -cents } else { cents })
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        let raw = Raw::deserialize(deserializer)?;
        let text = match raw {
            Raw::Text(text) => text,
            Raw::Number(number) => number.to_string(),
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}
