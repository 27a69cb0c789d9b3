//! Rupee prices using decimal arithmetic.
//!
//! The catalog API sends prices as JSON numbers in rupees. They are held as
//! [`Decimal`] so comparisons, sorting and cache keys never suffer from float
//! drift.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in Indian rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// The rupee sign used when formatting.
    pub const SYMBOL: &'static str = "₹";

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of rupees.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The amount with trailing fractional zeros removed.
    ///
    /// `1000.00` and `1000` normalize to the same value, which keeps query
    /// strings and cache keys stable.
    #[must_use]
    pub fn normalized(&self) -> Decimal {
        self.0.normalize()
    }

    /// Format with the rupee sign and Indian digit grouping.
    ///
    /// Paise are shown only when the amount has a fractional part.
    ///
    /// ```
    /// use srisri_core::Price;
    ///
    /// assert_eq!(Price::from_rupees(123_456).format_inr(), "₹1,23,456");
    /// assert_eq!(Price::from_rupees(999).format_inr(), "₹999");
    /// assert_eq!("2499.5".parse::<Price>().unwrap().format_inr(), "₹2,499.50");
    /// ```
    #[must_use]
    pub fn format_inr(&self) -> String {
        let fixed = format!("{:.2}", self.0.abs());
        let (whole, paise) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut out = String::new();
        if self.is_negative() {
            out.push('-');
        }
        out.push_str(Self::SYMBOL);
        out.push_str(&group_indian(whole));
        if paise != "00" {
            out.push('.');
            out.push_str(paise);
        }
        out
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

/// Group an ASCII digit string as lakh/crore: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}
