//! # Money Types
//!
//! Currency codes and fixed-point amounts for the checkout engine.
//! Plan prices arrive from the billing backend in the platform's
//! reference currency; gateway settlement may use any other code,
//! so currency codes are open-ended rather than a closed enum.

use serde::{Deserialize, Serialize};

/// ISO 4217 currency code, normalized to upper-case.
///
/// Codes are carried as strings because the set of settlement
/// currencies is owned by the billing backend, not this crate.
/// Deserialization must never fail on a code we have not seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number of decimal places for this currency
    /// (zero-decimal currencies have no minor unit)
    pub fn decimal_places(&self) -> u8 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" | "IDR" => 0,
            _ => 2,
        }
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An amount in a currency's smallest unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in smallest currency unit
    pub amount: i64,
    /// Currency
    pub currency: CurrencyCode,
}

impl Money {
    pub fn new(amount: i64, currency: impl Into<CurrencyCode>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    /// Format for display (e.g., "USD 29.99", "IDR 450000")
    pub fn display(&self) -> String {
        let places = self.currency.decimal_places();
        if places == 0 {
            format!("{} {}", self.currency, self.amount)
        } else {
            let divisor = 10_i64.pow(places as u32);
            format!(
                "{} {}.{:02}",
                self.currency,
                self.amount / divisor,
                (self.amount % divisor).abs()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_normalization() {
        assert_eq!(CurrencyCode::new("usd").as_str(), "USD");
        assert_eq!(CurrencyCode::new(" idr ").as_str(), "IDR");
        assert_eq!(CurrencyCode::new("EUR"), CurrencyCode::new("eur"));
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(CurrencyCode::new("USD").decimal_places(), 2);
        assert_eq!(CurrencyCode::new("JPY").decimal_places(), 0);
        assert_eq!(CurrencyCode::new("IDR").decimal_places(), 0);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(2999, "usd").display(), "USD 29.99");
        assert_eq!(Money::new(450000, "idr").display(), "IDR 450000");
        assert_eq!(Money::new(1205, "eur").display(), "EUR 12.05");
    }
}
