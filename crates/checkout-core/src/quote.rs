//! # Price Quotes
//!
//! Currency-conversion state and the final charge computation.
//!
//! Conversion and discounting are computed independently: the
//! converted amount is fetched once per gateway/cycle selection, and
//! a discount is applied to it as a ratio of the reference-currency
//! amounts. This keeps the displayed and charged amounts deterministic
//! and avoids a second rate fetch per discount change, at the cost of
//! a bounded rounding deviation from convert-then-discount. Callers
//! must not replace the ratio with a fresh conversion call.

use crate::money::CurrencyCode;
use serde::{Deserialize, Serialize};

/// A point-in-time conversion of the plan price into a gateway's
/// settlement currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedPrice {
    /// Converted amount in the settlement currency's smallest unit
    pub amount: i64,
    /// Settlement currency
    pub currency: CurrencyCode,
    /// Exchange rate used
    pub rate: f64,
}

/// Conversion slot on the checkout aggregate.
///
/// `Pending` carries the generation token of the request in flight;
/// a resolution with any other token is stale and must be dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PriceConversion {
    /// Selected gateway accepts the reference currency directly
    #[default]
    NotRequired,
    /// A conversion request is in flight
    Pending { token: u64 },
    /// Conversion resolved for the current selection
    Ready(ConvertedPrice),
    /// Rate source unavailable; submission is blocked until a
    /// gateway/cycle change clears this
    Failed { message: String },
}

impl PriceConversion {
    pub fn is_pending(&self) -> bool {
        matches!(self, PriceConversion::Pending { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PriceConversion::Failed { .. })
    }

    pub fn ready(&self) -> Option<&ConvertedPrice> {
        match self {
            PriceConversion::Ready(price) => Some(price),
            _ => None,
        }
    }
}

/// Discounted settlement-currency amount, derived from the discount
/// ratio rather than re-converted:
/// `round(converted * final_amount / base_amount)`.
pub fn discounted_converted_amount(
    converted_amount: i64,
    final_reference_amount: i64,
    base_reference_amount: i64,
) -> i64 {
    if base_reference_amount == 0 {
        return 0;
    }
    (converted_amount as f64 * final_reference_amount as f64 / base_reference_amount as f64)
        .round() as i64
}

/// The resolved (amount, currency) pair a payment session will charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeQuote {
    pub amount: i64,
    pub currency: CurrencyCode,
}
