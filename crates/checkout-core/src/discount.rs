//! # Discount Codes
//!
//! Promotional discount types and the contract math shared with the
//! billing backend's validator. Validation always runs against the
//! plan's reference-currency base amount, never a converted amount,
//! so percentage rounding happens exactly once.

use serde::{Deserialize, Serialize};

/// How a discount value reduces the base amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a percentage 0..=100
    Percentage,
    /// `discount_value` is a fixed reference-currency amount
    Fixed,
}

/// Canonical form for a user-entered code: trimmed, upper-case
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// The amount a discount removes from `base_amount`
pub fn discount_amount(discount_type: DiscountType, value: i64, base_amount: i64) -> i64 {
    match discount_type {
        DiscountType::Percentage => (base_amount as f64 * value as f64 / 100.0).round() as i64,
        DiscountType::Fixed => value.min(base_amount),
    }
}

/// The amount left to charge after a discount, floored at zero
pub fn final_amount(base_amount: i64, discount_amount: i64) -> i64 {
    (base_amount - discount_amount).max(0)
}

/// A discount accepted by the validator, pinned to the base amount it
/// was validated against. Re-validation against a different base may
/// yield a different `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    /// Canonicalized code
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage 0..=100 or fixed reference-currency amount
    pub discount_value: i64,
    /// Reference-currency amount removed from the base
    pub amount: i64,
    /// Reference-currency amount remaining after the discount
    pub final_amount: i64,
}

/// Outcome of a server-side discount validation
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountDecision {
    Accepted(AppliedDiscount),
    /// Human-readable reason: expired, wrong plan, usage limit, unknown code
    Rejected { reason: String },
}

impl DiscountDecision {
    pub fn accepted(&self) -> Option<&AppliedDiscount> {
        match self {
            DiscountDecision::Accepted(applied) => Some(applied),
            DiscountDecision::Rejected { .. } => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted().is_some()
    }
}

/// Discount slot on the checkout aggregate. A tagged state rather
/// than an `Option` so a discount ratio can never be computed while
/// no discount is applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DiscountState {
    #[default]
    NoDiscount,
    Discounted(AppliedDiscount),
}

impl DiscountState {
    pub fn applied(&self) -> Option<&AppliedDiscount> {
        match self {
            DiscountState::NoDiscount => None,
            DiscountState::Discounted(applied) => Some(applied),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  launch10 "), "LAUNCH10");
        assert_eq!(normalize_code("SAVE20"), "SAVE20");
    }

    #[test]
    fn test_percentage_discount() {
        let amount = discount_amount(DiscountType::Percentage, 20, 100);
        assert_eq!(amount, 20);
        assert_eq!(final_amount(100, amount), 80);
    }

    #[test]
    fn test_percentage_rounding() {
        // 15% of 333 = 49.95, rounds to 50
        assert_eq!(discount_amount(DiscountType::Percentage, 15, 333), 50);
    }

    #[test]
    fn test_fixed_discount_clamped_to_base() {
        let amount = discount_amount(DiscountType::Fixed, 150, 100);
        assert_eq!(amount, 100);
        // Never negative
        assert_eq!(final_amount(100, amount), 0);
    }

    #[test]
    fn test_discount_state_ratio_guard() {
        let state = DiscountState::NoDiscount;
        assert!(state.applied().is_none());

        let applied = AppliedDiscount {
            code: "SAVE20".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 20,
            amount: 20,
            final_amount: 80,
        };
        let state = DiscountState::Discounted(applied);
        assert_eq!(state.applied().unwrap().final_amount, 80);
    }
}
