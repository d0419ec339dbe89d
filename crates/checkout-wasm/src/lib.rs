//! # checkout-wasm
//!
//! WebAssembly bindings for upgrade-checkout-rs.
//!
//! This crate provides WASM-compatible helpers for the upgrade page:
//! - Price formatting in any settlement currency
//! - Monthly-equivalent and yearly-savings math for the plan cards
//! - Plan slug and billing cycle validation before entering checkout
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { format_amount, yearly_savings } from 'upgrade-checkout-wasm';
//!
//! await init();
//!
//! const label = format_amount(7200000n, 'IDR');
//! const savings = yearly_savings(50n, 480n);
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use checkout_core::Money;
use wasm_bindgen::prelude::*;

/// Initialize the WASM module (called automatically)
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Format an amount in a currency's smallest unit for display
#[wasm_bindgen]
pub fn format_amount(amount: i64, currency: &str) -> String {
    Money::new(amount, currency).display()
}

/// Effective monthly price when paying yearly
#[wasm_bindgen]
pub fn monthly_equivalent(price_yearly: i64) -> i64 {
    price_yearly / 12
}

/// Amount saved per year by paying yearly instead of monthly
#[wasm_bindgen]
pub fn yearly_savings(price_monthly: i64, price_yearly: i64) -> i64 {
    price_monthly * 12 - price_yearly
}

/// Validate a plan slug before putting it in the checkout query string
#[wasm_bindgen]
pub fn validate_plan_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 100
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Normalize a billing cycle string; unknown values fall back to monthly
#[wasm_bindgen]
pub fn normalize_cycle(cycle: &str) -> String {
    match cycle.trim().to_lowercase().as_str() {
        "yearly" => "yearly".to_string(),
        _ => "monthly".to_string(),
    }
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(2999, "usd"), "USD 29.99");
        assert_eq!(format_amount(7_200_000, "IDR"), "IDR 7200000");
    }

    #[test]
    fn test_plan_math() {
        assert_eq!(monthly_equivalent(480), 40);
        assert_eq!(yearly_savings(50, 480), 120);
    }

    #[test]
    fn test_validate_plan_slug() {
        assert!(validate_plan_slug("pro"));
        assert!(validate_plan_slug("team_2024"));
        assert!(!validate_plan_slug(""));
        assert!(!validate_plan_slug("invalid slug"));
    }

    #[test]
    fn test_normalize_cycle() {
        assert_eq!(normalize_cycle("Yearly"), "yearly");
        assert_eq!(normalize_cycle("monthly"), "monthly");
        assert_eq!(normalize_cycle("weekly"), "monthly");
    }
}
