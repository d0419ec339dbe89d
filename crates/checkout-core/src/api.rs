//! # Billing Backend Contract
//!
//! The async trait every billing backend implementation satisfies.
//! `checkout-http` provides the production `reqwest` client; tests
//! use scripted doubles. The checkout flow only ever sees this trait.

use crate::discount::DiscountDecision;
use crate::error::CheckoutResult;
use crate::gateway::Gateway;
use crate::money::CurrencyCode;
use crate::plan::Plan;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a currency conversion call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Conversion {
    pub converted_amount: i64,
    pub exchange_rate: f64,
}

/// The one payment-session request built per submission attempt
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    /// Charge amount in the charge currency's smallest unit
    pub amount: i64,
    /// Charge currency (reference, or the gateway's settlement currency)
    pub currency: CurrencyCode,
    /// Human-readable description, including the promo code if any
    pub description: String,
    /// The selected gateway, as a preference; the backend may route to
    /// another configured instance of the same provider
    pub preferred_gateway: String,
    /// Redirect target after payment, round-tripping plan and cycle
    pub success_url: String,
    /// Redirect target on cancel
    pub cancel_url: String,
    /// Fresh per attempt; prevents duplicate session creation
    pub idempotency_key: String,
    /// Reconciliation data: reference-currency amount, discount code/amount
    pub metadata: HashMap<String, String>,
}

/// Payment session status reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSessionStatus {
    /// Session created, awaiting payment at the provider
    Pending,
    /// Provider completed the payment synchronously
    Completed,
    /// Provider declined, cancelled, or expired the session
    Failed,
}

/// A payment session created by the billing backend
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSession {
    pub status: PaymentSessionStatus,

    /// Provider-hosted payment page, when the flow continues externally
    #[serde(default)]
    pub checkout_url: Option<String>,

    /// Payment identifier, when the provider assigned one
    #[serde(default)]
    pub payment_id: Option<String>,

    /// Provider failure message, when the session failed
    #[serde(default)]
    pub error_message: Option<String>,
}

/// The five operations the checkout flow consumes
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Fetch all purchasable plans
    async fn list_plans(&self) -> CheckoutResult<Vec<Plan>>;

    /// Fetch enabled payment gateways
    async fn list_enabled_gateways(&self) -> CheckoutResult<Vec<Gateway>>;

    /// Convert an amount between currencies using the backend's rate source
    async fn convert_currency(
        &self,
        amount: i64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> CheckoutResult<Conversion>;

    /// Validate a discount code against a plan and a reference-currency
    /// base amount. Rejections are a domain outcome, not an error.
    async fn validate_discount(
        &self,
        code: &str,
        plan_slug: &str,
        amount: i64,
    ) -> CheckoutResult<DiscountDecision>;

    /// Create a payment session for the final charge
    async fn create_payment(&self, request: &PaymentRequest) -> CheckoutResult<PaymentSession>;
}

/// Type alias for a shared billing backend (dynamic dispatch)
pub type SharedBillingApi = Arc<dyn BillingApi>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_session_deserialize_defaults() {
        let session: PaymentSession =
            serde_json::from_str(r#"{"status": "pending", "checkout_url": "https://pay.example/s1"}"#)
                .unwrap();
        assert_eq!(session.status, PaymentSessionStatus::Pending);
        assert_eq!(session.checkout_url.as_deref(), Some("https://pay.example/s1"));
        assert!(session.payment_id.is_none());
        assert!(session.error_message.is_none());
    }

    #[test]
    fn test_session_status_wire_names() {
        let status: PaymentSessionStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, PaymentSessionStatus::Completed);
        let status: PaymentSessionStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, PaymentSessionStatus::Failed);
    }
}
