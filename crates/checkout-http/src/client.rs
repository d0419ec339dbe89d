//! # Billing Backend Client
//!
//! `reqwest` implementation of the `BillingApi` contract against the
//! platform billing backend. This is the only place the checkout
//! engine talks HTTP to the backend; everything above it sees the
//! trait. There is no fixture fallback on failure anywhere in this
//! client: a backend error surfaces as a typed `CheckoutError`.

use crate::config::BillingConfig;
use async_trait::async_trait;
use checkout_core::{
    AppliedDiscount, BillingApi, CheckoutError, CheckoutResult, Conversion, CurrencyCode,
    DiscountDecision, DiscountType, Gateway, PaymentRequest, PaymentSession, Plan,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// HTTP client for the billing backend API
pub struct BillingClient {
    config: BillingConfig,
    client: Client,
}

impl BillingClient {
    /// Create a new billing client
    pub fn new(config: BillingConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        let config = BillingConfig::from_env()?;
        Ok(Self::new(config))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Common response handling: non-success statuses become
    /// `ProviderError`, unparseable bodies become `Serialization`.
    async fn read_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> CheckoutResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Billing API error: context={}, status={}, body={}", context, status, body);

            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(CheckoutError::ProviderError {
                    provider: "billing".to_string(),
                    message: error_response.error,
                });
            }

            return Err(CheckoutError::ProviderError {
                provider: "billing".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse {} response: {}", context, e))
        })
    }
}

#[async_trait]
impl BillingApi for BillingClient {
    #[instrument(skip(self))]
    async fn list_plans(&self) -> CheckoutResult<Vec<Plan>> {
        let response = self
            .client
            .get(self.url("/v1/plans"))
            .header("Authorization", self.config.auth_header())
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let plans: Vec<Plan> = Self::read_response(response, "plans").await?;
        debug!("Loaded {} plans", plans.len());
        Ok(plans)
    }

    #[instrument(skip(self))]
    async fn list_enabled_gateways(&self) -> CheckoutResult<Vec<Gateway>> {
        let response = self
            .client
            .get(self.url("/v1/gateways"))
            .query(&[("enabled_only", "true")])
            .header("Authorization", self.config.auth_header())
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let gateways: Vec<Gateway> = Self::read_response(response, "gateways").await?;
        debug!("Loaded {} enabled gateways", gateways.len());
        Ok(gateways)
    }

    #[instrument(skip(self), fields(from = %from, to = %to))]
    async fn convert_currency(
        &self,
        amount: i64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> CheckoutResult<Conversion> {
        let request = ConvertRequest {
            amount,
            from: from.to_string(),
            to: to.to_string(),
        };

        let response = self
            .client
            .post(self.url("/v1/currency/convert"))
            .header("Authorization", self.config.auth_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let conversion: Conversion = Self::read_response(response, "conversion").await?;
        debug!(
            "Converted {} {} -> {} {} at rate {}",
            amount, from, conversion.converted_amount, to, conversion.exchange_rate
        );
        Ok(conversion)
    }

    #[instrument(skip(self), fields(plan_slug = %plan_slug))]
    async fn validate_discount(
        &self,
        code: &str,
        plan_slug: &str,
        amount: i64,
    ) -> CheckoutResult<DiscountDecision> {
        let request = ValidateDiscountRequest {
            code: code.to_string(),
            plan_slug: plan_slug.to_string(),
            amount,
        };

        let response = self
            .client
            .post(self.url("/v1/discount/validate"))
            .header("Authorization", self.config.auth_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let validation: DiscountValidationResponse =
            Self::read_response(response, "discount validation").await?;
        Ok(validation.into_decision()?)
    }

    #[instrument(skip(self, request), fields(gateway = %request.preferred_gateway, currency = %request.currency))]
    async fn create_payment(&self, request: &PaymentRequest) -> CheckoutResult<PaymentSession> {
        let response = self
            .client
            .post(self.url("/v1/payment/create"))
            .header("Authorization", self.config.auth_header())
            .header("Idempotency-Key", &request.idempotency_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let session: PaymentSession = Self::read_response(response, "payment session").await?;
        info!(
            "Created payment session: status={:?}, payment_id={:?}",
            session.status, session.payment_id
        );
        Ok(session)
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ConvertRequest {
    amount: i64,
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct ValidateDiscountRequest {
    code: String,
    plan_slug: String,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct DiscountValidationResponse {
    is_valid: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    discount_type: Option<DiscountType>,
    #[serde(default)]
    discount_value: Option<i64>,
    #[serde(default)]
    discount_amount: Option<i64>,
    #[serde(default)]
    final_amount: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl DiscountValidationResponse {
    /// An accepted validation must carry the full discount shape; a
    /// partial one is a backend contract violation, not a rejection.
    fn into_decision(self) -> CheckoutResult<DiscountDecision> {
        if !self.is_valid {
            return Ok(DiscountDecision::Rejected {
                reason: self
                    .message
                    .unwrap_or_else(|| "This code cannot be applied".to_string()),
            });
        }

        match (
            self.code,
            self.discount_type,
            self.discount_value,
            self.discount_amount,
            self.final_amount,
        ) {
            (Some(code), Some(discount_type), Some(value), Some(amount), Some(final_amount)) => {
                Ok(DiscountDecision::Accepted(AppliedDiscount {
                    code,
                    discount_type,
                    discount_value: value,
                    amount,
                    final_amount,
                }))
            }
            _ => Err(CheckoutError::Serialization(
                "Valid discount response missing discount fields".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: String,
}
