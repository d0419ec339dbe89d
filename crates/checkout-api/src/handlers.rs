//! # Request Handlers
//!
//! Axum request handlers for the upgrade-checkout API. A checkout
//! session is entered with plan/cycle query parameters, mutated
//! through per-session endpoints, and submitted once the state
//! machine allows it. Session access is serialized per session, so
//! duplicate apply/submit clicks queue instead of racing.

use crate::state::AppState;
use crate::view::{CheckoutView, LoadErrorView};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use checkout_core::{
    BillingCycle, CheckoutError, CheckoutFlow, DiscountDecision, Phase,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Entry parameters from the hosting page's query string
#[derive(Debug, Deserialize)]
pub struct EnterCheckoutParams {
    /// Plan slug (required)
    pub plan: String,
    /// Billing cycle, defaults to monthly
    #[serde(default)]
    pub cycle: Option<BillingCycle>,
}

#[derive(Debug, Deserialize)]
pub struct SelectGatewayRequest {
    pub gateway_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyDiscountRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct TermsRequest {
    pub accepted: bool,
}

/// Session creation response
#[derive(Debug, Serialize)]
pub struct EnterCheckoutResponse {
    pub session_id: String,
    pub checkout: CheckoutView,
}

/// Discount application outcome plus the refreshed session view
#[derive(Debug, Serialize)]
pub struct ApplyDiscountResponse {
    pub applied: bool,
    /// Inline rejection reason when the code was not applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checkout: CheckoutView,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

type SessionHandle = Arc<tokio::sync::Mutex<CheckoutFlow>>;

fn lookup_session(
    state: &AppState,
    session_id: &str,
) -> Result<SessionHandle, (StatusCode, Json<ErrorResponse>)> {
    Uuid::parse_str(session_id)
        .ok()
        .and_then(|id| state.sessions.get(&id))
        .ok_or_else(|| {
            checkout_error_to_response(CheckoutError::SessionNotFound {
                session_id: session_id.to_string(),
            })
        })
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "upgrade-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List purchasable plans for the upgrade page
#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let plans = state
        .api
        .list_plans()
        .await
        .map_err(checkout_error_to_response)?;

    Ok(Json(serde_json::json!({
        "plans": plans,
        "count": plans.len()
    })))
}

/// Enter checkout for a plan and cycle.
///
/// Load failures are fatal for the session: no retry affordance, the
/// page gets a dead-end view with a back-to-billing escape.
#[instrument(skip(state), fields(plan = %params.plan))]
pub async fn enter_checkout(
    State(state): State<AppState>,
    Query(params): Query<EnterCheckoutParams>,
) -> Result<Json<EnterCheckoutResponse>, (StatusCode, Json<LoadErrorView>)> {
    let cycle = params.cycle.unwrap_or_default();

    let flow = CheckoutFlow::enter(
        state.api.clone(),
        &params.plan,
        cycle,
        state.config.reference_currency.clone(),
        state.return_urls(),
    )
    .await
    .map_err(|e| {
        error!("Cannot load checkout: {}", e);
        let status =
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let back_url = format!("{}/billing", state.config.base_url);
        (status, Json(LoadErrorView::new(e.to_string(), back_url)))
    })?;

    let checkout = CheckoutView::from_flow(&flow);
    let session_id = state.sessions.insert(flow);

    info!("Checkout session created: {} for plan {}", session_id, params.plan);

    Ok(Json(EnterCheckoutResponse {
        session_id: session_id.to_string(),
        checkout,
    }))
}

/// Current session snapshot
pub async fn get_checkout(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CheckoutView>, (StatusCode, Json<ErrorResponse>)> {
    let session = lookup_session(&state, &session_id)?;
    let flow = session.lock().await;
    Ok(Json(CheckoutView::from_flow(&flow)))
}

/// Change the selected payment gateway, converting the plan price
/// into its settlement currency when needed
#[instrument(skip(state), fields(session_id = %session_id, gateway = %request.gateway_id))]
pub async fn select_gateway(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectGatewayRequest>,
) -> Result<Json<CheckoutView>, (StatusCode, Json<ErrorResponse>)> {
    let session = lookup_session(&state, &session_id)?;
    let mut flow = session.lock().await;

    flow.select_gateway(&request.gateway_id)
        .await
        .map_err(checkout_error_to_response)?;

    Ok(Json(CheckoutView::from_flow(&flow)))
}

/// Apply a discount code. A rejection is an inline outcome, not an
/// error: state stays unchanged and the reason is returned for display.
#[instrument(skip(state, request), fields(session_id = %session_id))]
pub async fn apply_discount(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ApplyDiscountRequest>,
) -> Result<Json<ApplyDiscountResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session = lookup_session(&state, &session_id)?;
    let mut flow = session.lock().await;

    let decision = flow
        .apply_discount(&request.code)
        .await
        .map_err(checkout_error_to_response)?;

    let (applied, message) = match decision {
        DiscountDecision::Accepted(_) => (true, None),
        DiscountDecision::Rejected { reason } => (false, Some(reason)),
    };

    Ok(Json(ApplyDiscountResponse {
        applied,
        message,
        checkout: CheckoutView::from_flow(&flow),
    }))
}

/// Remove the applied discount, restoring the undiscounted price
pub async fn remove_discount(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CheckoutView>, (StatusCode, Json<ErrorResponse>)> {
    let session = lookup_session(&state, &session_id)?;
    let mut flow = session.lock().await;

    flow.remove_discount().map_err(checkout_error_to_response)?;

    Ok(Json(CheckoutView::from_flow(&flow)))
}

/// Toggle terms acceptance
pub async fn set_terms(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<TermsRequest>,
) -> Result<Json<CheckoutView>, (StatusCode, Json<ErrorResponse>)> {
    let session = lookup_session(&state, &session_id)?;
    let mut flow = session.lock().await;

    flow.set_terms_accepted(request.accepted)
        .map_err(checkout_error_to_response)?;

    Ok(Json(CheckoutView::from_flow(&flow)))
}

/// Submit the checkout and route on the resulting phase.
///
/// The per-session lock makes submission single-shot: a second click
/// waits for the first attempt, then hits the phase guard.
#[instrument(skip(state), fields(session_id = %session_id))]
pub async fn submit_checkout(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CheckoutView>, (StatusCode, Json<ErrorResponse>)> {
    let session = lookup_session(&state, &session_id)?;
    let mut flow = session.lock().await;

    let phase = flow.submit().await.map_err(checkout_error_to_response)?;
    let view = CheckoutView::from_flow(&flow);
    drop(flow);

    // The provider's flow (or our success view) takes over from here
    if matches!(phase, Phase::Redirecting { .. } | Phase::SucceededInline { .. }) {
        if let Ok(id) = Uuid::parse_str(&session_id) {
            state.sessions.remove(&id);
        }
        info!("Checkout session completed: {}", session_id);
    }

    Ok(Json(view))
}

/// Checkout success page
pub async fn checkout_success(
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> impl IntoResponse {
    let plan = params.get("plan").map(|s| s.as_str()).unwrap_or("unknown");
    let cycle = params.get("cycle").map(|s| s.as_str()).unwrap_or("monthly");
    let payment_id = params
        .get("payment_id")
        .map(|s| s.as_str())
        .unwrap_or("unknown");
    axum::response::Html(format!(
        r#"
<!DOCTYPE html>
<html>
<head><title>Upgrade Complete</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%);">
    <div style="background: white; padding: 60px; border-radius: 16px; text-align: center;">
        <div style="font-size: 60px;">&#9989;</div>
        <h1>Upgrade Complete!</h1>
        <p>Plan: <code>{}</code> ({} billing)</p>
        <p>Payment: <code>{}</code></p>
        <p style="color: #666;">Your subscription has been upgraded.</p>
    </div>
</body>
</html>
"#,
        plan, cycle, payment_id
    ))
}

/// Checkout cancel page
pub async fn checkout_cancel(
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> impl IntoResponse {
    let plan = params.get("plan").map(|s| s.as_str()).unwrap_or("unknown");
    axum::response::Html(format!(
        r#"
<!DOCTYPE html>
<html>
<head><title>Checkout Cancelled</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%);">
    <div style="background: white; padding: 60px; border-radius: 16px; text-align: center;">
        <div style="font-size: 60px;">&#10060;</div>
        <h1>Checkout Cancelled</h1>
        <p style="color: #666;">No charges were made for the <code>{}</code> plan.</p>
        <p><a href="/plans">Back to plan selection</a></p>
    </div>
</body>
</html>
"#,
        plan
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use crate::state::AppConfig;
    use async_trait::async_trait;
    use axum_test::TestServer;
    use checkout_core::{
        AppliedDiscount, BillingApi, CheckoutResult, Conversion, CurrencyCode, DiscountType,
        Gateway, PaymentRequest, PaymentSession, PaymentSessionStatus, Plan, PlanFeature,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedApi {
        plans: Vec<Plan>,
        gateways: Vec<Gateway>,
        rate: f64,
        discount: Option<DiscountDecision>,
        session: PaymentSession,
        payment_calls: AtomicUsize,
    }

    impl Default for ScriptedApi {
        fn default() -> Self {
            Self {
                plans: vec![Plan {
                    slug: "pro".to_string(),
                    name: "Pro".to_string(),
                    price_monthly: 50,
                    price_yearly: 480,
                    features: vec![PlanFeature {
                        name: "Unlimited projects".to_string(),
                        included: true,
                    }],
                }],
                gateways: vec![
                    Gateway {
                        id: "paypal".to_string(),
                        name: "PayPal".to_string(),
                        is_default: true,
                        is_enabled: true,
                        supported_currencies: vec![CurrencyCode::new("USD")],
                        payment_methods: vec!["card".to_string()],
                    },
                    Gateway {
                        id: "midtrans".to_string(),
                        name: "Midtrans".to_string(),
                        is_default: false,
                        is_enabled: true,
                        supported_currencies: vec![CurrencyCode::new("IDR")],
                        payment_methods: vec!["bank_transfer".to_string()],
                    },
                ],
                rate: 15000.0,
                discount: None,
                session: PaymentSession {
                    status: PaymentSessionStatus::Pending,
                    checkout_url: Some("https://pay.example/s1".to_string()),
                    payment_id: Some("pay_1".to_string()),
                    error_message: None,
                },
                payment_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BillingApi for ScriptedApi {
        async fn list_plans(&self) -> CheckoutResult<Vec<Plan>> {
            Ok(self.plans.clone())
        }

        async fn list_enabled_gateways(&self) -> CheckoutResult<Vec<Gateway>> {
            Ok(self.gateways.clone())
        }

        async fn convert_currency(
            &self,
            amount: i64,
            _from: &CurrencyCode,
            _to: &CurrencyCode,
        ) -> CheckoutResult<Conversion> {
            Ok(Conversion {
                converted_amount: (amount as f64 * self.rate).round() as i64,
                exchange_rate: self.rate,
            })
        }

        async fn validate_discount(
            &self,
            _code: &str,
            _plan_slug: &str,
            _amount: i64,
        ) -> CheckoutResult<DiscountDecision> {
            Ok(self.discount.clone().unwrap_or(DiscountDecision::Rejected {
                reason: "Unknown code".to_string(),
            }))
        }

        async fn create_payment(
            &self,
            _request: &PaymentRequest,
        ) -> CheckoutResult<PaymentSession> {
            self.payment_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.session.clone())
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_url: "https://app.example.com".to_string(),
            environment: "test".to_string(),
            reference_currency: CurrencyCode::new("USD"),
            session_ttl_minutes: 30,
        }
    }

    fn server_with(api: Arc<ScriptedApi>) -> TestServer {
        let state = AppState::with_api(api, test_config());
        TestServer::new(create_router(state)).expect("test server")
    }

    async fn enter(server: &TestServer, plan: &str, cycle: &str) -> Value {
        let response = server
            .post("/api/v1/checkout")
            .add_query_param("plan", plan)
            .add_query_param("cycle", cycle)
            .await;
        response.assert_status_ok();
        response.json::<Value>()
    }

    #[tokio::test]
    async fn test_health() {
        let server = server_with(Arc::new(ScriptedApi::default()));
        let response = server.get("/health").await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["service"], "upgrade-checkout");
    }

    #[tokio::test]
    async fn test_enter_unknown_plan_is_load_error() {
        let server = server_with(Arc::new(ScriptedApi::default()));
        let response = server
            .post("/api/v1/checkout")
            .add_query_param("plan", "enterprise")
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body = response.json::<Value>();
        assert_eq!(body["phase"], "load_error");
        assert_eq!(body["back_url"], "https://app.example.com/billing");
    }

    #[tokio::test]
    async fn test_enter_defaults_and_view_shape() {
        let server = server_with(Arc::new(ScriptedApi::default()));
        let body = enter(&server, "pro", "yearly").await;

        let checkout = &body["checkout"];
        assert_eq!(checkout["phase"], "ready");
        assert_eq!(checkout["selected_gateway"], "paypal");
        assert_eq!(checkout["base_amount"], 480);
        assert_eq!(checkout["conversion"]["status"], "not_required");
        assert_eq!(checkout["plan"]["monthly_equivalent"], 40);
        assert_eq!(checkout["plan"]["yearly_savings"], 120);
        assert_eq!(checkout["can_submit"], false);
    }

    #[tokio::test]
    async fn test_gateway_change_converts_price() {
        let server = server_with(Arc::new(ScriptedApi::default()));
        let body = enter(&server, "pro", "yearly").await;
        let session_id = body["session_id"].as_str().unwrap();

        let response = server
            .post(&format!("/api/v1/checkout/{}/gateway", session_id))
            .json(&json!({"gateway_id": "midtrans"}))
            .await;
        response.assert_status_ok();
        let checkout = response.json::<Value>();
        assert_eq!(checkout["conversion"]["status"], "ready");
        assert_eq!(checkout["conversion"]["amount"], 7_200_000);
        assert_eq!(checkout["conversion"]["currency"], "IDR");
        assert_eq!(checkout["charge"]["amount"], 7_200_000);
    }

    #[tokio::test]
    async fn test_full_flow_submits_and_redirects() {
        let api = Arc::new(ScriptedApi::default());
        let server = server_with(api.clone());
        let body = enter(&server, "pro", "monthly").await;
        let session_id = body["session_id"].as_str().unwrap();

        let response = server
            .post(&format!("/api/v1/checkout/{}/terms", session_id))
            .json(&json!({"accepted": true}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["can_submit"], true);

        let response = server
            .post(&format!("/api/v1/checkout/{}/submit", session_id))
            .await;
        response.assert_status_ok();
        let checkout = response.json::<Value>();
        assert_eq!(checkout["phase"], "redirecting");
        assert_eq!(checkout["checkout_url"], "https://pay.example/s1");
        assert_eq!(api.payment_calls.load(Ordering::SeqCst), 1);

        // Session is destroyed once the provider's flow takes over
        let response = server
            .get(&format!("/api/v1/checkout/{}", session_id))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_without_terms_blocked() {
        let api = Arc::new(ScriptedApi::default());
        let server = server_with(api.clone());
        let body = enter(&server, "pro", "monthly").await;
        let session_id = body["session_id"].as_str().unwrap();

        let response = server
            .post(&format!("/api/v1/checkout/{}/submit", session_id))
            .await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);
        assert_eq!(api.payment_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_discount_apply_and_remove() {
        let mut scripted = ScriptedApi::default();
        scripted.discount = Some(DiscountDecision::Accepted(AppliedDiscount {
            code: "SAVE10".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            amount: 48,
            final_amount: 432,
        }));
        let server = server_with(Arc::new(scripted));
        let body = enter(&server, "pro", "yearly").await;
        let session_id = body["session_id"].as_str().unwrap();

        let response = server
            .post(&format!("/api/v1/checkout/{}/discount", session_id))
            .json(&json!({"code": "save10"}))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["applied"], true);
        assert_eq!(body["checkout"]["discount"]["final_amount"], 432);
        assert_eq!(body["checkout"]["charge"]["amount"], 432);

        let response = server
            .delete(&format!("/api/v1/checkout/{}/discount", session_id))
            .await;
        response.assert_status_ok();
        let checkout = response.json::<Value>();
        assert!(checkout["discount"].is_null());
        assert_eq!(checkout["charge"]["amount"], 480);
    }

    #[tokio::test]
    async fn test_discount_rejection_is_inline() {
        let server = server_with(Arc::new(ScriptedApi::default()));
        let body = enter(&server, "pro", "yearly").await;
        let session_id = body["session_id"].as_str().unwrap();

        let response = server
            .post(&format!("/api/v1/checkout/{}/discount", session_id))
            .json(&json!({"code": "BOGUS"}))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["applied"], false);
        assert_eq!(body["message"], "Unknown code");
        assert!(body["checkout"]["discount"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let server = server_with(Arc::new(ScriptedApi::default()));
        let response = server
            .get(&format!("/api/v1/checkout/{}", Uuid::new_v4()))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400).with_details("field: plan");
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
        assert_eq!(err.details.as_deref(), Some("field: plan"));
    }

    #[test]
    fn test_checkout_error_conversion() {
        let err = CheckoutError::InvalidRequest("Bad data".to_string());
        let (status, _json) = checkout_error_to_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
