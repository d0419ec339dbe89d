//! # Checkout Flow
//!
//! The checkout state machine and its async driver.
//!
//! `CheckoutState` is the session aggregate: pure, synchronous, and
//! mutated only through named transitions, so every invariant is
//! testable without I/O or timing. Conversions are issued as keyed
//! `ConversionRequest`s with a generation token; a resolution whose
//! token no longer matches the in-flight request is discarded, which
//! makes the supersede rule provable rather than timing-dependent.
//!
//! `CheckoutFlow` owns a `CheckoutState` plus a `BillingApi` handle
//! and performs the I/O between a request being issued and resolved.
//! Every backend failure is converted to a phase or an inline message
//! at this boundary; nothing escapes to the caller mid-transition.

use crate::api::{PaymentRequest, PaymentSession, PaymentSessionStatus, SharedBillingApi};
use crate::discount::{normalize_code, AppliedDiscount, DiscountDecision, DiscountState};
use crate::error::{CheckoutError, CheckoutResult};
use crate::gateway::{Gateway, GatewayRegistry};
use crate::money::CurrencyCode;
use crate::plan::{BillingCycle, Plan, PlanCatalog};
use crate::quote::{discounted_converted_amount, ChargeQuote, ConvertedPrice, PriceConversion};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Why a submission failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Provider declined, cancelled, or expired the session; retryable
    Provider,
    /// Provider returned no usable next step; not user-fixable
    Misconfiguration,
}

/// Checkout phase
///
/// `Loading` is the client's initial phase before the session exists;
/// `LoadError` is terminal with no retry affordance beyond navigating
/// back. `Ready` is re-entered after a `Failed` submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Loading,
    LoadError { message: String },
    Ready,
    Submitting,
    Redirecting { checkout_url: String },
    SucceededInline { payment_id: Option<String> },
    Failed { message: String, kind: FailureKind },
}

/// A keyed currency-conversion request issued by the state machine.
/// The token identifies the gateway selection that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub token: u64,
    pub amount: i64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

/// Redirect targets handed to the payment provider, round-tripping
/// the plan slug and billing cycle
#[derive(Debug, Clone)]
pub struct ReturnUrls {
    /// Base URL of the application (e.g., "https://app.enginevector.io")
    pub base_url: String,
    /// Success page path
    pub success_path: String,
    /// Cancel page path
    pub cancel_path: String,
}

impl ReturnUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            success_path: "/checkout/success".to_string(),
            cancel_path: "/checkout/cancel".to_string(),
        }
    }

    pub fn success_url(&self, plan_slug: &str, cycle: BillingCycle) -> String {
        format!(
            "{}{}?plan={}&cycle={}",
            self.base_url, self.success_path, plan_slug, cycle
        )
    }

    pub fn cancel_url(&self, plan_slug: &str, cycle: BillingCycle) -> String {
        format!(
            "{}{}?plan={}&cycle={}",
            self.base_url, self.cancel_path, plan_slug, cycle
        )
    }
}

impl Default for ReturnUrls {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

/// The session-scoped checkout aggregate.
///
/// Plan and cycle are immutable after entry; gateway, discount, and
/// terms acceptance mutate through the named transitions below. The
/// converted price is derived state, recomputed on every gateway
/// change and never on discount changes.
#[derive(Debug)]
pub struct CheckoutState {
    plan: Plan,
    cycle: BillingCycle,
    gateways: GatewayRegistry,
    selected_gateway: Option<String>,
    discount: DiscountState,
    conversion: PriceConversion,
    conversion_token: u64,
    terms_accepted: bool,
    phase: Phase,
    reference_currency: CurrencyCode,
    urls: ReturnUrls,
}

impl CheckoutState {
    /// Create the aggregate for a loaded plan and gateway list,
    /// auto-selecting the default gateway. Returns the conversion
    /// request to run when the default gateway needs one.
    pub fn new(
        plan: Plan,
        cycle: BillingCycle,
        gateways: GatewayRegistry,
        reference_currency: CurrencyCode,
        urls: ReturnUrls,
    ) -> (Self, Option<ConversionRequest>) {
        let selected_gateway = gateways.default_gateway().map(|g| g.id.clone());
        let mut state = Self {
            plan,
            cycle,
            gateways,
            selected_gateway,
            discount: DiscountState::NoDiscount,
            conversion: PriceConversion::NotRequired,
            conversion_token: 0,
            terms_accepted: false,
            phase: Phase::Ready,
            reference_currency,
            urls,
        };
        let request = state.issue_conversion();
        (state, request)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn cycle(&self) -> BillingCycle {
        self.cycle
    }

    pub fn reference_currency(&self) -> &CurrencyCode {
        &self.reference_currency
    }

    pub fn gateways(&self) -> &[Gateway] {
        &self.gateways.gateways
    }

    pub fn selected_gateway(&self) -> Option<&Gateway> {
        self.selected_gateway
            .as_deref()
            .and_then(|id| self.gateways.get(id))
    }

    pub fn conversion(&self) -> &PriceConversion {
        &self.conversion
    }

    pub fn discount(&self) -> &DiscountState {
        &self.discount
    }

    pub fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    /// The plan price for the session's cycle, reference currency
    pub fn base_amount(&self) -> i64 {
        self.plan.price_for(self.cycle)
    }

    /// Reference-currency amount after any discount
    pub fn final_reference_amount(&self) -> i64 {
        self.discount
            .applied()
            .map(|d| d.final_amount)
            .unwrap_or_else(|| self.base_amount())
    }

    fn is_interactive(&self) -> bool {
        matches!(self.phase, Phase::Ready | Phase::Failed { .. })
    }

    /// Guard for mutations: only `Ready` and `Failed` accept changes
    pub fn ensure_interactive(&self) -> CheckoutResult<()> {
        if self.is_interactive() {
            Ok(())
        } else {
            Err(CheckoutError::InvalidRequest(
                "Checkout is not accepting changes in its current phase".to_string(),
            ))
        }
    }

    /// Clears a failed-submission banner once the user changes input
    fn reenter_ready(&mut self) {
        if matches!(self.phase, Phase::Failed { .. }) {
            self.phase = Phase::Ready;
        }
    }

    /// Select a gateway. Returns the conversion request to run when
    /// the new gateway cannot settle in the reference currency.
    pub fn select_gateway(&mut self, gateway_id: &str) -> CheckoutResult<Option<ConversionRequest>> {
        self.ensure_interactive()?;
        if self.gateways.get(gateway_id).is_none() {
            return Err(CheckoutError::GatewayNotFound {
                gateway_id: gateway_id.to_string(),
            });
        }
        self.selected_gateway = Some(gateway_id.to_string());
        self.reenter_ready();
        Ok(self.issue_conversion())
    }

    /// Recompute the conversion slot for the current selection.
    /// Always advances the generation token so any in-flight request
    /// for the previous selection is invalidated.
    fn issue_conversion(&mut self) -> Option<ConversionRequest> {
        self.conversion_token += 1;
        let token = self.conversion_token;
        let target = match self.selected_gateway() {
            Some(g) if g.requires_conversion(&self.reference_currency) => {
                g.settlement_currency().cloned()
            }
            _ => None,
        };
        match target {
            Some(to) => {
                self.conversion = PriceConversion::Pending { token };
                Some(ConversionRequest {
                    token,
                    amount: self.base_amount(),
                    from: self.reference_currency.clone(),
                    to,
                })
            }
            None => {
                self.conversion = PriceConversion::NotRequired;
                None
            }
        }
    }

    /// Resolve a conversion request. A token that no longer matches
    /// the in-flight request belongs to a superseded selection and is
    /// dropped without touching state.
    pub fn resolve_conversion(&mut self, token: u64, outcome: Result<ConvertedPrice, String>) {
        let current = match &self.conversion {
            PriceConversion::Pending { token } => *token,
            _ => return,
        };
        if current != token {
            return;
        }
        self.conversion = match outcome {
            Ok(price) => PriceConversion::Ready(price),
            Err(message) => PriceConversion::Failed { message },
        };
    }

    /// Apply a validator-accepted discount. Does not re-trigger
    /// conversion: the converted price is gateway/cycle-derived.
    pub fn apply_discount(&mut self, applied: AppliedDiscount) {
        self.discount = DiscountState::Discounted(applied);
        self.reenter_ready();
    }

    /// Remove the applied discount, restoring the undiscounted base
    pub fn remove_discount(&mut self) {
        self.discount = DiscountState::NoDiscount;
        self.reenter_ready();
    }

    pub fn set_terms_accepted(&mut self, accepted: bool) {
        self.terms_accepted = accepted;
        self.reenter_ready();
    }

    /// Submit guard: gateway selected, terms accepted, no conversion
    /// in flight, and a converted price present whenever one is needed
    pub fn can_submit(&self) -> bool {
        self.is_interactive()
            && self.selected_gateway().is_some()
            && self.terms_accepted
            && matches!(
                self.conversion,
                PriceConversion::NotRequired | PriceConversion::Ready(_)
            )
    }

    fn blocked_reason(&self) -> String {
        if self.selected_gateway().is_none() {
            "no payment gateway selected"
        } else if !self.terms_accepted {
            "terms have not been accepted"
        } else if self.conversion.is_pending() {
            "currency conversion is still in progress"
        } else if self.conversion.is_failed() {
            "currency conversion failed"
        } else {
            "checkout is not ready"
        }
        .to_string()
    }

    /// The final (amount, currency) pair a submission will charge
    pub fn charge_quote(&self) -> CheckoutResult<ChargeQuote> {
        match &self.conversion {
            PriceConversion::NotRequired => Ok(ChargeQuote {
                amount: self.final_reference_amount(),
                currency: self.reference_currency.clone(),
            }),
            PriceConversion::Ready(price) => {
                let amount = match self.discount.applied() {
                    Some(d) => {
                        discounted_converted_amount(price.amount, d.final_amount, self.base_amount())
                    }
                    None => price.amount,
                };
                Ok(ChargeQuote {
                    amount,
                    currency: price.currency.clone(),
                })
            }
            PriceConversion::Pending { .. } => Err(CheckoutError::SubmissionBlocked {
                reason: "currency conversion is still in progress".to_string(),
            }),
            PriceConversion::Failed { .. } => Err(CheckoutError::SubmissionBlocked {
                reason: "currency conversion failed".to_string(),
            }),
        }
    }

    /// Enter `Submitting` and build the one payment-session request
    /// for this attempt. The idempotency key is fresh per attempt.
    pub fn begin_submit(&mut self) -> CheckoutResult<PaymentRequest> {
        self.ensure_interactive()?;
        if !self.can_submit() {
            return Err(CheckoutError::SubmissionBlocked {
                reason: self.blocked_reason(),
            });
        }
        let preferred_gateway = self
            .selected_gateway()
            .map(|g| g.id.clone())
            .ok_or_else(|| {
                CheckoutError::Internal("submit guard passed without a gateway".to_string())
            })?;
        let quote = self.charge_quote()?;

        let mut description = format!("{} plan ({} billing)", self.plan.name, self.cycle);
        let mut metadata = HashMap::new();
        metadata.insert("plan".to_string(), self.plan.slug.clone());
        metadata.insert("cycle".to_string(), self.cycle.to_string());
        metadata.insert(
            "reference_amount".to_string(),
            self.final_reference_amount().to_string(),
        );
        metadata.insert(
            "reference_currency".to_string(),
            self.reference_currency.to_string(),
        );
        if let Some(d) = self.discount.applied() {
            description.push_str(&format!(", promo {}", d.code));
            metadata.insert("discount_code".to_string(), d.code.clone());
            metadata.insert("discount_amount".to_string(), d.amount.to_string());
        }

        let request = PaymentRequest {
            amount: quote.amount,
            currency: quote.currency,
            description,
            preferred_gateway,
            success_url: self.urls.success_url(&self.plan.slug, self.cycle),
            cancel_url: self.urls.cancel_url(&self.plan.slug, self.cycle),
            idempotency_key: Uuid::new_v4().to_string(),
            metadata,
        };
        self.phase = Phase::Submitting;
        Ok(request)
    }

    /// Interpret the provider's session result.
    ///
    /// An explicit failure wins; otherwise a checkout URL means an
    /// external redirect; a completed session with no URL finished
    /// inline; anything else is a provider misconfiguration.
    pub fn complete_submit(&mut self, session: PaymentSession) {
        self.phase = match (session.status, session.checkout_url) {
            (PaymentSessionStatus::Failed, _) => Phase::Failed {
                message: session.error_message.unwrap_or_else(|| {
                    "The payment could not be started. Please try again.".to_string()
                }),
                kind: FailureKind::Provider,
            },
            (_, Some(checkout_url)) => Phase::Redirecting { checkout_url },
            (PaymentSessionStatus::Completed, None) => Phase::SucceededInline {
                payment_id: session.payment_id,
            },
            (PaymentSessionStatus::Pending, None) => Phase::Failed {
                message: "The payment provider did not return a next step. Please contact support."
                    .to_string(),
                kind: FailureKind::Misconfiguration,
            },
        };
    }

    /// Record a submission that never produced a session result
    pub fn fail_submit(&mut self, message: impl Into<String>, kind: FailureKind) {
        self.phase = Phase::Failed {
            message: message.into(),
            kind,
        };
    }
}

/// Async driver: owns the aggregate and a billing backend handle,
/// performing the I/O between state transitions.
pub struct CheckoutFlow {
    api: SharedBillingApi,
    state: CheckoutState,
}

impl CheckoutFlow {
    /// Enter checkout: load plans and gateways in parallel, match the
    /// plan slug, and auto-select the default gateway. Failures here
    /// are fatal for the session (the load-error surface); conversion
    /// failures are not, they block submission inline instead.
    pub async fn enter(
        api: SharedBillingApi,
        plan_slug: &str,
        cycle: BillingCycle,
        reference_currency: CurrencyCode,
        urls: ReturnUrls,
    ) -> CheckoutResult<Self> {
        let (plans, gateways) =
            tokio::try_join!(api.list_plans(), api.list_enabled_gateways())?;

        let catalog = PlanCatalog::new(plans);
        let plan = catalog
            .get(plan_slug)
            .cloned()
            .ok_or_else(|| CheckoutError::PlanNotFound {
                slug: plan_slug.to_string(),
            })?;

        let registry = GatewayRegistry::new(gateways);
        if registry.is_empty() {
            return Err(CheckoutError::NoGatewayAvailable);
        }

        let (state, request) = CheckoutState::new(plan, cycle, registry, reference_currency, urls);
        let mut flow = Self { api, state };
        if let Some(request) = request {
            flow.run_conversion(request).await;
        }
        Ok(flow)
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    async fn run_conversion(&mut self, request: ConversionRequest) {
        let outcome = self
            .api
            .convert_currency(request.amount, &request.from, &request.to)
            .await;
        match outcome {
            Ok(conversion) => self.state.resolve_conversion(
                request.token,
                Ok(ConvertedPrice {
                    amount: conversion.converted_amount,
                    currency: request.to,
                    rate: conversion.exchange_rate,
                }),
            ),
            Err(err) => self
                .state
                .resolve_conversion(request.token, Err(err.to_string())),
        }
    }

    /// Change the selected gateway, converting the plan price into its
    /// settlement currency when it cannot take the reference currency
    pub async fn select_gateway(&mut self, gateway_id: &str) -> CheckoutResult<()> {
        let request = self.state.select_gateway(gateway_id)?;
        if let Some(request) = request {
            self.run_conversion(request).await;
        }
        Ok(())
    }

    /// Validate a code against the plan's reference-currency base
    /// amount. A rejection leaves the aggregate unchanged.
    pub async fn apply_discount(&mut self, code: &str) -> CheckoutResult<DiscountDecision> {
        self.state.ensure_interactive()?;
        let normalized = normalize_code(code);
        if normalized.is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "Discount code must not be empty".to_string(),
            ));
        }
        let decision = self
            .api
            .validate_discount(&normalized, &self.state.plan().slug, self.state.base_amount())
            .await?;
        if let DiscountDecision::Accepted(applied) = &decision {
            self.state.apply_discount(applied.clone());
        }
        Ok(decision)
    }

    pub fn remove_discount(&mut self) -> CheckoutResult<()> {
        self.state.ensure_interactive()?;
        self.state.remove_discount();
        Ok(())
    }

    pub fn set_terms_accepted(&mut self, accepted: bool) -> CheckoutResult<()> {
        self.state.ensure_interactive()?;
        self.state.set_terms_accepted(accepted);
        Ok(())
    }

    /// Submit the checkout: build the payment-session request, send
    /// it, and interpret the result. Request errors become a `Failed`
    /// phase; they never escape this boundary.
    pub async fn submit(&mut self) -> CheckoutResult<Phase> {
        let request = self.state.begin_submit()?;
        match self.api.create_payment(&request).await {
            Ok(session) => self.state.complete_submit(session),
            Err(err) => self.state.fail_submit(err.to_string(), FailureKind::Provider),
        }
        Ok(self.state.phase().clone())
    }
}
