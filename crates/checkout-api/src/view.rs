//! # Checkout View Models
//!
//! Serialized snapshots of a checkout session for the hosting page.
//! The view is rebuilt from the aggregate after every mutation, so
//! the page never derives pricing on its own.

use checkout_core::{
    BillingCycle, CheckoutFlow, DiscountType, Money, Phase, PlanFeature, PriceConversion,
};
use serde::Serialize;

/// Plan summary with derived display prices
#[derive(Debug, Serialize)]
pub struct PlanView {
    pub slug: String,
    pub name: String,
    /// Reference-currency price for the session's cycle
    pub price: i64,
    pub price_display: String,
    /// Effective monthly price when paying yearly
    pub monthly_equivalent: i64,
    /// Amount saved per year by paying yearly
    pub yearly_savings: i64,
    pub features: Vec<PlanFeature>,
}

#[derive(Debug, Serialize)]
pub struct GatewayView {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub settlement_currency: Option<String>,
    pub payment_methods: Vec<String>,
}

/// Conversion slot as shown to the page
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionView {
    NotRequired,
    Pending,
    Ready {
        amount: i64,
        currency: String,
        rate: f64,
        display: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct DiscountView {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub amount: i64,
    pub final_amount: i64,
}

/// The final charge, present only when it is currently computable
#[derive(Debug, Serialize)]
pub struct ChargeView {
    pub amount: i64,
    pub currency: String,
    pub display: String,
}

/// Full session snapshot returned from every checkout endpoint
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    #[serde(flatten)]
    pub phase: Phase,
    pub plan: PlanView,
    pub cycle: BillingCycle,
    pub reference_currency: String,
    pub base_amount: i64,
    pub gateways: Vec<GatewayView>,
    pub selected_gateway: Option<String>,
    pub conversion: ConversionView,
    pub discount: Option<DiscountView>,
    pub terms_accepted: bool,
    pub charge: Option<ChargeView>,
    pub can_submit: bool,
}

impl CheckoutView {
    pub fn from_flow(flow: &CheckoutFlow) -> Self {
        let state = flow.state();
        let plan = state.plan();
        let reference = state.reference_currency();

        let conversion = match state.conversion() {
            PriceConversion::NotRequired => ConversionView::NotRequired,
            PriceConversion::Pending { .. } => ConversionView::Pending,
            PriceConversion::Ready(price) => ConversionView::Ready {
                amount: price.amount,
                currency: price.currency.to_string(),
                rate: price.rate,
                display: Money::new(price.amount, price.currency.clone()).display(),
            },
            PriceConversion::Failed { message } => ConversionView::Failed {
                message: message.clone(),
            },
        };

        let discount = state.discount().applied().map(|d| DiscountView {
            code: d.code.clone(),
            discount_type: d.discount_type,
            discount_value: d.discount_value,
            amount: d.amount,
            final_amount: d.final_amount,
        });

        let charge = state.charge_quote().ok().map(|quote| ChargeView {
            amount: quote.amount,
            currency: quote.currency.to_string(),
            display: Money::new(quote.amount, quote.currency).display(),
        });

        Self {
            phase: state.phase().clone(),
            plan: PlanView {
                slug: plan.slug.clone(),
                name: plan.name.clone(),
                price: state.base_amount(),
                price_display: plan.display_price(state.cycle(), reference),
                monthly_equivalent: plan.monthly_equivalent(),
                yearly_savings: plan.yearly_savings(),
                features: plan.features.clone(),
            },
            cycle: state.cycle(),
            reference_currency: reference.to_string(),
            base_amount: state.base_amount(),
            gateways: state
                .gateways()
                .iter()
                .map(|g| GatewayView {
                    id: g.id.clone(),
                    name: g.name.clone(),
                    is_default: g.is_default,
                    settlement_currency: g.settlement_currency().map(|c| c.to_string()),
                    payment_methods: g.payment_methods.clone(),
                })
                .collect(),
            selected_gateway: state.selected_gateway().map(|g| g.id.clone()),
            conversion,
            discount,
            terms_accepted: state.terms_accepted(),
            charge,
            can_submit: state.can_submit(),
        }
    }
}

/// Terminal load failure: the view cannot render a purchasable order,
/// so the page gets a dead-end with a navigation escape.
#[derive(Debug, Serialize)]
pub struct LoadErrorView {
    #[serde(flatten)]
    pub phase: Phase,
    /// Back-to-billing escape for the dead-end
    pub back_url: String,
}

impl LoadErrorView {
    pub fn new(message: impl Into<String>, back_url: impl Into<String>) -> Self {
        Self {
            phase: Phase::LoadError {
                message: message.into(),
            },
            back_url: back_url.into(),
        }
    }
}
