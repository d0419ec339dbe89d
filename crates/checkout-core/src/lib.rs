//! # checkout-core
//!
//! Core types and the checkout state machine for the upgrade-checkout
//! engine.
//!
//! This crate provides:
//! - `BillingApi` trait for the billing backend contract
//! - `Plan` and `PlanCatalog` for the subscription plans
//! - `Gateway` and `GatewayRegistry` for payment providers
//! - `CheckoutState` and `CheckoutFlow` for the checkout flow
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{BillingCycle, CheckoutFlow, CurrencyCode, ReturnUrls};
//!
//! // Enter checkout for a plan picked on the upgrade page
//! let mut flow = CheckoutFlow::enter(
//!     api,
//!     "pro",
//!     BillingCycle::Yearly,
//!     CurrencyCode::new("USD"),
//!     ReturnUrls::new("https://app.example.com"),
//! ).await?;
//!
//! // Drive the session
//! flow.select_gateway("midtrans").await?;
//! flow.apply_discount("SAVE10").await?;
//! flow.set_terms_accepted(true)?;
//!
//! // Submit and route on the resulting phase
//! let phase = flow.submit().await?;
//! ```

pub mod api;
pub mod discount;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod money;
pub mod plan;
pub mod quote;

// Re-exports for convenience
pub use api::{
    BillingApi, Conversion, PaymentRequest, PaymentSession, PaymentSessionStatus,
    SharedBillingApi,
};
pub use discount::{
    AppliedDiscount, DiscountDecision, DiscountState, DiscountType,
};
pub use error::{CheckoutError, CheckoutResult};
pub use flow::{
    CheckoutFlow, CheckoutState, ConversionRequest, FailureKind, Phase, ReturnUrls,
};
pub use gateway::{Gateway, GatewayRegistry};
pub use money::{CurrencyCode, Money};
pub use plan::{BillingCycle, Plan, PlanCatalog, PlanFeature};
pub use quote::{ChargeQuote, ConvertedPrice, PriceConversion};
