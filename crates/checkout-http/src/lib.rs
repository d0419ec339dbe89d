//! # checkout-http
//!
//! Billing backend HTTP client for upgrade-checkout-rs.
//!
//! This crate provides `BillingClient`, the production implementation
//! of `checkout_core::BillingApi`:
//!
//! - `GET /v1/plans` - purchasable plans
//! - `GET /v1/gateways?enabled_only=true` - enabled payment gateways
//! - `POST /v1/currency/convert` - reference-to-settlement conversion
//! - `POST /v1/discount/validate` - promo code validation
//! - `POST /v1/payment/create` - payment session creation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_http::BillingClient;
//! use checkout_core::{BillingApi, SharedBillingApi};
//! use std::sync::Arc;
//!
//! // Create client from environment (BILLING_API_URL, BILLING_API_KEY)
//! let client = BillingClient::from_env()?;
//! let api: SharedBillingApi = Arc::new(client);
//!
//! let plans = api.list_plans().await?;
//! ```

pub mod client;
pub mod config;

// Re-exports
pub use client::BillingClient;
pub use config::BillingConfig;
