//! # checkout-api
//!
//! HTTP API layer for upgrade-checkout-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for checkout sessions and plans
//! - In-memory session store with TTL pruning
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/plans` | List plans |
//! | POST | `/api/v1/checkout` | Enter checkout |
//! | GET | `/api/v1/checkout/:id` | Session snapshot |
//! | POST | `/api/v1/checkout/:id/gateway` | Select gateway |
//! | POST | `/api/v1/checkout/:id/discount` | Apply discount |
//! | DELETE | `/api/v1/checkout/:id/discount` | Remove discount |
//! | POST | `/api/v1/checkout/:id/terms` | Toggle terms |
//! | POST | `/api/v1/checkout/:id/submit` | Submit checkout |

pub mod handlers;
pub mod routes;
pub mod state;
pub mod view;

pub use routes::create_router;
pub use state::{AppConfig, AppState, SessionStore};
pub use view::CheckoutView;
