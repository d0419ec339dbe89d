//! # Routes
//!
//! Axum router configuration for the upgrade-checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Checkout sessions:
///   - POST /api/v1/checkout?plan={slug}&cycle={cycle} - Enter checkout
///   - GET  /api/v1/checkout/{session_id} - Session snapshot
///   - POST /api/v1/checkout/{session_id}/gateway - Select gateway
///   - POST /api/v1/checkout/{session_id}/discount - Apply discount code
///   - DELETE /api/v1/checkout/{session_id}/discount - Remove discount
///   - POST /api/v1/checkout/{session_id}/terms - Toggle terms acceptance
///   - POST /api/v1/checkout/{session_id}/submit - Create the payment session
///
/// - Plans:
///   - GET /api/v1/plans - List purchasable plans
///
/// - Static pages:
///   - GET /checkout/success - Post-payment success page
///   - GET /checkout/cancel - Cancel page
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - the checkout page may be served from the
    // marketing site's origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Static success/cancel pages
    let checkout_pages = Router::new()
        .route("/success", get(handlers::checkout_success))
        .route("/cancel", get(handlers::checkout_cancel));

    // Checkout session routes
    let session_routes = Router::new()
        .route("/checkout", post(handlers::enter_checkout))
        .route("/checkout/{session_id}", get(handlers::get_checkout))
        .route(
            "/checkout/{session_id}/gateway",
            post(handlers::select_gateway),
        )
        .route(
            "/checkout/{session_id}/discount",
            post(handlers::apply_discount).delete(handlers::remove_discount),
        )
        .route("/checkout/{session_id}/terms", post(handlers::set_terms))
        .route(
            "/checkout/{session_id}/submit",
            post(handlers::submit_checkout),
        );

    // Combined API v1 routes
    let api_routes = Router::new()
        .route("/plans", get(handlers::list_plans))
        .merge(session_routes);

    // Combine all routes
    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Checkout success/cancel pages
        .nest("/checkout", checkout_pages)
        // API v1
        .nest("/api/v1", api_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
