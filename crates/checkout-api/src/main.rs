//! # Upgrade Checkout RS
//!
//! Checkout pricing and payment-session orchestration service.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export BILLING_API_URL=https://billing.internal.example.com
//! export BILLING_API_KEY=key_...
//!
//! # Run the server
//! upgrade-checkout
//! ```

use checkout_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Reference currency: {}", state.config.reference_currency);
    info!("Session TTL: {} minutes", state.config.session_ttl_minutes);

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🚀 Upgrade-Checkout starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Checkout: POST http://{}/api/v1/checkout?plan=pro&cycle=yearly", addr);
        info!("🏷️ Plans: GET http://{}/api/v1/plans", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  ⚡ Upgrade-Checkout RS ⚡
  ━━━━━━━━━━━━━━━━━━━━━━━━
  Plan upgrade checkout engine
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
