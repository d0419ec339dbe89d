//! # Application State
//!
//! Shared state for the Axum application: the billing backend handle,
//! configuration, and the in-memory checkout session store.

use checkout_core::{CheckoutFlow, CurrencyCode, ReturnUrls, SharedBillingApi};
use checkout_http::BillingClient;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for payment redirect callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// The platform reference currency plan prices are defined in
    pub reference_currency: CurrencyCode,
    /// Minutes an abandoned checkout session is kept before pruning
    pub session_ttl_minutes: i64,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            reference_currency: CurrencyCode::new(
                std::env::var("REFERENCE_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            ),
            session_ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

struct SessionEntry {
    flow: Arc<tokio::sync::Mutex<CheckoutFlow>>,
    created_at: DateTime<Utc>,
}

/// In-memory store of live checkout sessions, keyed by UUID.
///
/// Sessions are short-lived and never persisted: a page reload
/// restarts the flow from the plan slug. Expired entries are pruned
/// opportunistically on insert and lookup.
#[derive(Clone)]
pub struct SessionStore {
    ttl: Duration,
    inner: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes),
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a new checkout flow and return its session id
    pub fn insert(&self, flow: CheckoutFlow) -> Uuid {
        let mut sessions = self.inner.lock().expect("session store lock poisoned");
        Self::prune_expired(&mut sessions, self.ttl);

        let session_id = Uuid::new_v4();
        sessions.insert(
            session_id,
            SessionEntry {
                flow: Arc::new(tokio::sync::Mutex::new(flow)),
                created_at: Utc::now(),
            },
        );
        session_id
    }

    /// Look up a live session's flow
    pub fn get(&self, session_id: &Uuid) -> Option<Arc<tokio::sync::Mutex<CheckoutFlow>>> {
        let mut sessions = self.inner.lock().expect("session store lock poisoned");
        Self::prune_expired(&mut sessions, self.ttl);
        sessions.get(session_id).map(|entry| entry.flow.clone())
    }

    /// Drop a session once checkout completed or was abandoned
    pub fn remove(&self, session_id: &Uuid) {
        let mut sessions = self.inner.lock().expect("session store lock poisoned");
        sessions.remove(session_id);
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("session store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune_expired(sessions: &mut HashMap<Uuid, SessionEntry>, ttl: Duration) {
        let cutoff = Utc::now() - ttl;
        sessions.retain(|_, entry| entry.created_at > cutoff);
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Billing backend handle
    pub api: SharedBillingApi,
    /// Live checkout sessions
    pub sessions: SessionStore,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by the production billing client
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let client = BillingClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize billing client: {}", e))?;

        Ok(Self::with_api(Arc::new(client), config))
    }

    /// Create state with an explicit billing backend (for testing)
    pub fn with_api(api: SharedBillingApi, config: AppConfig) -> Self {
        let sessions = SessionStore::new(config.session_ttl_minutes);
        Self {
            api,
            sessions,
            config,
        }
    }

    /// Redirect targets handed to the payment provider
    pub fn return_urls(&self) -> ReturnUrls {
        ReturnUrls::new(&self.config.base_url)
    }
}
