//! # Billing API Configuration
//!
//! Configuration management for the billing backend integration.
//! All secrets are loaded from environment variables.

use checkout_core::CheckoutError;
use std::env;

/// Billing backend API configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// API key for the billing backend
    pub api_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,
}

impl BillingConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `BILLING_API_URL`
    /// - `BILLING_API_KEY`
    pub fn from_env() -> Result<Self, CheckoutError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url = env::var("BILLING_API_URL").map_err(|_| {
            CheckoutError::Configuration("BILLING_API_URL not set".to_string())
        })?;

        let api_key = env::var("BILLING_API_KEY").map_err(|_| {
            CheckoutError::Configuration("BILLING_API_KEY not set".to_string())
        })?;

        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(CheckoutError::Configuration(
                "BILLING_API_URL must start with http:// or https://".to_string(),
            ));
        }

        if api_key.trim().is_empty() {
            return Err(CheckoutError::Configuration(
                "BILLING_API_KEY must not be empty".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(api_base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_base_url: String = api_base_url.into();
        Self {
            api_key: api_key.into(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_stripped() {
        let config = BillingConfig::new("https://billing.example.com/", "key_abc");
        assert_eq!(config.api_base_url, "https://billing.example.com");
    }

    #[test]
    fn test_auth_header() {
        let config = BillingConfig::new("https://billing.example.com", "key_abc");
        assert_eq!(config.auth_header(), "Bearer key_abc");
    }

    #[test]
    fn test_from_env_missing_url() {
        std::env::remove_var("BILLING_API_URL");

        let result = BillingConfig::from_env();
        assert!(result.is_err());
    }
}
