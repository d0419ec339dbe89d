//! # Checkout Error Types
//!
//! Typed error handling for the upgrade-checkout engine.
//! All checkout operations return `Result<T, CheckoutError>`.

use thiserror::Error;

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Plan not found in catalog
    #[error("Plan not found: {slug}")]
    PlanNotFound { slug: String },

    /// Gateway not found among the enabled gateways
    #[error("Payment gateway not found: {gateway_id}")]
    GatewayNotFound { gateway_id: String },

    /// No enabled payment gateway configured
    #[error("No payment gateway is available")]
    NoGatewayAvailable,

    /// Submission refused by a state-machine guard
    #[error("Submission blocked: {reason}")]
    SubmissionBlocked { reason: String },

    /// Checkout session expired or not found
    #[error("Checkout session not found or expired: {session_id}")]
    SessionNotFound { session_id: String },

    /// Billing backend API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with the billing backend
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::NetworkError(_) | CheckoutError::ProviderError { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Configuration(_) => 500,
            CheckoutError::InvalidRequest(_) => 400,
            CheckoutError::PlanNotFound { .. } => 404,
            CheckoutError::GatewayNotFound { .. } => 404,
            CheckoutError::NoGatewayAvailable => 503,
            CheckoutError::SubmissionBlocked { .. } => 409,
            CheckoutError::SessionNotFound { .. } => 404,
            CheckoutError::ProviderError { .. } => 502,
            CheckoutError::NetworkError(_) => 503,
            CheckoutError::Serialization(_) => 500,
            CheckoutError::Internal(_) => 500,
        }
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(CheckoutError::NetworkError("timeout".into()).is_retryable());
        assert!(CheckoutError::ProviderError {
            provider: "billing".into(),
            message: "upstream 502".into()
        }
        .is_retryable());
        assert!(!CheckoutError::InvalidRequest("bad data".into()).is_retryable());
        assert!(!CheckoutError::SubmissionBlocked {
            reason: "terms not accepted".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CheckoutError::PlanNotFound { slug: "x".into() }.status_code(),
            404
        );
        assert_eq!(
            CheckoutError::SubmissionBlocked {
                reason: "test".into()
            }
            .status_code(),
            409
        );
        assert_eq!(CheckoutError::NoGatewayAvailable.status_code(), 503);
        assert_eq!(CheckoutError::NetworkError("down".into()).status_code(), 503);
    }
}
