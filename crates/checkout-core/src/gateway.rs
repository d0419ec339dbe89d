//! # Payment Gateways
//!
//! Gateway definitions and the session-scoped registry of enabled
//! providers. A gateway's `supported_currencies` is ordered: index 0
//! is its preferred settlement currency.

use crate::money::CurrencyCode;
use serde::{Deserialize, Serialize};

/// A configured payment provider instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    /// Provider identifier (e.g., "midtrans", "paypal")
    pub id: String,

    /// Display name
    pub name: String,

    /// Whether this gateway is the platform default
    #[serde(default)]
    pub is_default: bool,

    /// Whether this gateway is enabled
    #[serde(default = "default_true")]
    pub is_enabled: bool,

    /// Ordered currency codes; index 0 is the settlement currency
    #[serde(default)]
    pub supported_currencies: Vec<CurrencyCode>,

    /// Payment methods offered by this gateway (display only)
    #[serde(default)]
    pub payment_methods: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Gateway {
    /// Membership test against the supported currency list
    pub fn supports(&self, currency: &CurrencyCode) -> bool {
        self.supported_currencies.contains(currency)
    }

    /// The gateway's preferred settlement currency, if it declares any
    pub fn settlement_currency(&self) -> Option<&CurrencyCode> {
        self.supported_currencies.first()
    }

    /// Whether charging in `reference` requires a conversion first.
    /// An empty currency list means the gateway takes whatever it is
    /// given, so no conversion applies.
    pub fn requires_conversion(&self, reference: &CurrencyCode) -> bool {
        !self.supported_currencies.is_empty() && !self.supports(reference)
    }
}

/// Registry of enabled gateways for one checkout session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayRegistry {
    pub gateways: Vec<Gateway>,
}

impl GatewayRegistry {
    /// Build a registry from a gateway list, keeping enabled entries only
    pub fn new(gateways: Vec<Gateway>) -> Self {
        Self {
            gateways: gateways.into_iter().filter(|g| g.is_enabled).collect(),
        }
    }

    /// Find a gateway by id
    pub fn get(&self, gateway_id: &str) -> Option<&Gateway> {
        self.gateways.iter().find(|g| g.id == gateway_id)
    }

    /// Default-selection rule: first gateway marked default, falling
    /// back to the first of the list, or none when the list is empty.
    pub fn default_gateway(&self) -> Option<&Gateway> {
        self.gateways
            .iter()
            .find(|g| g.is_default)
            .or_else(|| self.gateways.first())
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(id: &str, is_default: bool, currencies: &[&str]) -> Gateway {
        Gateway {
            id: id.to_string(),
            name: id.to_string(),
            is_default,
            is_enabled: true,
            supported_currencies: currencies.iter().map(|c| CurrencyCode::new(*c)).collect(),
            payment_methods: vec![],
        }
    }

    #[test]
    fn test_default_selection_rule() {
        let registry = GatewayRegistry::new(vec![
            gateway("paypal", false, &["USD"]),
            gateway("midtrans", true, &["IDR"]),
        ]);
        assert_eq!(registry.default_gateway().unwrap().id, "midtrans");

        // No default flag: fall back to first
        let registry = GatewayRegistry::new(vec![
            gateway("paypal", false, &["USD"]),
            gateway("midtrans", false, &["IDR"]),
        ]);
        assert_eq!(registry.default_gateway().unwrap().id, "paypal");

        let empty = GatewayRegistry::new(vec![]);
        assert!(empty.default_gateway().is_none());
    }

    #[test]
    fn test_disabled_gateways_filtered() {
        let mut disabled = gateway("square", false, &["USD"]);
        disabled.is_enabled = false;
        let registry = GatewayRegistry::new(vec![disabled, gateway("paypal", false, &["USD"])]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("square").is_none());
    }

    #[test]
    fn test_requires_conversion() {
        let usd = CurrencyCode::new("USD");
        let paypal = gateway("paypal", false, &["USD", "EUR"]);
        assert!(!paypal.requires_conversion(&usd));

        let midtrans = gateway("midtrans", false, &["IDR"]);
        assert!(midtrans.requires_conversion(&usd));
        assert_eq!(midtrans.settlement_currency().unwrap().as_str(), "IDR");

        // Empty list takes the reference currency directly
        let open = gateway("open", false, &[]);
        assert!(!open.requires_conversion(&usd));
    }
}
