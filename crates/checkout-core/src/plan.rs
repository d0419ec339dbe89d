//! # Plan Types
//!
//! Subscription plan definitions for the upgrade checkout.
//! Plans are fetched from the billing backend at checkout entry and
//! held immutable for the lifetime of the session.

use crate::money::{CurrencyCode, Money};
use serde::{Deserialize, Serialize};

/// Billing cycle selecting which plan price applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl Default for BillingCycle {
    fn default() -> Self {
        BillingCycle::Monthly
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A feature row in a plan's comparison list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFeature {
    pub name: String,
    pub included: bool,
}

/// A purchasable subscription plan
///
/// Prices are in the platform reference currency, smallest unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Unique plan identifier (e.g., "pro")
    pub slug: String,

    /// Display name
    pub name: String,

    /// Price per month
    pub price_monthly: i64,

    /// Price per year
    pub price_yearly: i64,

    /// Ordered feature list for the comparison table
    #[serde(default)]
    pub features: Vec<PlanFeature>,
}

impl Plan {
    /// The reference-currency price for the given cycle
    pub fn price_for(&self, cycle: BillingCycle) -> i64 {
        match cycle {
            BillingCycle::Monthly => self.price_monthly,
            BillingCycle::Yearly => self.price_yearly,
        }
    }

    /// Effective monthly price when paying yearly
    pub fn monthly_equivalent(&self) -> i64 {
        self.price_yearly / 12
    }

    /// Amount saved per year by paying yearly instead of monthly.
    /// Non-negative whenever the yearly price undercuts twelve months.
    pub fn yearly_savings(&self) -> i64 {
        self.price_monthly * 12 - self.price_yearly
    }

    /// Display price for the given cycle
    pub fn display_price(&self, cycle: BillingCycle, currency: &CurrencyCode) -> String {
        Money::new(self.price_for(cycle), currency.clone()).display()
    }
}

/// Session-scoped plan lookup, loaded once at checkout entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanCatalog {
    pub plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    /// Find a plan by slug
    pub fn get(&self, slug: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pro_plan() -> Plan {
        Plan {
            slug: "pro".to_string(),
            name: "Pro".to_string(),
            price_monthly: 50,
            price_yearly: 480,
            features: vec![PlanFeature {
                name: "Unlimited projects".to_string(),
                included: true,
            }],
        }
    }

    #[test]
    fn test_price_for_cycle() {
        let plan = pro_plan();
        assert_eq!(plan.price_for(BillingCycle::Monthly), 50);
        assert_eq!(plan.price_for(BillingCycle::Yearly), 480);
    }

    #[test]
    fn test_monthly_equivalent_and_savings() {
        let plan = pro_plan();
        assert_eq!(plan.monthly_equivalent(), 40);
        // 50 * 12 - 480 = 120, never negative while yearly <= 12x monthly
        assert_eq!(plan.yearly_savings(), 120);
        assert!(plan.yearly_savings() >= 0);
    }

    #[test]
    fn test_cycle_parse_default() {
        assert_eq!(BillingCycle::default(), BillingCycle::Monthly);
        let cycle: BillingCycle = serde_json::from_str("\"yearly\"").unwrap();
        assert_eq!(cycle, BillingCycle::Yearly);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = PlanCatalog::new(vec![pro_plan()]);
        assert!(catalog.get("pro").is_some());
        assert!(catalog.get("enterprise").is_none());
    }
}
