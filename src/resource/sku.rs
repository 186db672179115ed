//! Service Plan SKU Classifier
//!
//! Maps App Service plan codes ("P1v2", "EP1", "Y1", ...) onto a plan
//! category. The built-in tables are loaded from embedded JSON on first
//! access; rules are evaluated in file order and the first match wins.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Embedded classification table (compiled into the binary)
const BUILTIN_SKUS: &str = include_str!("../resources/service_plan_skus.json");

/// Category of an App Service plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanCategory {
    App,
    Consumption,
    Elastic,
    #[serde(alias = "flex-consumption")]
    FlexConsumption,
    Isolated,
    Premium,
    Workflow,
    Free,
    Shared,
    Unknown,
}

impl PlanCategory {
    /// Order in which known SKUs are listed
    pub const LISTING_ORDER: [PlanCategory; 9] = [
        PlanCategory::App,
        PlanCategory::Consumption,
        PlanCategory::Elastic,
        PlanCategory::FlexConsumption,
        PlanCategory::Free,
        PlanCategory::Isolated,
        PlanCategory::Premium,
        PlanCategory::Shared,
        PlanCategory::Workflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Consumption => "consumption",
            Self::Elastic => "elastic",
            Self::FlexConsumption => "flexconsumption",
            Self::Isolated => "isolated",
            Self::Premium => "premium",
            Self::Workflow => "workflow",
            Self::Free => "free",
            Self::Shared => "shared",
            Self::Unknown => "unknown",
        }
    }

    pub fn supports_zone_balancing(&self) -> bool {
        matches!(
            self,
            Self::Premium
                | Self::Elastic
                | Self::Workflow
                | Self::Consumption
                | Self::FlexConsumption
                | Self::Isolated
        )
    }
}

impl fmt::Display for PlanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a plan can scale out elastically
///
/// Checks the literal code prefix rather than the category so codes missing
/// from the tables still qualify.
pub fn supports_scale_out(code: &str) -> bool {
    code.starts_with("EP") || code.starts_with("WS")
}

/// One membership table
#[derive(Debug, Clone, Deserialize)]
pub struct SkuRule {
    pub category: PlanCategory,
    pub skus: Vec<String>,
}

impl SkuRule {
    pub fn new(category: PlanCategory, skus: &[&str]) -> Self {
        Self {
            category,
            skus: skus.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn matches(&self, code: &str) -> bool {
        self.skus.iter().any(|s| s.eq_ignore_ascii_case(code))
    }
}

/// Derived facts about a plan code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanCapabilities {
    pub sku: String,
    pub category: PlanCategory,
    pub supports_zone_balancing: bool,
    pub supports_scale_out: bool,
}

/// Ordered SKU classification rules
#[derive(Debug, Clone, Deserialize)]
pub struct PlanCatalog {
    rules: Vec<SkuRule>,
}

static BUILTIN: OnceLock<PlanCatalog> = OnceLock::new();

impl PlanCatalog {
    /// Build a catalog from rules in priority order
    pub fn new(rules: Vec<SkuRule>) -> Result<Self> {
        for rule in &rules {
            if rule.category == PlanCategory::Unknown {
                bail!("the unknown category is the fallback and cannot have SKUs");
            }
        }
        Ok(Self { rules })
    }

    /// Parse a catalog from its JSON representation
    pub fn from_json(content: &str) -> Result<Self> {
        let catalog: PlanCatalog =
            serde_json::from_str(content).context("Failed to parse SKU catalog JSON")?;
        Self::new(catalog.rules)
    }

    /// The built-in catalog (loads from embedded JSON on first access)
    pub fn builtin() -> &'static PlanCatalog {
        BUILTIN.get_or_init(|| {
            Self::from_json(BUILTIN_SKUS)
                .unwrap_or_else(|e| panic!("Failed to parse embedded SKU catalog: {:#}", e))
        })
    }

    pub fn rules(&self) -> &[SkuRule] {
        &self.rules
    }

    /// Category of a plan code, `Unknown` when no table lists it
    pub fn classify(&self, code: &str) -> PlanCategory {
        self.rules
            .iter()
            .find(|rule| rule.matches(code))
            .map(|rule| rule.category)
            .unwrap_or(PlanCategory::Unknown)
    }

    pub fn is_category(&self, code: &str, category: PlanCategory) -> bool {
        self.classify(code) == category
    }

    pub fn is_known(&self, code: &str) -> bool {
        self.classify(code) != PlanCategory::Unknown
    }

    pub fn supports_zone_balancing(&self, code: &str) -> bool {
        self.classify(code).supports_zone_balancing()
    }

    pub fn capabilities(&self, code: &str) -> PlanCapabilities {
        let category = self.classify(code);
        PlanCapabilities {
            sku: code.to_string(),
            category,
            supports_zone_balancing: category.supports_zone_balancing(),
            supports_scale_out: supports_scale_out(code),
        }
    }

    /// SKUs listed for a category
    pub fn skus_for(&self, category: PlanCategory) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.category == category)
            .flat_map(|rule| rule.skus.iter().map(String::as_str))
            .collect()
    }

    /// Every known SKU, grouped by category in listing order
    pub fn all_known_skus(&self) -> Vec<&str> {
        PlanCategory::LISTING_ORDER
            .iter()
            .flat_map(|category| self.skus_for(*category))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = PlanCatalog::builtin();
        assert_eq!(catalog.rules().len(), 9);
        assert_eq!(catalog.rules()[0].category, PlanCategory::Premium);
    }

    #[test]
    fn test_premium_codes() {
        let catalog = PlanCatalog::builtin();
        for code in catalog.skus_for(PlanCategory::Premium) {
            assert_eq!(catalog.classify(code), PlanCategory::Premium);
            assert!(catalog.supports_zone_balancing(code));
        }
        assert_eq!(catalog.classify("p1V2"), PlanCategory::Premium);
    }

    #[test]
    fn test_consumption_plan() {
        let caps = PlanCatalog::builtin().capabilities("Y1");
        assert_eq!(caps.category, PlanCategory::Consumption);
        assert!(caps.supports_zone_balancing);
        assert!(!caps.supports_scale_out);
    }

    #[test]
    fn test_elastic_scale_out() {
        let caps = PlanCatalog::builtin().capabilities("EP2");
        assert_eq!(caps.category, PlanCategory::Elastic);
        assert!(caps.supports_scale_out);
    }

    #[test]
    fn test_scale_out_ignores_category() {
        assert_eq!(PlanCatalog::builtin().classify("EP9"), PlanCategory::Unknown);
        assert!(supports_scale_out("EP9"));
        assert!(supports_scale_out("WS1"));
        assert!(!supports_scale_out("ep1"));
        assert!(!supports_scale_out("P1v2"));
    }

    #[test]
    fn test_unknown_code() {
        let caps = PlanCatalog::builtin().capabilities("XYZ123");
        assert_eq!(caps.category, PlanCategory::Unknown);
        assert!(!caps.supports_zone_balancing);
        assert!(!caps.supports_scale_out);
        assert_eq!(PlanCatalog::builtin().classify(""), PlanCategory::Unknown);
    }

    #[test]
    fn test_free_and_shared_do_not_zone_balance() {
        let catalog = PlanCatalog::builtin();
        assert_eq!(catalog.classify("F1"), PlanCategory::Free);
        assert_eq!(catalog.classify("shared"), PlanCategory::Shared);
        assert!(!catalog.supports_zone_balancing("F1"));
        assert!(!catalog.supports_zone_balancing("D1"));
        assert!(!catalog.supports_zone_balancing("B1"));
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let catalog = PlanCatalog::new(vec![
            SkuRule::new(PlanCategory::Premium, &["X1"]),
            SkuRule::new(PlanCategory::App, &["X1", "X2"]),
        ])
        .unwrap();
        assert_eq!(catalog.classify("x1"), PlanCategory::Premium);
        assert_eq!(catalog.classify("X2"), PlanCategory::App);
    }

    #[test]
    fn test_unknown_rule_is_rejected() {
        let result = PlanCatalog::new(vec![SkuRule::new(PlanCategory::Unknown, &["Z1"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_accepts_dashed_alias() {
        let catalog =
            PlanCatalog::from_json(r#"{"rules":[{"category":"flex-consumption","skus":["FC1"]}]}"#)
                .unwrap();
        assert_eq!(catalog.classify("fc1"), PlanCategory::FlexConsumption);
    }

    #[test]
    fn test_all_known_skus_order() {
        let all = PlanCatalog::builtin().all_known_skus();
        assert_eq!(all.len(), 43);
        assert_eq!(&all[..3], ["B1", "B2", "B3"]);
        assert_eq!(all.last(), Some(&"WS3"));
        assert!(all.contains(&"SHARED"));
    }
}
