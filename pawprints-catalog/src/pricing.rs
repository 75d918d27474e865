use pawprints_shared::{EstimateBreakdown, PriceQuote, QuoteSource, VendorQuoteSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::material::{CatalogError, MaterialCatalog, MaterialSpec};
use crate::reconcile::VendorMatchRules;

/// Coefficient of the height-to-volume curve
pub const VOLUME_COEFFICIENT: f64 = 0.12;

/// Exponent of the height-to-volume curve
pub const VOLUME_EXPONENT: f64 = 2.4;

/// Estimated print volume in cm³ for a statue of the given height.
///
/// Empirical allometric fit for pet-statue proportions, not a physical model.
/// The coefficient and exponent are fixed so existing prices stay stable.
/// Negative or NaN heights count as zero.
pub fn estimate_volume_cm3(height_mm: f64) -> f64 {
    let height_cm = (height_mm / 10.0).max(0.0);
    VOLUME_COEFFICIENT * height_cm.powf(VOLUME_EXPONENT)
}

/// Margin tiers and per-order cost floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginPolicy {
    /// Markup percentage per material id, higher on cheap materials
    pub margin_tiers: HashMap<String, f64>,

    /// Margin for materials without a tier
    pub default_margin: f64,

    /// Flat production/API cost incurred by every order
    pub api_cost_per_order: f64,

    /// Profit that must remain after `api_cost_per_order`
    pub min_profit: f64,
}

impl MarginPolicy {
    pub fn margin_for(&self, material_id: &str) -> f64 {
        self.margin_tiers
            .get(material_id)
            .copied()
            .unwrap_or(self.default_margin)
    }

    /// Smallest markup any order may carry
    pub fn markup_floor(&self) -> f64 {
        self.min_profit + self.api_cost_per_order
    }

    /// Tiered markup on `base_cost`, raised to the floor when needed
    pub fn markup_for(&self, material_id: &str, base_cost: f64) -> f64 {
        // f64::max also lifts a NaN markup to the floor
        (base_cost * self.margin_for(material_id)).max(self.markup_floor())
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let all_margins = self
            .margin_tiers
            .values()
            .chain(std::iter::once(&self.default_margin));
        for margin in all_margins {
            if !(margin.is_finite() && *margin >= 0.0) {
                return Err(CatalogError::InvalidPolicy(format!("margin {} is not valid", margin)));
            }
        }
        if !(self.api_cost_per_order >= 0.0 && self.min_profit >= 0.0) {
            return Err(CatalogError::InvalidPolicy(
                "api cost and minimum profit must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self {
            margin_tiers: {
                let mut m = HashMap::new();
                m.insert("abs".to_string(), 0.90);
                m.insert("sla".to_string(), 0.65);
                m.insert("bronze".to_string(), 0.45);
                m
            },
            default_margin: 0.65,
            api_cost_per_order: 5.00,
            min_profit: 20.00,
        }
    }
}

/// Flat-rate product sold at one material and one size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedProduct {
    pub name: String,
    pub material_id: String,
    pub height_mm: f64,
    pub base_cost: f64,
    pub markup: f64,
}

impl Default for FixedProduct {
    /// Bronze keyring: vendor ~$240 plus $80 margin
    fn default() -> Self {
        Self {
            name: "Keyring".to_string(),
            material_id: "bronze".to_string(),
            height_mm: 50.0,
            base_cost: 240.0,
            markup: 80.0,
        }
    }
}

/// Outcome of a size check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Suggested height, only offered when the request is too large
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamped: Option<f64>,
}

impl SizeCheck {
    fn ok() -> Self {
        Self { valid: true, message: None, clamped: None }
    }

    fn rejected(message: String, clamped: Option<f64>) -> Self {
        Self { valid: false, message: Some(message), clamped }
    }
}

/// Pure pricing over an immutable catalog and margin policy
#[derive(Debug, Clone)]
pub struct PricingEngine {
    catalog: MaterialCatalog,
    policy: MarginPolicy,
    rules: VendorMatchRules,
    fixed_product: FixedProduct,
}

impl PricingEngine {
    pub fn new(
        catalog: MaterialCatalog,
        policy: MarginPolicy,
        rules: VendorMatchRules,
        fixed_product: FixedProduct,
    ) -> Result<Self, CatalogError> {
        policy.validate()?;
        if !catalog.contains(&fixed_product.material_id) {
            return Err(CatalogError::InvalidPolicy(format!(
                "fixed product {} uses unknown material {}",
                fixed_product.name, fixed_product.material_id
            )));
        }
        Ok(Self { catalog, policy, rules, fixed_product })
    }

    /// Standard catalog, margin tiers and keyring line
    pub fn standard() -> Self {
        Self {
            catalog: MaterialCatalog::standard(),
            policy: MarginPolicy::default(),
            rules: VendorMatchRules::standard(),
            fixed_product: FixedProduct::default(),
        }
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &MarginPolicy {
        &self.policy
    }

    pub fn match_rules(&self) -> &VendorMatchRules {
        &self.rules
    }

    pub fn fixed_product(&self) -> &FixedProduct {
        &self.fixed_product
    }

    pub fn material(&self, material_id: &str) -> Option<&MaterialSpec> {
        self.catalog.get(material_id)
    }

    /// Check a height against the material's build limits.
    ///
    /// Only an oversized request comes back with a clamp suggestion; an
    /// undersized one must be fixed by the customer.
    pub fn validate_size(&self, material_id: &str, height_mm: f64) -> SizeCheck {
        let Some(material) = self.catalog.get(material_id) else {
            return SizeCheck::rejected("Unknown material".to_string(), None);
        };

        if !height_mm.is_finite() {
            return SizeCheck::rejected("Size must be a number of millimetres".to_string(), None);
        }

        if height_mm < material.min_size_mm {
            return SizeCheck::rejected(
                format!("Minimum size for {} is {}mm", material.name, material.min_size_mm),
                None,
            );
        }
        if height_mm > material.max_size_mm {
            return SizeCheck::rejected(
                format!("Maximum size for {} is {}mm", material.name, material.max_size_mm),
                Some(material.max_size_mm),
            );
        }
        SizeCheck::ok()
    }

    /// Volumetric estimate with the profit floor applied.
    ///
    /// Returns `None` for an unknown material. An unknown finish prices as 1.0.
    pub fn calculate_price(&self, material_id: &str, height_mm: f64, finish: &str) -> Option<PriceQuote> {
        let material = self.catalog.get(material_id)?;

        let volume_cm3 = estimate_volume_cm3(height_mm);
        let material_cost = volume_cm3 * material.base_price_per_cm3;
        let finish_multiplier = material.finish_multiplier(finish);
        let base_cost = material_cost * finish_multiplier + material.setup_fee;

        let mut quote = self.apply_margin(material_id, base_cost, QuoteSource::Estimate);
        quote.breakdown = Some(EstimateBreakdown {
            volume_cm3,
            material_cost,
            setup_fee: material.setup_fee,
            finish_multiplier,
        });
        Some(quote)
    }

    /// Price of the flat-rate line, independent of any selection
    pub fn calculate_fixed_price(&self) -> PriceQuote {
        let fixed = &self.fixed_product;
        PriceQuote {
            source: QuoteSource::Fixed,
            base_cost: fixed.base_cost,
            markup: fixed.markup,
            total: fixed.base_cost + fixed.markup,
            profit: fixed.markup - self.policy.api_cost_per_order,
            api_cost: self.policy.api_cost_per_order,
            margin_percent: None,
            breakdown: None,
        }
    }

    /// Price from the vendor's cost when a quote matches the material,
    /// otherwise the volumetric estimate.
    ///
    /// The vendor cost only replaces the base cost; margin tier and profit
    /// floor still come from the policy.
    pub fn price_with_vendor_quotes(
        &self,
        material_id: &str,
        height_mm: f64,
        finish: &str,
        quotes: Option<&VendorQuoteSet>,
    ) -> Option<PriceQuote> {
        if !self.catalog.contains(material_id) {
            return None;
        }

        let matched = quotes.and_then(|set| self.rules.find_quote(material_id, set));
        match matched {
            Some(vendor) => {
                debug!(
                    "Matched vendor material {} ({}) at {} for {}",
                    vendor.vendor_material_id, vendor.name, vendor.cost, material_id
                );
                Some(self.apply_margin(material_id, vendor.cost, QuoteSource::VendorQuote))
            }
            None => self.calculate_price(material_id, height_mm, finish),
        }
    }

    fn apply_margin(&self, material_id: &str, base_cost: f64, source: QuoteSource) -> PriceQuote {
        let margin_percent = self.policy.margin_for(material_id);
        let markup = self.policy.markup_for(material_id, base_cost);
        let api_cost = self.policy.api_cost_per_order;

        PriceQuote {
            source,
            base_cost,
            markup,
            total: base_cost + markup,
            profit: markup - api_cost,
            api_cost,
            margin_percent: Some(margin_percent),
            breakdown: None,
        }
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::standard()
    }
}
