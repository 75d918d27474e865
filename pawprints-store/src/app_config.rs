use pawprints_catalog::{
    CatalogError, FixedProduct, MarginPolicy, MaterialCatalog, MaterialSpec, PricingEngine,
    VendorMatchRules,
};
use pawprints_core::QuotePollPolicy;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub pricing: PricingSettings,
    pub quote_polling: QuotePollingConfig,
    /// Replaces the standard catalog when present
    #[serde(default)]
    pub materials: Option<Vec<MaterialSpec>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingSettings {
    pub api_cost_per_order: f64,
    pub min_profit: f64,
    #[serde(default = "default_margin")]
    pub default_margin: f64,
    #[serde(default)]
    pub margin_tiers: HashMap<String, f64>,
    #[serde(default)]
    pub fixed_product: Option<FixedProduct>,
}

fn default_margin() -> f64 { 0.65 }

#[derive(Debug, Deserialize, Clone)]
pub struct QuotePollingConfig {
    pub initial_delay_secs: u64,
    pub max_attempts: u32,
    pub interval_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `PAWPRINTS__PRICING__MIN_PROFIT=25`
            .add_source(config::Environment::with_prefix("PAWPRINTS").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a single TOML document, without the layered sources
    pub fn from_toml(contents: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn margin_policy(&self) -> MarginPolicy {
        MarginPolicy {
            margin_tiers: self.pricing.margin_tiers.clone(),
            default_margin: self.pricing.default_margin,
            api_cost_per_order: self.pricing.api_cost_per_order,
            min_profit: self.pricing.min_profit,
        }
    }

    pub fn catalog(&self) -> Result<MaterialCatalog, CatalogError> {
        match &self.materials {
            Some(materials) => MaterialCatalog::new(materials.clone()),
            None => Ok(MaterialCatalog::standard()),
        }
    }

    pub fn pricing_engine(&self) -> Result<PricingEngine, CatalogError> {
        PricingEngine::new(
            self.catalog()?,
            self.margin_policy(),
            VendorMatchRules::standard(),
            self.pricing.fixed_product.clone().unwrap_or_default(),
        )
    }

    pub fn poll_policy(&self) -> QuotePollPolicy {
        QuotePollPolicy {
            initial_delay: Duration::from_secs(self.quote_polling.initial_delay_secs),
            max_attempts: self.quote_polling.max_attempts,
            interval: Duration::from_secs(self.quote_polling.interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_TOML: &str = include_str!("../../config/default.toml");

    #[test]
    fn test_default_config_matches_standard_engine() {
        let config = Config::from_toml(DEFAULT_TOML).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.margin_policy(), MarginPolicy::default());
        assert_eq!(config.poll_policy(), QuotePollPolicy::default());

        let engine = config.pricing_engine().unwrap();
        let standard = PricingEngine::standard();
        assert_eq!(
            engine.calculate_price("sla", 120.0, "Coated"),
            standard.calculate_price("sla", 120.0, "Coated")
        );
        assert_eq!(engine.calculate_fixed_price(), standard.calculate_fixed_price());
    }

    #[test]
    fn test_material_override() {
        let toml = r#"
            [server]
            port = 9000

            [pricing]
            api_cost_per_order = 4.0
            min_profit = 15.0

            [quote_polling]
            initial_delay_secs = 2
            max_attempts = 3
            interval_secs = 1

            [pricing.fixed_product]
            name = "Charm"
            material_id = "resin"
            height_mm = 30.0
            base_cost = 40.0
            markup = 35.0

            [[materials]]
            id = "resin"
            name = "Tough Resin"
            min_size_mm = 15.0
            max_size_mm = 180.0
            min_wall_mm = 1.5
            base_price_per_cm3 = 0.9
            setup_fee = 6.0

            [[materials.finishes]]
            name = "Natural"
            multiplier = 1.0
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.poll_policy().max_wait(), Duration::from_secs(5));

        let engine = config.pricing_engine().unwrap();
        assert_eq!(engine.catalog().len(), 1);
        assert!(engine.material("abs").is_none());

        let quote = engine.calculate_price("resin", 100.0, "Natural").unwrap();
        assert_eq!(quote.margin_percent, Some(0.65));
        assert!(quote.markup >= 19.0);
        assert_eq!(engine.calculate_fixed_price().total, 75.0);
        assert_eq!(engine.calculate_fixed_price().profit, 31.0);
    }

    #[test]
    fn test_invalid_material_is_rejected() {
        let toml = r#"
            [server]
            port = 9000

            [pricing]
            api_cost_per_order = 5.0
            min_profit = 20.0

            [quote_polling]
            initial_delay_secs = 10
            max_attempts = 10
            interval_secs = 5

            [[materials]]
            id = "bronze"
            name = "Lost Wax Bronze"
            min_size_mm = 200.0
            max_size_mm = 150.0
            min_wall_mm = 3.0
            base_price_per_cm3 = 6.0
            setup_fee = 25.0

            [[materials.finishes]]
            name = "Raw"
            multiplier = 1.0
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert!(matches!(config.pricing_engine(), Err(CatalogError::InvalidMaterial { .. })));
    }
}
