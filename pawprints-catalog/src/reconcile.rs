use pawprints_shared::{VendorQuote, VendorQuoteSet};
use serde::{Deserialize, Serialize};

/// Maps vendor material names onto one internal material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRule {
    pub material_id: String,
    /// Lower-case substrings; any hit counts as a match
    pub keywords: Vec<String>,
}

impl MatchRule {
    pub fn new(material_id: &str, keywords: &[&str]) -> Self {
        Self {
            material_id: material_id.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, vendor_name: &str) -> bool {
        let name = vendor_name.to_lowercase();
        self.keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

/// Ordered vendor-name matching rules. Evaluation is first-match-wins in list
/// order, so a vendor name hitting several rules resolves to the earliest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorMatchRules {
    rules: Vec<MatchRule>,
}

impl VendorMatchRules {
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self { rules }
    }

    /// Priority: bronze, sandstone, plastic
    pub fn standard() -> Self {
        Self::new(vec![
            MatchRule::new("bronze", &["bronze"]),
            MatchRule::new("sla", &["sandstone", "full color"]),
            MatchRule::new("abs", &["plastic", "nylon", "versatile"]),
        ])
    }

    pub fn rule_for(&self, material_id: &str) -> Option<&MatchRule> {
        self.rules.iter().find(|r| r.material_id == material_id)
    }

    /// Internal material a vendor name belongs to, by rule priority
    pub fn classify(&self, vendor_name: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.matches(vendor_name))
            .map(|r| r.material_id.as_str())
    }

    /// First usable quote in the set that matches the selected material.
    ///
    /// Quotes with a non-positive or non-finite cost are skipped.
    pub fn find_quote<'a>(
        &self,
        material_id: &str,
        quotes: &'a VendorQuoteSet,
    ) -> Option<&'a VendorQuote> {
        let rule = self.rule_for(material_id)?;
        quotes
            .iter()
            .filter(|q| q.cost.is_finite() && q.cost > 0.0)
            .find(|q| rule.matches(&q.name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchRule> {
        self.rules.iter()
    }
}

impl Default for VendorMatchRules {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawprints_shared::VendorQuoteResponse;

    fn quote(id: &str, name: &str, cost: f64) -> VendorQuote {
        VendorQuote {
            vendor_material_id: id.to_string(),
            name: name.to_string(),
            cost,
        }
    }

    #[test]
    fn test_case_insensitive_keywords() {
        let rules = VendorMatchRules::standard();
        let set = VendorQuoteSet::new(vec![
            quote("6", "White Versatile Plastic", 18.0),
            quote("85", "Bronze 18k", 200.0),
            quote("26", "FULL COLOR Sandstone", 40.0),
        ]);

        assert_eq!(rules.find_quote("bronze", &set).unwrap().cost, 200.0);
        assert_eq!(rules.find_quote("sla", &set).unwrap().cost, 40.0);
        assert_eq!(rules.find_quote("abs", &set).unwrap().cost, 18.0);
        assert!(rules.find_quote("resin", &set).is_none());
    }

    #[test]
    fn test_first_quote_in_set_order_wins() {
        let rules = VendorMatchRules::standard();
        let set = VendorQuoteSet::new(vec![
            quote("85", "Raw Bronze", 210.0),
            quote("86", "Polished Bronze", 260.0),
        ]);
        assert_eq!(rules.find_quote("bronze", &set).unwrap().vendor_material_id, "85");
    }

    #[test]
    fn test_vendor_ids_compare_numerically() {
        let rules = VendorMatchRules::standard();
        let response: VendorQuoteResponse = serde_json::from_str(
            r#"{
                "source": "shapeways",
                "all_materials": {
                    "100": { "name": "Premium Plastic", "shapeways_cost": 40.0 },
                    "6": { "name": "White Versatile Plastic", "shapeways_cost": 18.0 }
                }
            }"#,
        )
        .unwrap();
        let set = response.into_quote_set().unwrap();

        let matched = rules.find_quote("abs", &set).unwrap();
        assert_eq!(matched.vendor_material_id, "6");
        assert_eq!(matched.cost, 18.0);
    }

    #[test]
    fn test_skips_malformed_costs() {
        let rules = VendorMatchRules::standard();
        let set = VendorQuoteSet::new(vec![
            quote("6", "Strong & Flexible Nylon", 0.0),
            quote("7", "Versatile Plastic", f64::NAN),
            quote("62", "Metallic Plastic", 22.5),
        ]);
        assert_eq!(rules.find_quote("abs", &set).unwrap().vendor_material_id, "62");
    }

    #[test]
    fn test_classify_ambiguous_name_uses_priority() {
        let rules = VendorMatchRules::standard();
        assert_eq!(rules.classify("Bronze-filled Plastic"), Some("bronze"));
        assert_eq!(rules.classify("Nylon 12"), Some("abs"));
        assert_eq!(rules.classify("Stainless Steel"), None);
    }
}
