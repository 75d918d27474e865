use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Where the base cost of a price came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteSource {
    /// Volumetric estimate from the material catalog
    Estimate,
    /// Real cost reported by the print-on-demand vendor
    VendorQuote,
    /// Flat-rate product line
    Fixed,
}

/// Intermediate values of a volumetric estimate, shown to the customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateBreakdown {
    pub volume_cm3: f64,
    pub material_cost: f64,
    pub setup_fee: f64,
    pub finish_multiplier: f64,
}

/// A retail price with everything needed to render it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub source: QuoteSource,
    pub base_cost: f64,
    pub markup: f64,
    pub total: f64,
    /// Markup left after the per-order production/API cost
    pub profit: f64,
    pub api_cost: f64,
    /// None for the fixed-price line, which has no margin tier
    pub margin_percent: Option<f64>,
    /// Present for estimates only
    pub breakdown: Option<EstimateBreakdown>,
}

impl PriceQuote {
    /// True when the price is an approximation rather than a firm figure
    pub fn is_estimate(&self) -> bool {
        self.source == QuoteSource::Estimate
    }

    /// `$123.45 AUD`
    pub fn display_total(&self) -> String {
        format_aud(self.total)
    }

    /// Display total with the `(est.)` marker for estimates
    pub fn display_label(&self) -> String {
        if self.is_estimate() {
            format!("{} (est.)", self.display_total())
        } else {
            self.display_total()
        }
    }
}

pub fn format_aud(amount: f64) -> String {
    format!("${:.2} AUD", amount)
}

/// Source tag reported by the vendor quote endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VendorSourceTag {
    #[serde(alias = "shapeways")]
    Vendor,
    Estimated,
    Error,
}

/// One material entry as the vendor reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorMaterialQuote {
    pub name: String,
    #[serde(alias = "shapeways_cost")]
    pub cost: f64,
}

/// Vendor materials keyed by vendor material id, in the order the vendor
/// sent them. A repeated id replaces the earlier entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorMaterials {
    entries: Vec<(String, VendorMaterialQuote)>,
}

impl VendorMaterials {
    pub fn insert(&mut self, id: impl Into<String>, quote: VendorMaterialQuote) {
        let id = id.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = quote,
            None => self.entries.push((id, quote)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&VendorMaterialQuote> {
        self.entries.iter().find(|(existing, _)| existing == id).map(|(_, q)| q)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VendorMaterialQuote)> {
        self.entries.iter().map(|(id, q)| (id.as_str(), q))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, VendorMaterialQuote)> for VendorMaterials {
    fn from_iter<I: IntoIterator<Item = (K, VendorMaterialQuote)>>(iter: I) -> Self {
        let mut materials = Self::default();
        for (id, quote) in iter {
            materials.insert(id, quote);
        }
        materials
    }
}

impl Serialize for VendorMaterials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, quote) in &self.entries {
            map.serialize_entry(id, quote)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VendorMaterials {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MaterialsVisitor;

        impl<'de> Visitor<'de> for MaterialsVisitor {
            type Value = VendorMaterials;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of vendor material id to quote")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut materials = VendorMaterials::default();
                while let Some((id, quote)) = access.next_entry::<String, VendorMaterialQuote>()? {
                    materials.insert(id, quote);
                }
                Ok(materials)
            }
        }

        deserializer.deserialize_map(MaterialsVisitor)
    }
}

/// Integer ids in canonical form, e.g. `6` but not `06`
fn numeric_id(id: &str) -> Option<u64> {
    id.parse::<u64>().ok().filter(|n| n.to_string() == id)
}

/// Response body of the vendor quote endpoint for one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorQuoteResponse {
    pub source: VendorSourceTag,
    #[serde(default, alias = "all_materials")]
    pub materials: VendorMaterials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VendorQuoteResponse {
    pub fn pending(reason: impl Into<String>) -> Self {
        Self {
            source: VendorSourceTag::Estimated,
            materials: VendorMaterials::default(),
            error: Some(reason.into()),
        }
    }

    /// The quotes carried by this response, if it is a usable vendor answer.
    ///
    /// A response counts only when it is tagged as a vendor response and
    /// carries at least one material.
    pub fn into_quote_set(self) -> Option<VendorQuoteSet> {
        if self.source != VendorSourceTag::Vendor || self.materials.is_empty() {
            return None;
        }
        Some(VendorQuoteSet::from(self.materials))
    }
}

/// A single vendor price for one vendor material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorQuote {
    pub vendor_material_id: String,
    pub name: String,
    pub cost: f64,
}

/// Ordered set of vendor quotes for one generated model.
///
/// Order matters: reconciliation takes the first matching entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorQuoteSet {
    quotes: Vec<VendorQuote>,
}

impl VendorQuoteSet {
    pub fn new(quotes: Vec<VendorQuote>) -> Self {
        Self { quotes }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VendorQuote> {
        self.quotes.iter()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Integer ids come first in ascending numeric order, any other ids follow
/// in the order the vendor sent them
impl From<VendorMaterials> for VendorQuoteSet {
    fn from(materials: VendorMaterials) -> Self {
        let mut quotes: Vec<VendorQuote> = materials
            .entries
            .into_iter()
            .map(|(vendor_material_id, q)| VendorQuote {
                vendor_material_id,
                name: q.name,
                cost: q.cost,
            })
            .collect();
        // Stable, so non-numeric ids keep arrival order
        quotes.sort_by_key(|q| match numeric_id(&q.vendor_material_id) {
            Some(n) => (0, n),
            None => (1, 0),
        });
        Self { quotes }
    }
}
