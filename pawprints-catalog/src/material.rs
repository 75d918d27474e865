use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display-only data for a finish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishInfo {
    pub description: String,
    pub color: String,
}

/// A surface treatment offered within a material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finish {
    pub name: String,
    /// Cost multiplier applied to the material cost, never below 1.0
    pub multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<FinishInfo>,
}

impl Finish {
    pub fn new(name: &str, multiplier: f64) -> Self {
        Self {
            name: name.to_string(),
            multiplier,
            info: None,
        }
    }

    pub fn with_info(mut self, description: &str, color: &str) -> Self {
        self.info = Some(FinishInfo {
            description: description.to_string(),
            color: color.to_string(),
        });
        self
    }
}

/// A colour swatch. `hex` is `rainbow` for full-colour prints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorOption {
    pub name: String,
    pub hex: String,
}

impl ColorOption {
    fn new(name: &str, hex: &str) -> Self {
        Self {
            name: name.to_string(),
            hex: hex.to_string(),
        }
    }
}

/// Manufacturing constraints and cost model of one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    /// Price band badge shown in the picker (`$`, `$$`, `$$$`)
    #[serde(default)]
    pub tier: String,
    pub min_size_mm: f64,
    /// Bounding-box limit of the vendor's build volume
    pub max_size_mm: f64,
    /// Informational only, wall thickness is not checked numerically
    pub min_wall_mm: f64,
    pub base_price_per_cm3: f64,
    pub setup_fee: f64,
    #[serde(default)]
    pub colors: Vec<ColorOption>,
    /// Ordered; the first entry is the default finish
    pub finishes: Vec<Finish>,
}

impl MaterialSpec {
    /// Multiplier for a finish name, 1.0 when the finish is not offered
    pub fn finish_multiplier(&self, finish: &str) -> f64 {
        self.finishes
            .iter()
            .find(|f| f.name == finish)
            .map(|f| f.multiplier)
            .unwrap_or(1.0)
    }

    pub fn default_finish(&self) -> Option<&Finish> {
        self.finishes.first()
    }

    pub fn default_color(&self) -> Option<&ColorOption> {
        self.colors.first()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::InvalidMaterial {
                id: self.id.clone(),
                reason: "material id is empty".to_string(),
            });
        }
        if !(self.min_size_mm > 0.0 && self.min_size_mm <= self.max_size_mm) {
            return Err(CatalogError::InvalidMaterial {
                id: self.id.clone(),
                reason: format!(
                    "size range {}..{}mm is not a positive interval",
                    self.min_size_mm, self.max_size_mm
                ),
            });
        }
        if self.base_price_per_cm3 < 0.0 || self.setup_fee < 0.0 {
            return Err(CatalogError::InvalidMaterial {
                id: self.id.clone(),
                reason: "prices must not be negative".to_string(),
            });
        }
        if self.finishes.is_empty() {
            return Err(CatalogError::InvalidMaterial {
                id: self.id.clone(),
                reason: "at least one finish is required".to_string(),
            });
        }
        if let Some(finish) = self.finishes.iter().find(|f| !(f.multiplier >= 1.0)) {
            return Err(CatalogError::InvalidMaterial {
                id: self.id.clone(),
                reason: format!(
                    "finish {} has multiplier {} below 1.0",
                    finish.name, finish.multiplier
                ),
            });
        }
        Ok(())
    }
}

/// Immutable registry of materials, kept in presentation order
#[derive(Debug, Clone)]
pub struct MaterialCatalog {
    materials: Vec<MaterialSpec>,
    index: HashMap<String, usize>,
}

impl MaterialCatalog {
    pub fn new(materials: Vec<MaterialSpec>) -> Result<Self, CatalogError> {
        if materials.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(materials.len());
        for (i, material) in materials.iter().enumerate() {
            material.validate()?;
            if index.insert(material.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateMaterial(material.id.clone()));
            }
        }

        Ok(Self { materials, index })
    }

    /// The production catalog: ABS plastic, full colour sandstone and cast bronze
    pub fn standard() -> Self {
        let materials = vec![
            MaterialSpec {
                id: "abs".to_string(),
                name: "ABS Plastic".to_string(),
                tagline: "Durable & lightweight".to_string(),
                description: "High-resolution FDM/FFF print. Durable, great for display.".to_string(),
                tier: "$".to_string(),
                min_size_mm: 10.0,
                max_size_mm: 300.0,
                min_wall_mm: 1.0,
                base_price_per_cm3: 0.28,
                setup_fee: 5.00,
                colors: vec![
                    ColorOption::new("White", "#F5F5F0"),
                    ColorOption::new("Black", "#1A1A1A"),
                    ColorOption::new("Red", "#CC3333"),
                    ColorOption::new("Blue", "#3366CC"),
                    ColorOption::new("Green", "#339966"),
                ],
                finishes: vec![
                    Finish::new("Standard", 1.0),
                    Finish::new("Polished", 1.2),
                    Finish::new("Matte", 1.1),
                ],
            },
            MaterialSpec {
                id: "sla".to_string(),
                name: "Full Colour Sandstone".to_string(),
                tagline: "Stone-like with full colour".to_string(),
                description: "Binder jet / SLA with stone-like texture. Supports full RGB colour.".to_string(),
                tier: "$$".to_string(),
                min_size_mm: 15.0,
                max_size_mm: 200.0,
                min_wall_mm: 2.0,
                base_price_per_cm3: 0.75,
                setup_fee: 8.00,
                colors: vec![
                    ColorOption::new("Full Colour", "rainbow"),
                    ColorOption::new("Sandstone", "#D4A373"),
                    ColorOption::new("Charcoal", "#3D3D3D"),
                    ColorOption::new("Terracotta", "#C45E3A"),
                    ColorOption::new("Sage", "#8FBC8F"),
                ],
                finishes: vec![
                    Finish::new("Natural", 1.0),
                    Finish::new("Coated", 1.15),
                    Finish::new("Polished", 1.3),
                ],
            },
            MaterialSpec {
                id: "bronze".to_string(),
                name: "Lost Wax Bronze".to_string(),
                tagline: "Heirloom quality".to_string(),
                description: "Investment cast bronze via lost wax method. True metal, lifetime keepsake.".to_string(),
                tier: "$$$".to_string(),
                min_size_mm: 20.0,
                max_size_mm: 150.0,
                min_wall_mm: 3.0,
                base_price_per_cm3: 6.00,
                setup_fee: 25.00,
                colors: vec![ColorOption::new("Bronze", "#CD7F32")],
                finishes: vec![
                    Finish::new("Raw", 1.0).with_info(
                        "Natural cast finish with subtle texture. Warm, authentic look.",
                        "#B87333",
                    ),
                    Finish::new("Satin", 1.15).with_info(
                        "Smooth, brushed surface with a soft sheen. Elegant and understated.",
                        "#D4956A",
                    ),
                    Finish::new("Polished", 1.3).with_info(
                        "Mirror-like high shine. Bright, reflective, premium feel.",
                        "#E8B86D",
                    ),
                    Finish::new("Patina", 1.2).with_info(
                        "Aged green-brown finish. Classic antique bronze character.",
                        "#4A6741",
                    ),
                ],
            },
        ];

        let index = materials
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();
        Self { materials, index }
    }

    pub fn get(&self, id: &str) -> Option<&MaterialSpec> {
        self.index.get(id).map(|&i| &self.materials[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialSpec> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Material catalog is empty")]
    Empty,

    #[error("Duplicate material id: {0}")]
    DuplicateMaterial(String),

    #[error("Invalid material {id}: {reason}")]
    InvalidMaterial { id: String, reason: String },

    #[error("Invalid margin policy: {0}")]
    InvalidPolicy(String),
}
