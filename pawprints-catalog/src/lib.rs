pub mod material;
pub mod pricing;
pub mod reconcile;

pub use material::{CatalogError, ColorOption, Finish, FinishInfo, MaterialCatalog, MaterialSpec};
pub use pricing::{estimate_volume_cm3, FixedProduct, MarginPolicy, PricingEngine, SizeCheck};
pub use reconcile::{MatchRule, VendorMatchRules};
