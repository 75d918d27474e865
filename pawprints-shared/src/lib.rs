pub mod models;

pub use models::quote::{
    format_aud, EstimateBreakdown, PriceQuote, QuoteSource, VendorMaterialQuote, VendorQuote,
    VendorMaterials, VendorQuoteResponse, VendorQuoteSet, VendorSourceTag,
};
