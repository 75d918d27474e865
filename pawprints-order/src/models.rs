use chrono::{DateTime, Utc};
use pawprints_core::{Checkout, ProductLine};
use pawprints_shared::QuoteSource;
use serde::{Deserialize, Serialize};

/// Order status. Payment and fulfilment are simulated, so every order stays
/// in `Processing`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Processing,
}

/// A placed order as shown in the customer's order history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// `PP-` followed by the base-36 placement timestamp
    pub id: String,
    pub product: ProductLine,
    pub material_id: String,
    pub material: String,
    /// e.g. `150mm`
    pub size: String,
    pub finish: String,
    pub color: Option<String>,
    pub total: f64,
    /// e.g. `$52.33 AUD`
    pub price: String,
    pub price_source: QuoteSource,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn from_checkout(id: String, checkout: &Checkout, now: DateTime<Utc>) -> Self {
        let selection = &checkout.selection;
        Self {
            id,
            product: selection.product,
            material_id: selection.material_id.clone(),
            material: checkout.material_name.clone(),
            size: format!("{}mm", selection.height_mm),
            finish: selection.finish.clone(),
            color: selection.color.clone(),
            total: checkout.price.total,
            price: checkout.price.display_total(),
            price_source: checkout.price.source,
            status: OrderStatus::Processing,
            created_at: now,
        }
    }
}

/// Base-36 upper-case rendering used for order ids
pub(crate) fn base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(char::from(DIGITS[(value % 36) as usize]));
        value /= 36;
    }
    digits.into_iter().rev().collect()
}
