use crate::models::{base36, OrderRecord, OrderStatus};
use chrono::{DateTime, Utc};
use pawprints_core::Checkout;
use std::collections::HashMap;
use tracing::info;

/// In-memory order history. Payment is simulated: every placed order starts
/// in `Processing`.
pub struct OrderBook {
    orders: HashMap<String, OrderRecord>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
        }
    }

    /// Record an order for a checked-out selection
    pub fn place_order(&mut self, checkout: &Checkout) -> Result<OrderRecord, OrderError> {
        self.place_order_at(checkout, Utc::now())
    }

    pub fn place_order_at(&mut self, checkout: &Checkout, now: DateTime<Utc>) -> Result<OrderRecord, OrderError> {
        if !(checkout.price.total > 0.0) {
            return Err(OrderError::InvalidPrice(checkout.price.total));
        }

        let id = self.next_id(now);
        let order = OrderRecord::from_checkout(id, checkout, now);
        info!(
            "Order {} placed: {} {} {} at {}",
            order.id,
            order.product.label(),
            order.material,
            order.size,
            order.price
        );

        self.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    pub fn get_order(&self, order_id: &str) -> Option<&OrderRecord> {
        self.orders.get(order_id)
    }

    /// All orders, newest first
    pub fn list_orders(&self) -> Vec<OrderRecord> {
        let mut orders: Vec<OrderRecord> = self.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// `PP-` + base-36 millisecond timestamp, bumped past any id already taken
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let mut millis = now.timestamp_millis().max(0) as u64;
        loop {
            let id = format!("PP-{}", base36(millis));
            if !self.orders.contains_key(&id) {
                return id;
            }
            millis += 1;
        }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Cannot place an order with total {0}")]
    InvalidPrice(f64),
}
