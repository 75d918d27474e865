pub mod manager;
pub mod models;

pub use manager::{OrderBook, OrderError};
pub use models::{OrderRecord, OrderStatus};
