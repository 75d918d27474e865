use std::sync::Arc;
use pawprints_catalog::PricingEngine;
use pawprints_core::{QuotePollPolicy, QuotePoller};
use pawprints_order::OrderBook;
use pawprints_store::QuoteBoard;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PricingEngine>,
    pub quotes: Arc<QuoteBoard>,
    /// Waits on `quotes` for vendor answers that have not arrived yet
    pub poller: QuotePoller,
    pub orders: Arc<RwLock<OrderBook>>,
}

impl AppState {
    pub fn new(engine: PricingEngine, poll_policy: QuotePollPolicy) -> Self {
        let quotes = Arc::new(QuoteBoard::new());
        Self {
            engine: Arc::new(engine),
            poller: QuotePoller::new(quotes.clone(), poll_policy),
            quotes,
            orders: Arc::new(RwLock::new(OrderBook::new())),
        }
    }
}
