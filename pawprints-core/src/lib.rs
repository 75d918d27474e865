pub mod configurator;
pub mod polling;
pub mod vendor;

pub use configurator::{Checkout, Configurator, OrderAction, ProductLine, Selection};
pub use polling::{PollHandle, PollOutcome, QuotePollPolicy, QuotePoller};
pub use vendor::{QuoteServiceError, VendorQuoteService};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),
    #[error("Selection is locked for the {0} product line")]
    SelectionLocked(String),
    #[error("Price not ready: {0}")]
    PriceNotReady(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
