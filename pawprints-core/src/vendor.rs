use async_trait::async_trait;
use pawprints_shared::VendorQuoteResponse;

#[derive(Debug, thiserror::Error)]
pub enum QuoteServiceError {
    #[error("Vendor quote request failed: {0}")]
    Transport(String),
    #[error("Malformed vendor quote: {0}")]
    Malformed(String),
}

/// Print-on-demand vendor pricing for a generated model
#[async_trait]
pub trait VendorQuoteService: Send + Sync {
    /// Fetch the vendor's current answer for a generation job.
    ///
    /// A response that is not yet usable (still processing) is an `Ok`
    /// value; `Err` is reserved for failed requests and vendor answers that
    /// cannot be priced.
    async fn fetch_quote(&self, job_id: &str) -> Result<VendorQuoteResponse, QuoteServiceError>;
}
