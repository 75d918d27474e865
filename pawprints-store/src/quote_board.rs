use async_trait::async_trait;
use pawprints_core::{QuoteServiceError, VendorQuoteService};
use pawprints_shared::{VendorQuoteResponse, VendorQuoteSet, VendorSourceTag};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Latest vendor answer per generation job, fed by the vendor webhook
#[derive(Default)]
pub struct QuoteBoard {
    quotes: RwLock<HashMap<String, VendorQuoteResponse>>,
}

impl QuoteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the vendor's answer for a job, replacing any earlier one
    pub async fn publish(&self, job_id: &str, response: VendorQuoteResponse) {
        info!(
            "Vendor quote for job {} recorded ({:?}, {} materials)",
            job_id,
            response.source,
            response.materials.len()
        );
        self.quotes.write().await.insert(job_id.to_string(), response);
    }

    /// Current answer for a job; a pending response when nothing arrived yet
    pub async fn get(&self, job_id: &str) -> VendorQuoteResponse {
        self.quotes
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or_else(|| VendorQuoteResponse::pending("Model not yet uploaded to vendor"))
    }

    /// Usable quotes for a job, if the vendor has answered
    pub async fn quote_set(&self, job_id: &str) -> Option<VendorQuoteSet> {
        self.get(job_id).await.into_quote_set()
    }

    pub async fn forget(&self, job_id: &str) -> bool {
        self.quotes.write().await.remove(job_id).is_some()
    }
}

#[async_trait]
impl VendorQuoteService for QuoteBoard {
    async fn fetch_quote(&self, job_id: &str) -> Result<VendorQuoteResponse, QuoteServiceError> {
        let response = self.get(job_id).await;
        if response.source == VendorSourceTag::Vendor && response.materials.is_empty() {
            return Err(QuoteServiceError::Malformed(format!(
                "vendor answer for job {} lists no materials",
                job_id
            )));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawprints_core::{PollOutcome, QuotePollPolicy, QuotePoller};
    use pawprints_shared::VendorMaterials;
    use std::sync::Arc;
    use std::time::Duration;

    fn bronze_response() -> VendorQuoteResponse {
        serde_json::from_value(serde_json::json!({
            "source": "shapeways",
            "all_materials": { "85": { "name": "Raw Bronze", "shapeways_cost": 212.4 } }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_job_is_pending() {
        let board = QuoteBoard::new();
        let response = board.get("missing").await;
        assert_eq!(response.source, VendorSourceTag::Estimated);
        assert!(response.error.is_some());
        assert!(board.quote_set("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_publish_and_forget() {
        let board = QuoteBoard::new();
        board.publish("job-1", bronze_response()).await;

        let set = board.quote_set("job-1").await.unwrap();
        assert_eq!(set.iter().next().unwrap().cost, 212.4);

        assert!(board.forget("job-1").await);
        assert!(!board.forget("job-1").await);
    }

    #[tokio::test]
    async fn test_vendor_answer_without_materials_is_malformed() {
        let board = QuoteBoard::new();
        let empty = VendorQuoteResponse {
            source: VendorSourceTag::Vendor,
            materials: VendorMaterials::default(),
            error: None,
        };
        board.publish("job-3", empty).await;

        let result = board.fetch_quote("job-3").await;
        assert!(matches!(result, Err(QuoteServiceError::Malformed(_))));

        // Still pending is not an error
        assert!(board.fetch_quote("job-4").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_picks_up_late_publish() {
        let board = Arc::new(QuoteBoard::new());
        let poller = QuotePoller::new(board.clone(), QuotePollPolicy::default());
        let handle = poller.spawn("job-2");

        // Lands between the third (25s) and fourth (30s) attempts
        tokio::time::sleep(Duration::from_secs(27)).await;
        board.publish("job-2", bronze_response()).await;

        match handle.outcome().await {
            PollOutcome::Ready(set) => assert_eq!(set.len(), 1),
            other => panic!("expected ready, got {:?}", other),
        }
    }
}
