use std::sync::Arc;
use std::time::Duration;

use pawprints_shared::VendorQuoteSet;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::vendor::VendorQuoteService;

/// Retry schedule for vendor quote retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePollPolicy {
    /// Wait before the first attempt, while the vendor ingests the model
    pub initial_delay: Duration,
    pub max_attempts: u32,
    /// Wait before every attempt
    pub interval: Duration,
}

impl QuotePollPolicy {
    /// Longest time a poll can take before giving up
    pub fn max_wait(&self) -> Duration {
        self.initial_delay + self.interval * self.max_attempts
    }
}

impl Default for QuotePollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(10),
            max_attempts: 10,
            interval: Duration::from_secs(5),
        }
    }
}

/// How a quote poll ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Ready(VendorQuoteSet),
    /// Every attempt failed; callers price from the estimate from now on
    Exhausted,
    Cancelled,
}

/// Polls a [`VendorQuoteService`] on a bounded schedule
#[derive(Clone)]
pub struct QuotePoller {
    service: Arc<dyn VendorQuoteService>,
    policy: QuotePollPolicy,
}

impl QuotePoller {
    pub fn new(service: Arc<dyn VendorQuoteService>, policy: QuotePollPolicy) -> Self {
        Self { service, policy }
    }

    pub fn policy(&self) -> &QuotePollPolicy {
        &self.policy
    }

    /// Run the poll on the current task until it resolves or `cancel` flips to true
    pub async fn poll(&self, job_id: &str, mut cancel: watch::Receiver<bool>) -> PollOutcome {
        info!(
            "Polling vendor quote for job {} (up to {} attempts, {:?} max)",
            job_id,
            self.policy.max_attempts,
            self.policy.max_wait()
        );

        if !pause(self.policy.initial_delay, &mut cancel).await {
            return PollOutcome::Cancelled;
        }

        for attempt in 1..=self.policy.max_attempts {
            if !pause(self.policy.interval, &mut cancel).await {
                return PollOutcome::Cancelled;
            }
            debug!("Vendor quote attempt {}/{} for job {}", attempt, self.policy.max_attempts, job_id);

            let fetched = tokio::select! {
                biased;
                _ = wait_cancelled(&mut cancel) => return PollOutcome::Cancelled,
                result = self.service.fetch_quote(job_id) => result,
            };

            match fetched {
                Ok(response) => {
                    let reason = response.error.clone();
                    if let Some(quotes) = response.into_quote_set() {
                        info!("Vendor quote for job {} ready with {} materials", job_id, quotes.len());
                        return PollOutcome::Ready(quotes);
                    }
                    debug!(
                        "Vendor quote for job {} not ready: {}",
                        job_id,
                        reason.as_deref().unwrap_or("no materials quoted")
                    );
                }
                Err(e) => warn!("Vendor quote attempt {} for job {} failed: {}", attempt, job_id, e),
            }
        }

        warn!(
            "Vendor quote unavailable for job {} after {} attempts, using estimates",
            job_id, self.policy.max_attempts
        );
        PollOutcome::Exhausted
    }

    /// Run the poll as a background task
    pub fn spawn(&self, job_id: impl Into<String>) -> PollHandle {
        let job_id = job_id.into();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let poller = self.clone();
        let task = tokio::spawn(async move { poller.poll(&job_id, cancel_rx).await });
        PollHandle::new(cancel_tx, task)
    }
}

/// Owner side of a background poll
pub struct PollHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub(crate) fn new(cancel: watch::Sender<bool>, task: JoinHandle<PollOutcome>) -> Self {
        Self { cancel, task }
    }

    /// Ask the poll to stop at its next suspension point
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn outcome(self) -> PollOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Vendor quote task ended abnormally: {}", e);
                PollOutcome::Cancelled
            }
        }
    }
}

/// Resolves once cancellation is requested. A dropped handle detaches the
/// poll rather than cancelling it.
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Sleep unless cancelled first; false means cancelled
async fn pause(duration: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = wait_cancelled(cancel) => false,
        _ = sleep(duration) => true,
    }
}
