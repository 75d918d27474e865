use std::sync::Arc;

use pawprints_catalog::{PricingEngine, SizeCheck};
use pawprints_shared::{PriceQuote, VendorQuoteSet};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use crate::polling::{PollHandle, PollOutcome, QuotePoller};
use crate::{CoreError, CoreResult};

/// Default statue material and height when the customise screen opens
const DEFAULT_STATUE_MATERIAL: &str = "abs";
const DEFAULT_STATUE_HEIGHT_MM: f64 = 150.0;

/// What the customer is buying
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductLine {
    /// Free choice of material, size and finish
    Statue,
    /// Flat-rate line locked to one material and size
    Keyring,
}

impl ProductLine {
    pub fn label(&self) -> &'static str {
        match self {
            ProductLine::Statue => "Statue",
            ProductLine::Keyring => "Keyring",
        }
    }
}

/// Current customer choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub product: ProductLine,
    pub material_id: String,
    pub height_mm: f64,
    pub finish: String,
    pub color: Option<String>,
}

impl Selection {
    /// Price this selection, using vendor quotes when one matches
    pub fn price(&self, engine: &PricingEngine, quotes: Option<&VendorQuoteSet>) -> Option<PriceQuote> {
        match self.product {
            ProductLine::Keyring => Some(engine.calculate_fixed_price()),
            ProductLine::Statue => engine.price_with_vendor_quotes(
                &self.material_id,
                self.height_mm,
                &self.finish,
                quotes,
            ),
        }
    }
}

/// State of the continue-to-order action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAction {
    /// Disabled until a quote is loaded and positive
    RetrievingQuote,
    Continue { label: String },
}

impl OrderAction {
    pub fn is_enabled(&self) -> bool {
        matches!(self, OrderAction::Continue { .. })
    }
}

/// A priced selection ready to be turned into an order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkout {
    pub selection: Selection,
    pub material_name: String,
    pub price: PriceQuote,
}

impl Checkout {
    /// Price a selection for ordering; refuses unknown materials and
    /// non-positive totals
    pub fn new(
        engine: &PricingEngine,
        selection: Selection,
        quotes: Option<&VendorQuoteSet>,
    ) -> CoreResult<Self> {
        let material_name = engine
            .material(&selection.material_id)
            .map(|m| m.name.clone())
            .ok_or_else(|| CoreError::UnknownMaterial(selection.material_id.clone()))?;
        let price = selection
            .price(engine, quotes)
            .ok_or_else(|| CoreError::UnknownMaterial(selection.material_id.clone()))?;
        if price.total <= 0.0 {
            return Err(CoreError::PriceNotReady(format!("total {} is not positive", price.total)));
        }

        Ok(Self { selection, material_name, price })
    }
}

#[derive(Debug)]
struct QuoteState {
    /// Bumped by every new poll; only the matching poll may write
    generation: u64,
    loaded: bool,
    vendor_quotes: Option<VendorQuoteSet>,
}

/// Price-relevant state of the customise screen.
///
/// Owns the selection and the latest vendor quote. Each call to
/// [`Configurator::start_quote_fetch`] supersedes the previous poll.
pub struct Configurator {
    engine: Arc<PricingEngine>,
    poller: QuotePoller,
    selection: Selection,
    quote: Arc<RwLock<QuoteState>>,
    active_poll: Option<PollHandle>,
}

impl Configurator {
    pub fn new(engine: Arc<PricingEngine>, poller: QuotePoller, product: ProductLine) -> CoreResult<Self> {
        let selection = match product {
            ProductLine::Keyring => {
                let fixed = engine.fixed_product();
                let material = engine
                    .material(&fixed.material_id)
                    .ok_or_else(|| CoreError::UnknownMaterial(fixed.material_id.clone()))?;
                Selection {
                    product,
                    material_id: material.id.clone(),
                    height_mm: fixed.height_mm,
                    finish: material.default_finish().map(|f| f.name.clone()).unwrap_or_default(),
                    color: material.default_color().map(|c| c.name.clone()),
                }
            }
            ProductLine::Statue => {
                let material = engine
                    .material(DEFAULT_STATUE_MATERIAL)
                    .or_else(|| engine.catalog().iter().next())
                    .ok_or_else(|| CoreError::UnknownMaterial(DEFAULT_STATUE_MATERIAL.to_string()))?;
                Selection {
                    product,
                    material_id: material.id.clone(),
                    height_mm: DEFAULT_STATUE_HEIGHT_MM.clamp(material.min_size_mm, material.max_size_mm),
                    finish: material.default_finish().map(|f| f.name.clone()).unwrap_or_default(),
                    color: material.default_color().map(|c| c.name.clone()),
                }
            }
        };

        Ok(Self {
            engine,
            poller,
            selection,
            quote: Arc::new(RwLock::new(QuoteState {
                generation: 0,
                loaded: true,
                vendor_quotes: None,
            })),
            active_poll: None,
        })
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    fn ensure_unlocked(&self) -> CoreResult<()> {
        if self.selection.product == ProductLine::Keyring {
            return Err(CoreError::SelectionLocked(self.selection.product.label().to_string()));
        }
        Ok(())
    }

    /// Switch material. Finish and colour reset to the material's defaults and
    /// an oversized height is clamped to the new limit.
    pub fn select_material(&mut self, material_id: &str) -> CoreResult<SizeCheck> {
        self.ensure_unlocked()?;
        let material = self
            .engine
            .material(material_id)
            .ok_or_else(|| CoreError::UnknownMaterial(material_id.to_string()))?;

        self.selection.material_id = material.id.clone();
        self.selection.finish = material.default_finish().map(|f| f.name.clone()).unwrap_or_default();
        self.selection.color = material.default_color().map(|c| c.name.clone());

        Ok(self.apply_height(self.selection.height_mm))
    }

    /// Change height. Oversized requests are clamped to the material maximum;
    /// undersized ones are kept and reported invalid.
    pub fn set_height(&mut self, height_mm: f64) -> CoreResult<SizeCheck> {
        self.ensure_unlocked()?;
        Ok(self.apply_height(height_mm))
    }

    fn apply_height(&mut self, height_mm: f64) -> SizeCheck {
        let check = self.engine.validate_size(&self.selection.material_id, height_mm);
        self.selection.height_mm = check.clamped.unwrap_or(height_mm);
        check
    }

    pub fn select_finish(&mut self, finish: &str) {
        self.selection.finish = finish.to_string();
    }

    pub fn select_color(&mut self, color: &str) {
        self.selection.color = Some(color.to_string());
    }

    pub fn validate_size(&self) -> SizeCheck {
        self.engine
            .validate_size(&self.selection.material_id, self.selection.height_mm)
    }

    /// Start polling vendor quotes for a freshly generated model.
    ///
    /// Any earlier poll is cancelled and its late result ignored. Fixed-price
    /// lines never poll. Returns the generation of the new poll.
    pub async fn start_quote_fetch(&mut self, job_id: &str) -> Option<u64> {
        if self.selection.product == ProductLine::Keyring {
            return None;
        }
        if let Some(previous) = self.active_poll.take() {
            previous.cancel();
        }

        let generation = {
            let mut state = self.quote.write().await;
            state.generation += 1;
            state.loaded = false;
            state.vendor_quotes = None;
            state.generation
        };
        info!("Starting vendor quote poll #{} for job {}", generation, job_id);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let poller = self.poller.clone();
        let state = self.quote.clone();
        let job_id = job_id.to_string();
        let task = tokio::spawn(async move {
            let outcome = poller.poll(&job_id, cancel_rx).await;
            apply_outcome(&state, generation, &outcome).await;
            outcome
        });

        self.active_poll = Some(PollHandle::new(cancel_tx, task));
        Some(generation)
    }

    /// Stop the current poll and fall back to the estimate
    pub async fn cancel_quote_fetch(&mut self) {
        if let Some(handle) = self.active_poll.take() {
            handle.cancel();
            let mut state = self.quote.write().await;
            state.generation += 1;
            state.loaded = true;
        }
    }

    /// Wait for the current poll, if any, to finish
    pub async fn wait_for_quote(&mut self) -> Option<PollOutcome> {
        let handle = self.active_poll.take()?;
        Some(handle.outcome().await)
    }

    pub async fn quote_loaded(&self) -> bool {
        self.quote.read().await.loaded
    }

    /// Price of the current selection; `None` when the material is unknown
    pub async fn current_price(&self) -> Option<PriceQuote> {
        let state = self.quote.read().await;
        self.selection.price(&self.engine, state.vendor_quotes.as_ref())
    }

    pub async fn order_action(&self) -> OrderAction {
        match self.ready_price().await {
            Ok(price) => OrderAction::Continue {
                label: format!("Continue · {}", price.display_label()),
            },
            Err(_) => OrderAction::RetrievingQuote,
        }
    }

    /// Snapshot for the order screen, refused while the action is disabled
    pub async fn checkout(&self) -> CoreResult<Checkout> {
        if !self.quote_loaded().await {
            return Err(CoreError::PriceNotReady("vendor quote still loading".to_string()));
        }
        let state = self.quote.read().await;
        Checkout::new(&self.engine, self.selection.clone(), state.vendor_quotes.as_ref())
    }

    async fn ready_price(&self) -> CoreResult<PriceQuote> {
        if !self.quote_loaded().await {
            return Err(CoreError::PriceNotReady("vendor quote still loading".to_string()));
        }
        let price = self
            .current_price()
            .await
            .ok_or_else(|| CoreError::UnknownMaterial(self.selection.material_id.clone()))?;
        if price.total <= 0.0 {
            return Err(CoreError::PriceNotReady(format!("total {} is not positive", price.total)));
        }
        Ok(price)
    }
}

impl Drop for Configurator {
    fn drop(&mut self) {
        if let Some(handle) = self.active_poll.take() {
            handle.cancel();
        }
    }
}

async fn apply_outcome(state: &RwLock<QuoteState>, generation: u64, outcome: &PollOutcome) {
    let mut state = state.write().await;
    if state.generation != generation {
        debug!("Discarding result of superseded quote poll #{}", generation);
        return;
    }

    match outcome {
        PollOutcome::Ready(quotes) => {
            state.vendor_quotes = Some(quotes.clone());
            state.loaded = true;
        }
        // No automatic resumption: the estimate stands for this session
        PollOutcome::Exhausted => state.loaded = true,
        PollOutcome::Cancelled => {}
    }
}
