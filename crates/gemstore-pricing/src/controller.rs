//! Debounced price resolution for a product detail view.
//!
//! [`PriceController`] owns the shopper's [`SelectionState`]. Every selection
//! change bumps a generation counter and (re)arms a trailing-edge debounce
//! timer. When the timer fires the controller asks its [`PriceLookup`] for a
//! quote, falls back to [`FallbackFormula`] when the lookup fails or returns
//! nothing usable, and publishes the outcome on a `watch` channel. Results
//! that come back for an older generation are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gemstore_core::{
    MetalCode, MetalTable, PriceQuote, PriceSource, PricingConfig, ProductPricing,
    RawCaratRecord, SelectionState, DEFAULT_BASE_PRICE,
};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::carat_options::CaratOptionSet;
use crate::client::{PriceLookup, PriceRequest};
use crate::formula::FallbackFormula;
use crate::parse::PriceResponseParser;

/// Where the controller is in its resolution cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ResolutionState {
    /// No carat options, so there is nothing to price.
    Idle,
    /// A selection changed and the debounce timer is armed.
    Debouncing,
    /// A lookup for the current generation is in flight.
    Resolving,
    /// The current selection has a price, from the backend or the fallback.
    Resolved(PriceQuote),
    /// Neither the backend nor the fallback formula produced a usable price.
    Failed(String),
}

/// What the view layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub state: ResolutionState,
    /// Latest quote; flagged stale while a newer selection is pending.
    pub quote: Option<PriceQuote>,
    /// Asserted only while in [`ResolutionState::Resolving`].
    pub loading: bool,
    pub generation: u64,
    pub selection: SelectionState,
}

impl PriceSnapshot {
    fn idle(selection: SelectionState) -> Self {
        Self {
            state: ResolutionState::Idle,
            quote: None,
            loading: false,
            generation: 0,
            selection,
        }
    }
}

/// Tunables for a [`PriceController`].
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub debounce: Duration,
    /// Substituted when the product record has no positive base price.
    pub default_base_price: f64,
    pub formula: FallbackFormula,
    pub parser: PriceResponseParser,
    pub metals: MetalTable,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            default_base_price: DEFAULT_BASE_PRICE,
            formula: FallbackFormula::default(),
            parser: PriceResponseParser::default(),
            metals: MetalTable::default(),
        }
    }
}

impl ControllerSettings {
    #[must_use]
    pub fn from_config(config: &PricingConfig) -> Self {
        Self {
            debounce: config.debounce(),
            default_base_price: config.default_base_price,
            formula: FallbackFormula::new(config.carat_exponent),
            parser: PriceResponseParser::new(config.price_fields.iter().cloned()),
            metals: config.metals.clone(),
        }
    }
}

struct Inner {
    options: CaratOptionSet,
    selection: SelectionState,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    last_quote: Option<PriceQuote>,
}

struct Shared<L> {
    lookup: L,
    settings: ControllerSettings,
    product_id: String,
    base_price: f64,
    inner: Mutex<Inner>,
    tx: watch::Sender<PriceSnapshot>,
}

/// Resolves and publishes the price for one product's current selection.
///
/// Selection methods must be called from within a Tokio runtime; they spawn
/// the debounce timer and the lookup task.
pub struct PriceController<L: PriceLookup> {
    shared: Arc<Shared<L>>,
}

impl<L: PriceLookup> PriceController<L> {
    /// Creates a controller for `product` with the default selection.
    ///
    /// When the product has carat options the default selection is scheduled
    /// for resolution right away, so this must be called from within a Tokio
    /// runtime. Without options the controller stays `Idle`.
    #[must_use]
    pub fn new(lookup: L, product: &ProductPricing, settings: ControllerSettings) -> Self {
        let options = CaratOptionSet::from_records(&product.carats);
        let base_price = product.effective_base_price(settings.default_base_price);
        let selection = SelectionState::default();
        let (tx, _rx) = watch::channel(PriceSnapshot::idle(selection.clone()));

        tracing::debug!(
            product_id = %product.product_id,
            option_count = options.len(),
            base_price,
            "price controller created"
        );

        let shared = Arc::new(Shared {
            lookup,
            settings,
            product_id: product.product_id.clone(),
            base_price,
            inner: Mutex::new(Inner {
                options,
                selection,
                generation: 0,
                timer: None,
                last_quote: None,
            }),
            tx,
        });

        {
            let mut inner = shared.lock();
            if !inner.options.is_empty() {
                Shared::schedule(&shared, &mut inner);
            }
        }

        Self { shared }
    }

    /// Subscribes to published snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PriceSnapshot> {
        self.shared.tx.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> PriceSnapshot {
        self.shared.tx.borrow().clone()
    }

    #[must_use]
    pub fn selection(&self) -> SelectionState {
        self.shared.lock().selection.clone()
    }

    #[must_use]
    pub fn options(&self) -> CaratOptionSet {
        self.shared.lock().options.clone()
    }

    /// Whether the add-to-cart affordance should be enabled: there is
    /// something to buy and its price is settled.
    #[must_use]
    pub fn add_to_cart_enabled(&self) -> bool {
        let snapshot = self.shared.tx.borrow();
        matches!(snapshot.state, ResolutionState::Resolved(_)) && !snapshot.loading
    }

    /// Re-resolves the current selection after the debounce delay.
    pub fn refresh(&self) {
        let mut inner = self.shared.lock();
        Shared::schedule(&self.shared, &mut inner);
    }

    pub fn select_carat(&self, index: usize) {
        let mut inner = self.shared.lock();
        let index = inner.options.clamp_index(index);
        if inner.selection.carat_index == index {
            return;
        }
        inner.selection.carat_index = index;
        Shared::schedule(&self.shared, &mut inner);
    }

    pub fn select_metal(&self, metal: MetalCode) {
        let mut inner = self.shared.lock();
        if inner.selection.metal == metal {
            return;
        }
        inner.selection.metal = metal;
        Shared::schedule(&self.shared, &mut inner);
    }

    pub fn select_color(&self, color: impl Into<String>) {
        let color = color.into();
        let mut inner = self.shared.lock();
        if inner.selection.color == color {
            return;
        }
        inner.selection.color = color;
        Shared::schedule(&self.shared, &mut inner);
    }

    pub fn select_size(&self, size: impl Into<String>) {
        let size = size.into();
        let mut inner = self.shared.lock();
        if inner.selection.size == size {
            return;
        }
        inner.selection.size = size;
        Shared::schedule(&self.shared, &mut inner);
    }

    /// Replaces the carat option set after the raw carat data changed.
    ///
    /// The selected index is clamped into the new set (reset to `0` when the
    /// set is empty) and a recomputation is scheduled.
    pub fn set_carat_records(&self, records: &[RawCaratRecord]) {
        let options = CaratOptionSet::from_records(records);
        let mut inner = self.shared.lock();
        if inner.options == options {
            return;
        }
        inner.selection.carat_index = options.clamp_index(inner.selection.carat_index);
        inner.options = options;
        Shared::schedule(&self.shared, &mut inner);
    }

    /// Resolves the current selection immediately, skipping the debounce
    /// delay, and returns the resulting snapshot.
    ///
    /// Supersedes any pending or in-flight resolution.
    pub async fn resolve_now(&self) -> PriceSnapshot {
        let generation = {
            let mut inner = self.shared.lock();
            inner.generation += 1;
            if let Some(timer) = inner.timer.take() {
                timer.abort();
            }
            inner.generation
        };

        if let Some(request) = Shared::begin_resolution(&self.shared, generation) {
            Shared::resolve(Arc::clone(&self.shared), generation, request).await;
        }
        self.snapshot()
    }
}

impl<L: PriceLookup> Drop for PriceController<L> {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.lock().timer.take() {
            timer.abort();
        }
    }
}

impl<L: PriceLookup> Shared<L> {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner, state: ResolutionState, loading: bool) {
        let quote = match &state {
            ResolutionState::Idle => None,
            ResolutionState::Resolved(quote) => Some(quote.clone()),
            ResolutionState::Debouncing
            | ResolutionState::Resolving
            | ResolutionState::Failed(_) => inner.last_quote.as_ref().map(PriceQuote::stale),
        };
        self.tx.send_replace(PriceSnapshot {
            state,
            quote,
            loading,
            generation: inner.generation,
            selection: inner.selection.clone(),
        });
    }

    /// Starts a new generation and arms the debounce timer for it.
    fn schedule(shared: &Arc<Self>, inner: &mut Inner) {
        inner.generation += 1;
        let generation = inner.generation;

        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }

        if inner.options.is_empty() {
            inner.last_quote = None;
            shared.publish(inner, ResolutionState::Idle, false);
            return;
        }

        shared.publish(inner, ResolutionState::Debouncing, false);

        let debounce = shared.settings.debounce;
        let task_shared = Arc::clone(shared);
        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(request) = Shared::begin_resolution(&task_shared, generation) {
                // Detached so that rescheduling never aborts an in-flight
                // lookup; its result is filtered by generation instead.
                tokio::spawn(Shared::resolve(task_shared, generation, request));
            }
        }));
    }

    /// Moves `generation` into `Resolving` and builds its lookup request.
    ///
    /// Returns `None` if the generation was superseded or there is nothing to
    /// price.
    fn begin_resolution(shared: &Arc<Self>, generation: u64) -> Option<PriceRequest> {
        let mut inner = shared.lock();
        if inner.generation != generation {
            return None;
        }
        inner.timer = None;

        let carat_weight = inner
            .options
            .get(inner.selection.carat_index)
            .map(|option| option.carat_weight);
        let Some(carat_weight) = carat_weight else {
            inner.last_quote = None;
            shared.publish(&inner, ResolutionState::Idle, false);
            return None;
        };

        let request = PriceRequest {
            product_id: shared.product_id.clone(),
            carat_weight,
            selection: inner.selection.clone(),
        };
        shared.publish(&inner, ResolutionState::Resolving, true);
        Some(request)
    }

    /// Looks up the price for `request` and publishes it if `generation` is
    /// still current.
    async fn resolve(shared: Arc<Self>, generation: u64, request: PriceRequest) {
        let remote = match shared.lookup.lookup_price(&request).await {
            Ok(response) => {
                let value = shared.settings.parser.extract(&response);
                if value.is_none() {
                    tracing::warn!(
                        product_id = %request.product_id,
                        carat_weight = request.carat_weight,
                        "pricing response has no usable price field, using fallback formula"
                    );
                }
                value
            }
            Err(e) => {
                tracing::warn!(
                    product_id = %request.product_id,
                    carat_weight = request.carat_weight,
                    error = %e,
                    "price lookup failed, using fallback formula"
                );
                None
            }
        };

        let state = match remote {
            Some(value) => {
                ResolutionState::Resolved(PriceQuote::new(value, PriceSource::Remote, generation))
            }
            None => shared.fallback_state(&request, generation),
        };

        let mut inner = shared.lock();
        if inner.generation != generation {
            tracing::debug!(
                generation,
                current = inner.generation,
                "dropping price result for superseded selection"
            );
            return;
        }

        if let ResolutionState::Resolved(quote) = &state {
            tracing::info!(
                product_id = %request.product_id,
                carat_weight = request.carat_weight,
                metal = %request.selection.metal,
                value = quote.value,
                source = %quote.source,
                "price resolved"
            );
            inner.last_quote = Some(quote.clone());
        }
        shared.publish(&inner, state, false);
    }

    fn fallback_state(&self, request: &PriceRequest, generation: u64) -> ResolutionState {
        let multiplier = self.settings.metals.multiplier(request.selection.metal);
        let value = self
            .settings
            .formula
            .compute(self.base_price, request.carat_weight, multiplier);

        if value.is_finite() && value >= 0.0 {
            ResolutionState::Resolved(PriceQuote::new(value, PriceSource::Fallback, generation))
        } else {
            tracing::error!(
                product_id = %request.product_id,
                base_price = self.base_price,
                carat_weight = request.carat_weight,
                multiplier,
                value,
                "fallback formula produced an unusable price"
            );
            ResolutionState::Failed(format!(
                "fallback price for {}ct is not a finite non-negative number",
                request.carat_weight
            ))
        }
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
