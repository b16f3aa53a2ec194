use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{models::ProductRecord, services::search_gateway::SearchGateway};

/// Lifecycle of the search-as-you-type input
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    /// Empty query or dismissed view
    Idle,
    /// Debounce timer armed, nothing sent yet
    Pending,
    InFlight,
    /// Results (possibly none) are available
    Settled,
}

/// Point-in-time view of the controller for rendering
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuerySnapshot {
    pub query: String,
    pub phase: QueryPhase,
    pub visible: bool,
    pub results: Vec<ProductRecord>,
}

impl QuerySnapshot {
    /// Message shown when a settled search found nothing
    pub fn empty_message(&self) -> Option<String> {
        if self.phase == QueryPhase::Settled && self.results.is_empty() && !self.query.is_empty() {
            Some(format!("No products found for \"{}\"", self.query))
        } else {
            None
        }
    }
}

struct ControllerState {
    query: String,
    phase: QueryPhase,
    visible: bool,
    results: Vec<ProductRecord>,
    /// Bumped on every input; a search applies its results only while its
    /// generation is still the latest
    generation: u64,
    /// Armed debounce timer. Taken by the timer task once it dispatches, so
    /// in-flight searches are never aborted.
    pending: Option<JoinHandle<()>>,
}

/// Debounces free-text input into search requests
#[derive(Clone)]
pub struct QueryController {
    gateway: SearchGateway,
    debounce: Duration,
    limit: usize,
    state: Arc<Mutex<ControllerState>>,
}

impl QueryController {
    pub fn new(gateway: SearchGateway, debounce: Duration, limit: usize) -> Self {
        Self {
            gateway,
            debounce,
            limit,
            state: Arc::new(Mutex::new(ControllerState {
                query: String::new(),
                phase: QueryPhase::Idle,
                visible: false,
                results: Vec::new(),
                generation: 0,
                pending: None,
            })),
        }
    }

    /// Feeds the current input value, restarting the debounce window
    pub async fn input(&self, query: impl Into<String>) {
        let query = query.into();
        let mut state = self.state.lock().await;

        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.generation += 1;
        state.query = query.clone();
        state.visible = true;

        if query.trim().is_empty() {
            state.phase = QueryPhase::Idle;
            state.results.clear();
            return;
        }

        state.phase = QueryPhase::Pending;
        let generation = state.generation;
        let controller = self.clone();
        state.pending = Some(tokio::spawn(async move {
            controller.dispatch_after_debounce(generation, query).await;
        }));
    }

    /// Empties the input
    pub async fn clear(&self) {
        self.input(String::new()).await;
    }

    /// Hides the results view; a search already running still completes
    ///
    /// The phase reads `Idle` right after dismissing, but an armed timer or an
    /// in-flight search keeps advancing it to `InFlight` and `Settled` while
    /// the view stays hidden. Consumers should key off `visible`, not `phase`.
    pub async fn dismiss(&self) {
        let mut state = self.state.lock().await;
        state.visible = false;
        state.phase = QueryPhase::Idle;
    }

    /// Re-opens the results view
    pub async fn show(&self) {
        self.state.lock().await.visible = true;
    }

    pub async fn snapshot(&self) -> QuerySnapshot {
        let state = self.state.lock().await;
        QuerySnapshot {
            query: state.query.clone(),
            phase: state.phase,
            visible: state.visible,
            results: state.results.clone(),
        }
    }

    async fn dispatch_after_debounce(&self, generation: u64, query: String) {
        tokio::time::sleep(self.debounce).await;

        {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                return;
            }
            state.pending = None;
            state.phase = QueryPhase::InFlight;
        }

        tracing::debug!(query = %query, generation, "Dispatching debounced search");
        let results = self.gateway.search_by_text(&query, self.limit).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            tracing::debug!(
                query = %query,
                generation,
                latest = state.generation,
                "Discarding stale search results"
            );
            return;
        }
        state.results = results;
        state.phase = QueryPhase::Settled;
    }
}
