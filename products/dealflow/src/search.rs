//! Debounced command-palette search where only the newest request may update results.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tracing::{debug, warn};

use crate::{api::SearchHit, error::GatewayError, gateway::DealGateway};

pub const QUIET_PERIOD: Duration = Duration::from_millis(150);

/// Hands out increasing tickets; a ticket is current until a newer one is issued.
#[derive(Debug, Default)]
pub struct SearchSequencer {
    latest: AtomicU64,
}

impl SearchSequencer {
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results were stored as the current view.
    Applied(Vec<SearchHit>),
    /// A newer keystroke arrived during the quiet period; no request was made.
    Superseded,
    /// The response came back after a newer query was issued and was dropped.
    Stale,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

pub struct DebouncedSearch {
    gateway: Arc<dyn DealGateway>,
    sequencer: SearchSequencer,
    quiet: Duration,
    current: Mutex<Option<SearchResults>>,
}

impl DebouncedSearch {
    pub fn new(gateway: Arc<dyn DealGateway>) -> Self {
        Self::with_quiet_period(gateway, QUIET_PERIOD)
    }

    pub fn with_quiet_period(gateway: Arc<dyn DealGateway>, quiet: Duration) -> Self {
        Self {
            gateway,
            sequencer: SearchSequencer::default(),
            quiet,
            current: Mutex::new(None),
        }
    }

    /// Call once per keystroke. Concurrent calls race; only the newest one applies.
    pub async fn query(&self, query: &str) -> Result<SearchOutcome, GatewayError> {
        let ticket = self.sequencer.issue();
        tokio::time::sleep(self.quiet).await;
        if !self.sequencer.is_latest(ticket) {
            return Ok(SearchOutcome::Superseded);
        }

        let response = match self.gateway.search(query).await {
            Ok(response) => response,
            Err(err) => {
                warn!(ticket, error = %err, "search failed");
                return Err(err);
            }
        };
        if !self.sequencer.is_latest(ticket) {
            debug!(ticket, "dropping stale search response");
            return Ok(SearchOutcome::Stale);
        }

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = Some(SearchResults {
            query: query.to_string(),
            hits: response.deals.clone(),
        });
        Ok(SearchOutcome::Applied(response.deals))
    }

    pub fn results(&self) -> Option<SearchResults> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
