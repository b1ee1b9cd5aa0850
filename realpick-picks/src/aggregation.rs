//! Ranked cross-user results for a mission.

use chrono::{DateTime, Utc};
use realpick_model::{AggregateTally, RankedPair};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::events::VoteEvent;
use crate::gateway::{GatewayResult, VoteGateway};

/// Which episodes a tally covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsScope {
    /// Every episode
    All,
    Episode(u32),
    /// Explicit set, ascending
    Episodes(Vec<u32>),
    /// Nothing selected; never fetched
    Empty,
}

impl ResultsScope {
    /// Scope following an episode selection.
    pub fn from_selection(selected: &[u32]) -> Self {
        let mut episodes = selected.to_vec();
        episodes.sort_unstable();
        episodes.dedup();
        match episodes.as_slice() {
            [] => ResultsScope::Empty,
            [single] => ResultsScope::Episode(*single),
            _ => ResultsScope::Episodes(episodes),
        }
    }
}

/// A fetched tally with its ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedResults {
    pub scope: ResultsScope,
    pub tally: AggregateTally,
    pub ranked: Vec<RankedPair>,
    pub fetched_at: DateTime<Utc>,
}

impl RankedResults {
    fn new(scope: ResultsScope, tally: AggregateTally) -> Self {
        Self {
            ranked: tally.ranked(),
            scope,
            tally,
            fetched_at: Utc::now(),
        }
    }
}

struct LoadingGuard<'a>(&'a AtomicU32);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicU32) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Kept results and the refresh that produced them.
#[derive(Default)]
struct Latest {
    generation: u64,
    results: Option<RankedResults>,
}

/// Results view. Reads tallies only; never touches drafts.
pub struct AggregationView {
    gateway: Arc<dyn VoteGateway>,
    mission_id: String,
    scope: RwLock<ResultsScope>,
    latest: RwLock<Latest>,
    /// Bumped when a refresh starts
    generation: AtomicU64,
    loading: AtomicU32,
}

impl AggregationView {
    pub fn new(gateway: Arc<dyn VoteGateway>, mission_id: impl Into<String>) -> Self {
        Self {
            gateway,
            mission_id: mission_id.into(),
            scope: RwLock::new(ResultsScope::All),
            latest: RwLock::new(Latest::default()),
            generation: AtomicU64::new(0),
            loading: AtomicU32::new(0),
        }
    }

    pub fn mission_id(&self) -> &str {
        &self.mission_id
    }

    pub async fn scope(&self) -> ResultsScope {
        self.scope.read().await.clone()
    }

    /// Last results for the current scope.
    pub async fn results(&self) -> Option<RankedResults> {
        self.latest.read().await.results.clone()
    }

    /// True while a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    /// Change scope and fetch.
    pub async fn set_scope(&self, scope: ResultsScope) -> GatewayResult<RankedResults> {
        *self.scope.write().await = scope;
        self.refresh().await
    }

    /// Scope to an episode selection and fetch.
    pub async fn follow_selection(&self, selected: &[u32]) -> GatewayResult<RankedResults> {
        self.set_scope(ResultsScope::from_selection(selected)).await
    }

    /// Fetch the current scope again.
    ///
    /// Results are returned but not kept when the scope changed while the
    /// fetch was running, or when a refresh started later already kept its own.
    pub async fn refresh(&self) -> GatewayResult<RankedResults> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let scope = self.scope().await;
        let tally = match &scope {
            ResultsScope::Empty => AggregateTally::empty(),
            _ => {
                let _loading = LoadingGuard::enter(&self.loading);
                self.fetch(&scope).await.map_err(|e| {
                    warn!(mission_id = %self.mission_id, ?scope, error = %e, "Failed to fetch results");
                    e
                })?
            }
        };

        let results = RankedResults::new(scope, tally);
        let mut latest = self.latest.write().await;
        if *self.scope.read().await != results.scope {
            debug!(mission_id = %self.mission_id, "Discarding results for a stale scope");
        } else if latest.generation > generation {
            debug!(mission_id = %self.mission_id, generation, "Discarding results overtaken by a newer refresh");
        } else {
            latest.generation = generation;
            latest.results = Some(results.clone());
        }
        Ok(results)
    }

    async fn fetch(&self, scope: &ResultsScope) -> GatewayResult<AggregateTally> {
        match scope {
            ResultsScope::All => self.gateway.get_aggregated_votes(&self.mission_id, None).await,
            ResultsScope::Episode(ep) => {
                self.gateway
                    .get_aggregated_votes(&self.mission_id, Some(*ep))
                    .await
            }
            ResultsScope::Episodes(episodes) => {
                self.gateway
                    .get_aggregated_votes_for_episodes(&self.mission_id, episodes)
                    .await
            }
            ResultsScope::Empty => Ok(AggregateTally::empty()),
        }
    }

    /// Refresh if the event concerns this mission. Returns whether it did.
    pub async fn handle_event(&self, event: &VoteEvent) -> GatewayResult<bool> {
        if event.mission_id() != self.mission_id {
            return Ok(false);
        }
        debug!(mission_id = %self.mission_id, origin = %event.origin(), "Vote event, refreshing results");
        self.refresh().await?;
        Ok(true)
    }

    /// Refresh on every relevant event until the channel closes.
    pub async fn follow(&self, mut events: broadcast::Receiver<VoteEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    // Failures are logged by refresh; the next event retries
                    let _ = self.handle_event(&event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Vote events lagged, refreshing results");
                    let _ = self.refresh().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
