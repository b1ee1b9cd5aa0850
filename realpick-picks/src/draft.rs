//! Per-episode draft picks.

use realpick_model::{Pair, Side};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::storage::{decode_pairs, encode_pairs, ClientStorage, StorageKeys};

/// Result of adding a pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// New pick inserted
    Added,
    /// New pick inserted after removing picks that shared an endpoint
    Replaced { removed: Vec<Pair> },
    /// Identical pick already present
    Unchanged,
}

impl ConnectOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, ConnectOutcome::Unchanged)
    }
}

/// Picks for every episode of one mission.
///
/// Within an episode each candidate appears in at most one pick. Edits are
/// written through to client storage when `persist` is set.
pub struct DraftStore {
    picks: BTreeMap<u32, Vec<Pair>>,
    storage: Arc<dyn ClientStorage>,
    keys: StorageKeys,
    persist: bool,
}

impl DraftStore {
    pub fn new(storage: Arc<dyn ClientStorage>, keys: StorageKeys, persist: bool) -> Self {
        Self {
            picks: BTreeMap::new(),
            storage,
            keys,
            persist,
        }
    }

    /// Fill episodes with no picks from client storage. Returns how many were loaded.
    pub fn load_from_storage(&mut self, total_episodes: u32) -> usize {
        let mut loaded = 0;
        for episode_no in 1..=total_episodes {
            if !self.picks(episode_no).is_empty() {
                continue;
            }
            let stored = self
                .storage
                .get(&self.keys.draft_key(episode_no))
                .and_then(|raw| decode_pairs(&raw))
                .map(normalize)
                .unwrap_or_default();
            if !stored.is_empty() {
                self.picks.insert(episode_no, stored);
                loaded += 1;
            }
        }
        loaded
    }

    pub fn picks(&self, episode_no: u32) -> &[Pair] {
        self.picks.get(&episode_no).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all(&self) -> &BTreeMap<u32, Vec<Pair>> {
        &self.picks
    }

    /// Whether `name` on `side` is used by a pick of the episode.
    pub fn is_connected(&self, episode_no: u32, side: Side, name: &str) -> bool {
        self.picks(episode_no).iter().any(|p| p.involves(side, name))
    }

    /// Add a pick, first removing any pick sharing an endpoint with it.
    pub fn connect(&mut self, episode_no: u32, pair: Pair) -> ConnectOutcome {
        let picks = self.picks.entry(episode_no).or_default();
        if picks.contains(&pair) {
            return ConnectOutcome::Unchanged;
        }

        let (removed, kept): (Vec<Pair>, Vec<Pair>) =
            picks.drain(..).partition(|existing| existing.shares_endpoint(&pair));
        *picks = kept;
        picks.push(pair);

        self.persist_episode(episode_no);
        if removed.is_empty() {
            ConnectOutcome::Added
        } else {
            ConnectOutcome::Replaced { removed }
        }
    }

    /// Remove a pick. Returns false if it was not present.
    pub fn disconnect(&mut self, episode_no: u32, pair: &Pair) -> bool {
        let Some(picks) = self.picks.get_mut(&episode_no) else {
            return false;
        };
        let before = picks.len();
        picks.retain(|p| p != pair);
        if picks.len() == before {
            return false;
        }
        self.persist_episode(episode_no);
        true
    }

    /// Replace an episode's picks with a verified remote copy and store it.
    pub fn mirror(&mut self, episode_no: u32, pairs: Vec<Pair>) {
        self.picks.insert(episode_no, normalize(pairs));
        self.write_blob(episode_no);
    }

    /// Replace an episode's picks in memory only.
    pub fn set_cached(&mut self, episode_no: u32, pairs: Vec<Pair>) {
        self.picks.insert(episode_no, normalize(pairs));
    }

    /// Drop every pick and remove the episode blobs from client storage.
    pub fn clear_all(&mut self, total_episodes: u32) {
        self.picks.clear();
        for episode_no in 1..=total_episodes {
            self.storage.remove(&self.keys.draft_key(episode_no));
        }
    }

    fn persist_episode(&self, episode_no: u32) {
        if self.persist {
            self.write_blob(episode_no);
        }
    }

    fn write_blob(&self, episode_no: u32) {
        let key = self.keys.draft_key(episode_no);
        if let Err(e) = self.storage.set(&key, &encode_pairs(self.picks(episode_no))) {
            warn!(key = %key, error = %e, "Failed to store draft");
        }
    }
}

/// Enforce one pick per candidate, keeping the later pick on conflict.
fn normalize(pairs: Vec<Pair>) -> Vec<Pair> {
    let mut out: Vec<Pair> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        out.retain(|existing| !existing.shares_endpoint(&pair));
        out.push(pair);
    }
    out
}
