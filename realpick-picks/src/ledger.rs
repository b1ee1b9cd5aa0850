//! Submitted episodes.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

use crate::storage::{ClientStorage, StorageKeys};

const SUBMITTED_FLAG: &str = "true";

/// Set of episodes whose picks have been persisted remotely.
///
/// Entries are only added after a verified submission or a remote load and are
/// never removed except by clearing all local data.
pub struct SubmissionLedger {
    submitted: BTreeSet<u32>,
    storage: Arc<dyn ClientStorage>,
    keys: StorageKeys,
}

impl SubmissionLedger {
    pub fn new(storage: Arc<dyn ClientStorage>, keys: StorageKeys) -> Self {
        Self {
            submitted: BTreeSet::new(),
            storage,
            keys,
        }
    }

    /// Read submitted flags from client storage.
    pub fn load_from_storage(&mut self, total_episodes: u32) {
        for episode_no in 1..=total_episodes {
            let flag = self.storage.get(&self.keys.submitted_key(episode_no));
            if flag.as_deref() == Some(SUBMITTED_FLAG) {
                self.submitted.insert(episode_no);
            }
        }
    }

    /// Record an episode found submitted on the backend.
    pub fn record_remote(&mut self, episode_no: u32) {
        self.submitted.insert(episode_no);
    }

    /// Record a verified submission and flag it in client storage.
    pub fn mark_submitted(&mut self, episode_no: u32) {
        self.submitted.insert(episode_no);
        let key = self.keys.submitted_key(episode_no);
        if let Err(e) = self.storage.set(&key, SUBMITTED_FLAG) {
            warn!(key = %key, error = %e, "Failed to store submitted flag");
        }
    }

    pub fn is_submitted(&self, episode_no: u32) -> bool {
        self.submitted.contains(&episode_no)
    }

    pub fn episodes(&self) -> Vec<u32> {
        self.submitted.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.submitted.is_empty()
    }

    pub fn clear_all(&mut self, total_episodes: u32) {
        self.submitted.clear();
        for episode_no in 1..=total_episodes {
            self.storage.remove(&self.keys.submitted_key(episode_no));
        }
    }
}
