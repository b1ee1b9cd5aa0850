//! Client-side key/value storage for drafts and submission flags.
//!
//! Keys follow the layout the web client uses, so drafts written by one
//! client are picked up by another sharing the same store:
//!
//! - `{prefix}_{mission}_{episode}`: JSON array of `{left, right}` pairs
//! - `{prefix}_submitted_{mission}_{episode}`: `"true"` once submitted

use dashmap::DashMap;
use realpick_model::Pair;

/// Errors from client storage writes.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage quota exceeded writing {key}")]
    QuotaExceeded { key: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store that survives a reload.
///
/// Reads never fail; a missing or unreadable value is `None`.
pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str);
}

/// Storage key layout for one mission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: String,
    mission_id: String,
}

impl StorageKeys {
    pub fn new(prefix: impl Into<String>, mission_id: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            mission_id: mission_id.into(),
        }
    }

    pub fn draft_key(&self, episode_no: u32) -> String {
        format!("{}_{}_{}", self.prefix, self.mission_id, episode_no)
    }

    pub fn submitted_key(&self, episode_no: u32) -> String {
        format!("{}_submitted_{}_{}", self.prefix, self.mission_id, episode_no)
    }
}

/// Decode a stored draft blob. Malformed blobs read as no draft.
pub fn decode_pairs(raw: &str) -> Option<Vec<Pair>> {
    match serde_json::from_str::<Vec<Pair>>(raw) {
        Ok(pairs) => Some(pairs),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed draft blob");
            None
        }
    }
}

/// Encode pairs as a draft blob.
pub fn encode_pairs(pairs: &[Pair]) -> String {
    // Vec<Pair> of plain strings always serializes
    serde_json::to_string(pairs).unwrap_or_else(|_| "[]".to_string())
}

/// In-memory storage, shared between sessions through an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
    max_entries: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse new keys once `max_entries` keys are stored.
    pub fn with_quota(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(max) = self.max_entries {
            if !self.entries.contains_key(key) && self.entries.len() >= max {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
