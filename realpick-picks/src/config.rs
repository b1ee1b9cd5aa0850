//! Configuration for pick sessions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use realpick_model::DEFAULT_MATCH_EPISODES;

pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration for a [`crate::PickSession`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickConfig {
    /// Identifies this client on the event channel
    pub client_id: String,
    /// Client-side deadline for a whole submission, write and read-back (ms)
    pub submit_timeout_ms: u64,
    /// Episode count for match missions that do not declare one
    pub default_match_episodes: u32,
    /// Prefix of client storage keys
    pub storage_prefix: String,
    /// Write unsubmitted drafts to client storage on every edit
    pub persist_drafts: bool,
    /// Capacity of the vote event broadcast channel, see
    /// [`crate::VoteEvents::from_config`]
    pub event_capacity: usize,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            client_id: uuid::Uuid::new_v4().to_string(),
            submit_timeout_ms: 15_000,
            default_match_episodes: DEFAULT_MATCH_EPISODES,
            storage_prefix: "rp_matchpick".to_string(),
            persist_drafts: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl PickConfig {
    /// Create a config for a named client.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Short timeouts for tests and local demos.
    pub fn for_testing() -> Self {
        Self {
            submit_timeout_ms: 200,
            ..Default::default()
        }
    }

    /// Keep drafts in memory only; only submitted picks reach client storage.
    pub fn without_draft_persistence(mut self) -> Self {
        self.persist_drafts = false;
        self
    }

    /// Set the submission timeout.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
