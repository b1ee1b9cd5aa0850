//! Vote events broadcast between sessions and result views.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::{PickConfig, DEFAULT_EVENT_CAPACITY};

/// Something changed in a mission's stored votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VoteEvent {
    /// A submission was written and verified
    #[serde(rename_all = "camelCase")]
    VoteSubmitted {
        mission_id: String,
        user_id: String,
        episode_no: u32,
        /// Client that published the event
        origin: String,
    },
    /// A client cleared its local pick data
    #[serde(rename_all = "camelCase")]
    PicksCleared { mission_id: String, origin: String },
}

impl VoteEvent {
    pub fn mission_id(&self) -> &str {
        match self {
            VoteEvent::VoteSubmitted { mission_id, .. } | VoteEvent::PicksCleared { mission_id, .. } => {
                mission_id
            }
        }
    }

    pub fn origin(&self) -> &str {
        match self {
            VoteEvent::VoteSubmitted { origin, .. } | VoteEvent::PicksCleared { origin, .. } => origin,
        }
    }
}

/// Broadcast channel for [`VoteEvent`]s.
///
/// Cloning shares the channel. Publishing with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct VoteEvents {
    sender: broadcast::Sender<VoteEvent>,
}

impl VoteEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Channel sized by [`PickConfig::event_capacity`].
    pub fn from_config(config: &PickConfig) -> Self {
        Self::new(config.event_capacity)
    }

    /// Publish an event; returns the number of subscribers that received it.
    pub fn publish(&self, event: VoteEvent) -> usize {
        tracing::debug!(mission_id = %event.mission_id(), origin = %event.origin(), "Publishing vote event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoteEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for VoteEvents {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
