//! Vote submissions and stored votes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::pick::Pair;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Reasons a submission is refused before it is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSubmission {
    #[error("missing user id")]
    MissingUser,

    #[error("missing mission id")]
    MissingMission,

    #[error("episode number must be positive, got {0}")]
    InvalidEpisode(u32),

    #[error("no pairs to submit")]
    NoPairs,

    #[error("pair {index} has a blank name")]
    BlankName { index: usize },
}

/// One user's picks for one episode, as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct VoteSubmission {
    pub mission_id: String,
    pub user_id: String,
    pub episode_no: u32,
    pub pairs: Vec<Pair>,
    pub submitted_at: DateTime<Utc>,
}

impl VoteSubmission {
    pub fn new(
        mission_id: impl Into<String>,
        user_id: impl Into<String>,
        episode_no: u32,
        pairs: Vec<Pair>,
    ) -> Self {
        Self {
            mission_id: mission_id.into(),
            user_id: user_id.into(),
            episode_no,
            pairs,
            submitted_at: Utc::now(),
        }
    }

    /// Check the submission the way the backend does before writing it.
    pub fn validate(&self) -> Result<(), InvalidSubmission> {
        if self.user_id.trim().is_empty() {
            return Err(InvalidSubmission::MissingUser);
        }
        if self.mission_id.trim().is_empty() {
            return Err(InvalidSubmission::MissingMission);
        }
        if self.episode_no == 0 {
            return Err(InvalidSubmission::InvalidEpisode(self.episode_no));
        }
        if self.pairs.is_empty() {
            return Err(InvalidSubmission::NoPairs);
        }
        if let Some(index) = self
            .pairs
            .iter()
            .position(|pair| pair.left.trim().is_empty() || pair.right.trim().is_empty())
        {
            return Err(InvalidSubmission::BlankName { index });
        }
        Ok(())
    }
}

/// A stored vote for one (user, mission, episode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MatchVote {
    pub user_id: String,
    pub mission_id: String,
    pub episode_no: u32,
    pub pairs: Vec<Pair>,
    pub submitted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl MatchVote {
    /// The record a backend stores for an accepted submission.
    pub fn from_submission(submission: &VoteSubmission) -> Self {
        Self {
            user_id: submission.user_id.clone(),
            mission_id: submission.mission_id.clone(),
            episode_no: submission.episode_no,
            pairs: submission.pairs.clone(),
            submitted: true,
            submitted_at: Some(submission.submitted_at),
        }
    }

    /// Whether this vote holds exactly `pairs`, ignoring order.
    pub fn matches_pairs(&self, pairs: &[Pair]) -> bool {
        let stored: BTreeSet<&Pair> = self.pairs.iter().collect();
        let expected: BTreeSet<&Pair> = pairs.iter().collect();
        stored == expected && self.pairs.len() == pairs.len()
    }
}
