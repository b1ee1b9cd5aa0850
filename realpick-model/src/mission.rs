//! Mission types.
//!
//! Mirrors the mission records created by the admin flow. Only `match`-form
//! missions carry episodes; the other forms are kept so mission records
//! deserialize whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::episode::EpisodeStatus;
use crate::pick::{Pair, Side};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Episode count assumed for a `match` mission that does not declare one.
pub const DEFAULT_MATCH_EPISODES: u32 = 8;

/// What is being predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum MissionKind {
    /// Predict the actual outcome
    Predict,
    /// Guess the majority opinion
    Majority,
}

/// Shape of the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum MissionForm {
    Binary,
    Multi,
    /// Couple matching between two candidate lists
    Match,
    Subjective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Open,
    Closed,
    Settled,
}

/// When aggregate results become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum RevealPolicy {
    #[serde(rename = "realtime")]
    Realtime,
    #[serde(rename = "onClose")]
    OnClose,
}

/// The two candidate lists of a `match` mission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct MatchPairs {
    pub left: Vec<String>,
    pub right: Vec<String>,
}

impl MatchPairs {
    pub fn new(
        left: impl IntoIterator<Item = impl Into<String>>,
        right: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            left: left.into_iter().map(Into::into).collect(),
            right: right.into_iter().map(Into::into).collect(),
        }
    }

    /// Candidates of one column.
    pub fn column(&self, side: Side) -> &[String] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Whether `name` is a candidate of the given column.
    pub fn contains(&self, side: Side, name: &str) -> bool {
        self.column(side).iter().any(|candidate| candidate == name)
    }
}

/// Option set of a mission: a flat list, or two named lists for `match`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(untagged)]
pub enum MissionOptions {
    Flat(Vec<String>),
    Match(MatchPairs),
}

/// Participation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MissionStats {
    pub participants: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_votes: Option<u32>,
}

/// A predictable event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub kind: MissionKind,
    pub form: MissionForm,
    pub status: MissionStatus,
    /// Absent for `match` missions, which close per episode instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub reveal_policy: RevealPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<MissionOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub episode_statuses: BTreeMap<u32, EpisodeStatus>,
    /// Set once the mission is settled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<Vec<Pair>>,
    #[serde(default)]
    pub stats: MissionStats,
}

impl Mission {
    /// Create an open `match` mission with the given candidate lists.
    pub fn matching(
        id: impl Into<String>,
        title: impl Into<String>,
        pairs: MatchPairs,
        episodes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: MissionKind::Predict,
            form: MissionForm::Match,
            status: MissionStatus::Open,
            deadline: None,
            reveal_policy: RevealPolicy::Realtime,
            options: Some(MissionOptions::Match(pairs)),
            episodes: Some(episodes),
            episode_statuses: BTreeMap::new(),
            final_answer: None,
            stats: MissionStats::default(),
        }
    }

    /// Set the status of one episode.
    pub fn with_episode_status(mut self, episode_no: u32, status: EpisodeStatus) -> Self {
        self.episode_statuses.insert(episode_no, status);
        self
    }

    /// Settle the mission with a final answer.
    pub fn with_final_answer(mut self, answer: Vec<Pair>) -> Self {
        self.status = MissionStatus::Settled;
        self.final_answer = Some(answer);
        self
    }

    pub fn is_match(&self) -> bool {
        self.form == MissionForm::Match
    }

    /// Number of episodes, falling back to `default_match` for match missions.
    pub fn total_episodes_or(&self, default_match: u32) -> u32 {
        match (self.form, self.episodes) {
            (_, Some(count)) if count > 0 => count,
            (MissionForm::Match, _) => default_match,
            _ => 1,
        }
    }

    /// Number of episodes using the standard match default.
    pub fn total_episodes(&self) -> u32 {
        self.total_episodes_or(DEFAULT_MATCH_EPISODES)
    }

    /// Status of an episode.
    ///
    /// Episodes missing from the status map are `open` for episode 1 and
    /// `locked` otherwise.
    pub fn episode_status(&self, episode_no: u32) -> EpisodeStatus {
        self.episode_statuses
            .get(&episode_no)
            .copied()
            .unwrap_or(if episode_no == 1 {
                EpisodeStatus::Open
            } else {
                EpisodeStatus::Locked
            })
    }

    /// Candidate lists, when this is a `match` mission.
    pub fn match_pairs(&self) -> Option<&MatchPairs> {
        match &self.options {
            Some(MissionOptions::Match(pairs)) => Some(pairs),
            _ => None,
        }
    }
}
