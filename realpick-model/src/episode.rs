//! Episode status and selector badges.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Status of one episode of a `match` mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum EpisodeStatus {
    /// Not yet votable
    Locked,
    /// Accepts new or edited picks
    Open,
    /// Closed; a final answer may exist
    Settled,
}

impl EpisodeStatus {
    /// Whether picks for this episode may be created or edited.
    pub fn accepts_picks(&self) -> bool {
        matches!(self, EpisodeStatus::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::Locked => "locked",
            EpisodeStatus::Open => "open",
            EpisodeStatus::Settled => "settled",
        }
    }
}

impl std::fmt::Display for EpisodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Badge shown for an episode in the episode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum EpisodeBadge {
    /// Locked episode, shown with a lock
    Preview,
    OpenParticipated,
    OpenNotParticipated,
    ClosedParticipated,
    ClosedNotParticipated,
}

impl EpisodeBadge {
    /// Badge for an episode given its status and whether the user submitted picks for it.
    pub fn for_episode(status: EpisodeStatus, participated: bool) -> Self {
        match (status, participated) {
            (EpisodeStatus::Locked, _) => EpisodeBadge::Preview,
            (EpisodeStatus::Settled, true) => EpisodeBadge::ClosedParticipated,
            (EpisodeStatus::Settled, false) => EpisodeBadge::ClosedNotParticipated,
            (EpisodeStatus::Open, true) => EpisodeBadge::OpenParticipated,
            (EpisodeStatus::Open, false) => EpisodeBadge::OpenNotParticipated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_open_accepts_picks() {
        assert!(EpisodeStatus::Open.accepts_picks());
        assert!(!EpisodeStatus::Locked.accepts_picks());
        assert!(!EpisodeStatus::Settled.accepts_picks());
    }

    #[test]
    fn test_badges() {
        assert_eq!(
            EpisodeBadge::for_episode(EpisodeStatus::Locked, true),
            EpisodeBadge::Preview
        );
        assert_eq!(
            EpisodeBadge::for_episode(EpisodeStatus::Open, false),
            EpisodeBadge::OpenNotParticipated
        );
        assert_eq!(
            EpisodeBadge::for_episode(EpisodeStatus::Settled, true),
            EpisodeBadge::ClosedParticipated
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&EpisodeStatus::Settled).unwrap();
        assert_eq!(json, "\"settled\"");
        let badge = serde_json::to_string(&EpisodeBadge::OpenParticipated).unwrap();
        assert_eq!(badge, "\"open-participated\"");
    }
}
