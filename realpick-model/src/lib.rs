//! RealPick data model
//!
//! Types shared by every part of the couple-matching pick flow:
//!
//! - **Missions**: predictable events, their forms and per-episode status
//! - **Picks**: `(left, right)` pairs and the connections drawn from them
//! - **Votes**: submissions sent to the backend and the records it returns
//! - **Tallies**: cross-user pair counts and their ranked percentages
//! - **Scoring**: points awarded for the first correct episode
//!
//! The types serialize with camelCase field names so they match the records
//! exchanged with the web client.
//!
//! # Example
//!
//! ```ignore
//! use realpick_model::{Mission, EpisodeStatus};
//!
//! let mission: Mission = serde_json::from_str(json)?;
//! if mission.episode_status(1) == EpisodeStatus::Open {
//!     // episode 1 accepts picks
//! }
//! ```

pub mod episode;
pub mod mission;
pub mod pick;
pub mod scoring;
pub mod tally;
pub mod vote;

// Re-export main types
pub use episode::{EpisodeBadge, EpisodeStatus};
pub use mission::{
    MatchPairs, Mission, MissionForm, MissionKind, MissionOptions, MissionStats, MissionStatus,
    RevealPolicy, DEFAULT_MATCH_EPISODES,
};
pub use pick::{pair_key, Connection, Pair, Side};
pub use scoring::{first_correct_episode, match_points, score_for_episode, EpisodeScore};
pub use tally::{AggregateTally, RankedPair};
pub use vote::{InvalidSubmission, MatchVote, VoteSubmission};
