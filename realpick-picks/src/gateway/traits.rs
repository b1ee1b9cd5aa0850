//! Vote gateway trait and errors.

use async_trait::async_trait;
use realpick_model::{AggregateTally, MatchVote, VoteSubmission};

/// Gateway errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Backend cannot be reached
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Backend holding every user's votes.
///
/// Votes are keyed by (user, mission, episode); a second submission for the
/// same key replaces the first.
#[async_trait]
pub trait VoteGateway: Send + Sync {
    /// The user's vote for one episode, if stored.
    async fn get_vote(
        &self,
        user_id: &str,
        mission_id: &str,
        episode_no: u32,
    ) -> GatewayResult<Option<MatchVote>>;

    /// All of the user's votes for a mission, ascending by episode.
    async fn get_all_votes(&self, user_id: &str, mission_id: &str) -> GatewayResult<Vec<MatchVote>>;

    /// Upsert a vote.
    ///
    /// `Ok(false)` means the backend refused the write (invalid payload,
    /// policy violation). Transport failures are errors.
    async fn submit_vote(&self, submission: &VoteSubmission) -> GatewayResult<bool>;

    /// Tally for one episode, or for every episode when `episode_no` is `None`.
    async fn get_aggregated_votes(
        &self,
        mission_id: &str,
        episode_no: Option<u32>,
    ) -> GatewayResult<AggregateTally>;

    /// Tally across a set of episodes. An empty set tallies nothing.
    async fn get_aggregated_votes_for_episodes(
        &self,
        mission_id: &str,
        episodes: &[u32],
    ) -> GatewayResult<AggregateTally>;
}
