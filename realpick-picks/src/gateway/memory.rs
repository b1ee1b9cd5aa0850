//! In-process vote gateway with fault injection.

use async_trait::async_trait;
use dashmap::DashMap;
use realpick_model::{AggregateTally, MatchVote, Pair, VoteSubmission};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{GatewayError, GatewayResult, VoteGateway};

/// How [`MemoryGateway::submit_vote`] treats valid writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Store and acknowledge
    Persist,
    /// Refuse the write (`Ok(false)`)
    Reject,
    /// Acknowledge without storing
    Discard,
    /// Acknowledge but store only the first pair
    Truncate,
}

impl WriteMode {
    fn to_u8(self) -> u8 {
        match self {
            WriteMode::Persist => 0,
            WriteMode::Reject => 1,
            WriteMode::Discard => 2,
            WriteMode::Truncate => 3,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => WriteMode::Reject,
            2 => WriteMode::Discard,
            3 => WriteMode::Truncate,
            _ => WriteMode::Persist,
        }
    }
}

type VoteKey = (String, String, u32);

/// Vote gateway backed by a concurrent map.
pub struct MemoryGateway {
    /// (mission, user, episode) -> vote
    votes: DashMap<VoteKey, MatchVote>,
    available: AtomicBool,
    write_mode: AtomicU8,
    /// Per-call delay (ms)
    latency_ms: AtomicU64,
    submit_calls: AtomicU32,
    read_calls: AtomicU32,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            votes: DashMap::new(),
            available: AtomicBool::new(true),
            write_mode: AtomicU8::new(WriteMode::Persist.to_u8()),
            latency_ms: AtomicU64::new(0),
            submit_calls: AtomicU32::new(0),
            read_calls: AtomicU32::new(0),
        }
    }

    /// Delay every call by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    /// Delay calls made from now on.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn with_write_mode(self, mode: WriteMode) -> Self {
        self.set_write_mode(mode);
        self
    }

    pub fn set_write_mode(&self, mode: WriteMode) {
        self.write_mode.store(mode.to_u8(), Ordering::SeqCst);
    }

    pub fn write_mode(&self) -> WriteMode {
        WriteMode::from_u8(self.write_mode.load(Ordering::SeqCst))
    }

    /// Make every call fail with [`GatewayError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Store a vote directly, bypassing validation.
    pub fn insert_vote(&self, vote: MatchVote) {
        self.votes.insert(
            (vote.mission_id.clone(), vote.user_id.clone(), vote.episode_no),
            vote,
        );
    }

    /// Store a submitted vote for a user.
    pub fn seed(&self, mission_id: &str, user_id: &str, episode_no: u32, pairs: Vec<Pair>) {
        let submission = VoteSubmission::new(mission_id, user_id, episode_no, pairs);
        self.insert_vote(MatchVote::from_submission(&submission));
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> u32 {
        self.read_calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> GatewayResult<()> {
        let latency_ms = self.latency_ms.load(Ordering::SeqCst);
        if latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(latency_ms)).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("memory gateway offline".to_string()));
        }
        Ok(())
    }

    fn tally<F>(&self, mission_id: &str, in_scope: F) -> AggregateTally
    where
        F: Fn(u32) -> bool,
    {
        let rows: Vec<(String, Vec<Pair>)> = self
            .votes
            .iter()
            .filter(|entry| entry.value().mission_id == mission_id && in_scope(entry.value().episode_no))
            .map(|entry| (entry.value().user_id.clone(), entry.value().pairs.clone()))
            .collect();

        AggregateTally::from_votes(rows.iter().map(|(user, pairs)| (user.as_str(), pairs.as_slice())))
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoteGateway for MemoryGateway {
    async fn get_vote(
        &self,
        user_id: &str,
        mission_id: &str,
        episode_no: u32,
    ) -> GatewayResult<Option<MatchVote>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        let key = (mission_id.to_string(), user_id.to_string(), episode_no);
        Ok(self.votes.get(&key).map(|v| v.value().clone()))
    }

    async fn get_all_votes(&self, user_id: &str, mission_id: &str) -> GatewayResult<Vec<MatchVote>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        let mut votes: Vec<MatchVote> = self
            .votes
            .iter()
            .filter(|entry| entry.value().mission_id == mission_id && entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        votes.sort_by_key(|v| v.episode_no);
        Ok(votes)
    }

    async fn submit_vote(&self, submission: &VoteSubmission) -> GatewayResult<bool> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;

        if let Err(e) = submission.validate() {
            warn!(mission_id = %submission.mission_id, error = %e, "Refusing invalid submission");
            return Ok(false);
        }

        let mut vote = MatchVote::from_submission(submission);
        match self.write_mode() {
            WriteMode::Reject => return Ok(false),
            WriteMode::Discard => return Ok(true),
            WriteMode::Truncate => vote.pairs.truncate(1),
            WriteMode::Persist => {}
        }

        debug!(
            mission_id = %vote.mission_id,
            episode_no = vote.episode_no,
            pairs = vote.pairs.len(),
            "Stored vote"
        );
        self.insert_vote(vote);
        Ok(true)
    }

    async fn get_aggregated_votes(
        &self,
        mission_id: &str,
        episode_no: Option<u32>,
    ) -> GatewayResult<AggregateTally> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        Ok(self.tally(mission_id, |ep| episode_no.map_or(true, |wanted| wanted == ep)))
    }

    async fn get_aggregated_votes_for_episodes(
        &self,
        mission_id: &str,
        episodes: &[u32],
    ) -> GatewayResult<AggregateTally> {
        if episodes.is_empty() {
            return Ok(AggregateTally::empty());
        }
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        Ok(self.tally(mission_id, |ep| episodes.contains(&ep)))
    }
}
