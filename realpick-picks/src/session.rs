//! PickSession - one user's pick board for one mission.
//!
//! Owns the drafts, ledger, selection and drag state behind a single async
//! lock. Gateway calls are made with the lock released.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use realpick_model::{
    first_correct_episode, Connection, EpisodeBadge, EpisodeScore, MatchPairs, MatchVote, Mission,
    MissionStatus, Pair, Side, VoteSubmission,
};

use crate::aggregation::AggregationView;
use crate::board::{connection_lines, PairLine};
use crate::config::PickConfig;
use crate::draft::{ConnectOutcome, DraftStore};
use crate::drag::{resolve_target, DragController, DragState, PointerKind};
use crate::error::PickError;
use crate::events::{VoteEvent, VoteEvents};
use crate::gateway::VoteGateway;
use crate::geometry::{BoundsRegistry, Point, Rect, Segment};
use crate::identity::Identity;
use crate::ledger::SubmissionLedger;
use crate::selection::{EpisodeSelection, SelectionMode};
use crate::storage::{ClientStorage, StorageKeys};

/// Services a session depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub gateway: Arc<dyn VoteGateway>,
    pub storage: Arc<dyn ClientStorage>,
    pub identity: Arc<dyn Identity>,
    pub events: VoteEvents,
}

/// What [`PickSession::load`] restored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Episodes restored from the backend
    pub remote_episodes: Vec<u32>,
    /// Episodes restored from client storage
    pub local_episodes: usize,
    /// Episodes in the ledger after loading
    pub submitted: Vec<u32>,
    /// Set when the backend could not be read and only client storage was used
    pub remote_error: Option<String>,
}

/// Result of releasing a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// No drag was in progress
    Idle,
    /// Released over empty space
    Missed,
    Connected {
        episode_no: u32,
        pair: Pair,
        change: ConnectOutcome,
    },
}

/// A verified submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub episode_no: u32,
    /// Pairs as read back from the backend
    pub pairs: Vec<Pair>,
    pub submitted_at: DateTime<Utc>,
}

struct SessionState {
    drafts: DraftStore,
    ledger: SubmissionLedger,
    selection: EpisodeSelection,
    drag: DragController,
    bounds: BoundsRegistry,
    /// Episodes with a submission awaiting the backend
    in_flight: BTreeSet<u32>,
    /// Episode whose submit is waiting for sign-in
    pending_submit: Option<u32>,
}

impl SessionState {
    /// The single selected episode, if it may be edited or submitted.
    fn editable_episode(&self, mission: &Mission) -> Result<u32, PickError> {
        let episode_no = match self.selection.mode() {
            SelectionMode::Idle => return Err(PickError::NoEpisodeSelected),
            SelectionMode::MultiView(_) => return Err(PickError::MultipleEpisodesSelected),
            SelectionMode::SingleEdit(ep) => ep,
        };

        let status = mission.episode_status(episode_no);
        if !status.accepts_picks() {
            return Err(PickError::EpisodeNotOpen {
                episode: episode_no,
                status,
            });
        }
        if self.ledger.is_submitted(episode_no) {
            return Err(PickError::EpisodeSubmitted(episode_no));
        }
        if self.in_flight.contains(&episode_no) {
            return Err(PickError::SubmissionInFlight(episode_no));
        }
        Ok(episode_no)
    }
}

/// Pick board state for one mission and one user.
pub struct PickSession {
    config: PickConfig,
    mission: Mission,
    roster: MatchPairs,
    total_episodes: u32,
    gateway: Arc<dyn VoteGateway>,
    identity: Arc<dyn Identity>,
    events: VoteEvents,
    state: Arc<RwLock<SessionState>>,
}

impl PickSession {
    /// Create a session for a `match` mission.
    pub fn new(
        mission: Mission,
        collaborators: Collaborators,
        config: PickConfig,
    ) -> Result<Self, PickError> {
        if !mission.is_match() {
            return Err(PickError::NotMatchMission(mission.id.clone()));
        }
        let roster = mission
            .match_pairs()
            .cloned()
            .ok_or_else(|| PickError::NotMatchMission(mission.id.clone()))?;
        let total_episodes = mission.total_episodes_or(config.default_match_episodes);
        let keys = StorageKeys::new(config.storage_prefix.clone(), mission.id.clone());

        let state = SessionState {
            drafts: DraftStore::new(
                collaborators.storage.clone(),
                keys.clone(),
                config.persist_drafts,
            ),
            ledger: SubmissionLedger::new(collaborators.storage, keys),
            selection: EpisodeSelection::new(total_episodes),
            drag: DragController::new(),
            bounds: BoundsRegistry::new(),
            in_flight: BTreeSet::new(),
            pending_submit: None,
        };

        Ok(Self {
            config,
            mission,
            roster,
            total_episodes,
            gateway: collaborators.gateway,
            identity: collaborators.identity,
            events: collaborators.events,
            state: Arc::new(RwLock::new(state)),
        })
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn config(&self) -> &PickConfig {
        &self.config
    }

    pub fn total_episodes(&self) -> u32 {
        self.total_episodes
    }

    pub fn events(&self) -> &VoteEvents {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoteEvent> {
        self.events.subscribe()
    }

    /// A results view over the same gateway and mission.
    pub fn aggregation_view(&self) -> AggregationView {
        AggregationView::new(self.gateway.clone(), self.mission.id.clone())
    }

    // ==================== Loading ====================

    /// Restore picks and submitted flags.
    ///
    /// Signed-in users get their remote votes first; client storage fills the
    /// remaining episodes. A failing backend falls back to client storage.
    pub async fn load(&self) -> LoadReport {
        let mut report = LoadReport::default();

        let remote = match self.identity.current_user_id().await {
            Some(user_id) => match self.gateway.get_all_votes(&user_id, &self.mission.id).await {
                Ok(votes) => votes,
                Err(e) => {
                    warn!(mission_id = %self.mission.id, error = %e, "Remote load failed, using client storage");
                    report.remote_error = Some(e.to_string());
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut state = self.state.write().await;
        for vote in remote {
            let episode_no = vote.episode_no;
            if episode_no == 0 || episode_no > self.total_episodes || vote.pairs.is_empty() {
                continue;
            }
            state.drafts.set_cached(episode_no, vote.pairs);
            if vote.submitted {
                state.ledger.record_remote(episode_no);
            }
            report.remote_episodes.push(episode_no);
        }

        report.local_episodes = state.drafts.load_from_storage(self.total_episodes);
        state.ledger.load_from_storage(self.total_episodes);
        report.submitted = state.ledger.episodes();

        info!(
            mission_id = %self.mission.id,
            remote = report.remote_episodes.len(),
            local = report.local_episodes,
            submitted = report.submitted.len(),
            "Loaded picks"
        );
        report
    }

    // ==================== Selection ====================

    /// Add or remove an episode from the selection. Cancels any drag.
    pub async fn toggle_episode(&self, episode_no: u32) -> Result<SelectionMode, PickError> {
        let mut state = self.state.write().await;
        state.selection.toggle(episode_no)?;
        state.drag.cancel();
        Ok(state.selection.mode())
    }

    /// Select exactly one episode. Cancels any drag.
    pub async fn select_episode(&self, episode_no: u32) -> Result<SelectionMode, PickError> {
        let mut state = self.state.write().await;
        state.selection.select_only(episode_no)?;
        state.drag.cancel();
        Ok(state.selection.mode())
    }

    pub async fn clear_selection(&self) -> SelectionMode {
        let mut state = self.state.write().await;
        state.selection.clear();
        state.drag.cancel();
        SelectionMode::Idle
    }

    pub async fn selection_mode(&self) -> SelectionMode {
        self.state.read().await.selection.mode()
    }

    pub async fn selected_episodes(&self) -> Vec<u32> {
        self.state.read().await.selection.selected()
    }

    /// Connections for the current selection.
    pub async fn displayed_connections(&self) -> Vec<Connection> {
        let state = self.state.read().await;
        state.selection.displayed(&state.drafts)
    }

    /// Grouped lines for the displayed connections.
    pub async fn connection_lines(&self) -> Vec<PairLine> {
        let state = self.state.read().await;
        connection_lines(&state.selection.displayed(&state.drafts), &state.bounds)
    }

    /// Whether the current selection can be edited.
    pub async fn can_edit(&self) -> bool {
        self.state.read().await.editable_episode(&self.mission).is_ok()
    }

    /// Selector badge for every episode.
    pub async fn episode_badges(&self) -> Vec<(u32, EpisodeBadge)> {
        let state = self.state.read().await;
        (1..=self.total_episodes)
            .map(|ep| {
                let badge = EpisodeBadge::for_episode(
                    self.mission.episode_status(ep),
                    state.ledger.is_submitted(ep),
                );
                (ep, badge)
            })
            .collect()
    }

    // ==================== Board geometry ====================

    pub async fn register_item_bounds(&self, side: Side, name: &str, bounds: Rect) {
        self.state.write().await.bounds.register_item(side, name, bounds);
    }

    /// Forget the bounds of a candidate that left the board.
    pub async fn unregister_item_bounds(&self, side: Side, name: &str) {
        self.state.write().await.bounds.unregister_item(side, name);
    }

    pub async fn set_column_area(&self, side: Side, area: Rect) {
        self.state.write().await.bounds.set_column_area(side, area);
    }

    pub async fn clear_bounds(&self) {
        self.state.write().await.bounds.clear();
    }

    // ==================== Editing ====================

    fn check_candidate(&self, side: Side, name: &str) -> Result<(), PickError> {
        if self.roster.contains(side, name) {
            Ok(())
        } else {
            Err(PickError::UnknownCandidate {
                side,
                name: name.to_string(),
            })
        }
    }

    /// Press on a candidate.
    pub async fn begin_drag(&self, side: Side, name: &str, pointer: PointerKind) -> Result<(), PickError> {
        self.check_candidate(side, name)?;

        let mut state = self.state.write().await;
        let episode_no = match state.editable_episode(&self.mission) {
            Ok(ep) => ep,
            Err(e) => {
                state.drag.cancel();
                debug!(error = %e, "Drag refused");
                return Err(e);
            }
        };
        state.drag.begin(episode_no, side, name, pointer);
        Ok(())
    }

    /// Pointer moved; returns the ghost line.
    pub async fn drag_to(&self, point: Point) -> Option<Segment> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.drag.move_to(point, &state.bounds)
    }

    pub async fn drag_state(&self) -> Option<DragState> {
        self.state.read().await.drag.active().cloned()
    }

    pub async fn cancel_drag(&self) {
        self.state.write().await.drag.cancel();
    }

    /// Release the pointer. Drag state is reset whatever the outcome.
    pub async fn end_drag(&self, point: Point) -> Result<DropOutcome, PickError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let Some(drag) = state.drag.finish() else {
            return Ok(DropOutcome::Idle);
        };
        let episode_no = state.editable_episode(&self.mission)?;
        if episode_no != drag.episode_no {
            return Ok(DropOutcome::Missed);
        }

        let drafts = &state.drafts;
        let target = resolve_target(point, &state.bounds, &self.roster, |side, name| {
            drafts.is_connected(episode_no, side, name)
        });
        let Some((side, name)) = target else {
            return Ok(DropOutcome::Missed);
        };
        if side != drag.side.opposite() {
            return Err(PickError::SameColumn);
        }
        self.check_candidate(side, &name)?;
        let pair = Pair::from_endpoints((drag.side, drag.item.as_str()), (side, name.as_str()))
            .ok_or(PickError::SameColumn)?;

        let change = state.drafts.connect(episode_no, pair.clone());
        debug!(episode_no, pair = %pair.key(), ?change, "Dropped connection");
        Ok(DropOutcome::Connected {
            episode_no,
            pair,
            change,
        })
    }

    /// Connect two candidates directly, with the same rules as a drop.
    pub async fn connect(&self, left: &str, right: &str) -> Result<ConnectOutcome, PickError> {
        self.check_candidate(Side::Left, left)?;
        self.check_candidate(Side::Right, right)?;

        let mut state = self.state.write().await;
        let episode_no = state.editable_episode(&self.mission)?;
        Ok(state.drafts.connect(episode_no, Pair::new(left, right)))
    }

    /// Remove a displayed connection by id. Returns false if it is not a pick
    /// of the edited episode.
    pub async fn remove_connection(&self, connection_id: &str) -> Result<bool, PickError> {
        let mut state = self.state.write().await;
        let episode_no = state.editable_episode(&self.mission)?;

        let pair = state
            .drafts
            .picks(episode_no)
            .iter()
            .find(|p| Connection::id_for(episode_no, p) == connection_id)
            .cloned();
        Ok(match pair {
            Some(pair) => state.drafts.disconnect(episode_no, &pair),
            None => false,
        })
    }

    pub async fn picks(&self, episode_no: u32) -> Vec<Pair> {
        self.state.read().await.drafts.picks(episode_no).to_vec()
    }

    // ==================== Submission ====================

    /// Submit the selected episode.
    ///
    /// Local state changes only after the backend accepted the write and the
    /// read-back matches the submitted pairs.
    pub async fn submit(&self) -> Result<SubmitReceipt, PickError> {
        let user_id = self.identity.current_user_id().await;

        let submission = {
            let mut state = self.state.write().await;
            let episode_no = state.editable_episode(&self.mission)?;
            let pairs = state.drafts.picks(episode_no).to_vec();
            if pairs.is_empty() {
                return Err(PickError::EmptyPicks);
            }
            let Some(user_id) = user_id else {
                state.pending_submit = Some(episode_no);
                info!(mission_id = %self.mission.id, episode_no, "Submission waiting for sign-in");
                return Err(PickError::NotSignedIn);
            };
            state.in_flight.insert(episode_no);
            state.drag.cancel();
            VoteSubmission::new(self.mission.id.clone(), user_id, episode_no, pairs)
        };

        let episode_no = submission.episode_no;
        info!(
            mission_id = %submission.mission_id,
            episode_no,
            pairs = submission.pairs.len(),
            "Submitting picks"
        );
        let result = self.persist_and_verify(&submission).await;

        let mut state = self.state.write().await;
        state.in_flight.remove(&episode_no);
        let stored = match result {
            Ok(vote) => vote,
            Err(e) => {
                warn!(mission_id = %submission.mission_id, episode_no, error = %e, "Submission failed");
                return Err(e);
            }
        };

        state.drafts.mirror(episode_no, stored.pairs.clone());
        state.ledger.mark_submitted(episode_no);
        if state.pending_submit == Some(episode_no) {
            state.pending_submit = None;
        }
        drop(state);

        self.events.publish(VoteEvent::VoteSubmitted {
            mission_id: submission.mission_id.clone(),
            user_id: submission.user_id.clone(),
            episode_no,
            origin: self.config.client_id.clone(),
        });
        info!(mission_id = %submission.mission_id, episode_no, "Submission verified");

        Ok(SubmitReceipt {
            episode_no,
            submitted_at: stored.submitted_at.unwrap_or(submission.submitted_at),
            pairs: stored.pairs,
        })
    }

    /// Write and read back under one deadline covering both calls.
    async fn persist_and_verify(&self, submission: &VoteSubmission) -> Result<MatchVote, PickError> {
        timeout(self.config.submit_timeout(), self.write_and_read_back(submission))
            .await
            .map_err(|_| PickError::Timeout {
                episode: submission.episode_no,
                after_ms: self.config.submit_timeout_ms,
            })?
    }

    async fn write_and_read_back(&self, submission: &VoteSubmission) -> Result<MatchVote, PickError> {
        let episode_no = submission.episode_no;
        if !self.gateway.submit_vote(submission).await? {
            return Err(PickError::Rejected(episode_no));
        }

        let stored = self
            .gateway
            .get_vote(&submission.user_id, &submission.mission_id, episode_no)
            .await?;

        match stored {
            Some(vote) if vote.matches_pairs(&submission.pairs) => Ok(vote),
            Some(_) => {
                warn!(episode_no, "Stored picks differ from submitted picks");
                Err(PickError::VerificationFailed(episode_no))
            }
            None => {
                warn!(episode_no, "Submitted vote not found on read-back");
                Err(PickError::VerificationFailed(episode_no))
            }
        }
    }

    /// Retry a submit that stopped at sign-in. `Ok(None)` when nothing is pending.
    pub async fn resume_pending_submission(&self) -> Result<Option<SubmitReceipt>, PickError> {
        let episode_no = {
            let mut state = self.state.write().await;
            let Some(episode_no) = state.pending_submit.take() else {
                return Ok(None);
            };
            state.selection.select_only(episode_no)?;
            state.drag.cancel();
            episode_no
        };
        debug!(episode_no, "Resuming pending submission");
        self.submit().await.map(Some)
    }

    pub async fn pending_submission(&self) -> Option<u32> {
        self.state.read().await.pending_submit
    }

    /// Whether any submission is waiting for the backend.
    pub async fn is_submitting(&self) -> bool {
        !self.state.read().await.in_flight.is_empty()
    }

    pub async fn submitted_episodes(&self) -> Vec<u32> {
        self.state.read().await.ledger.episodes()
    }

    pub async fn is_submitted(&self, episode_no: u32) -> bool {
        self.state.read().await.ledger.is_submitted(episode_no)
    }

    // ==================== Housekeeping ====================

    /// Forget every local draft and submitted flag of the mission.
    pub async fn clear_local_data(&self) {
        {
            let mut state = self.state.write().await;
            state.drafts.clear_all(self.total_episodes);
            state.ledger.clear_all(self.total_episodes);
            state.drag.cancel();
            state.pending_submit = None;
        }
        info!(mission_id = %self.mission.id, "Cleared local pick data");
        self.events.publish(VoteEvent::PicksCleared {
            mission_id: self.mission.id.clone(),
            origin: self.config.client_id.clone(),
        });
    }

    /// Score of the first episode whose picks contain the whole final answer.
    pub async fn settled_score(&self) -> Option<EpisodeScore> {
        if self.mission.status != MissionStatus::Settled {
            return None;
        }
        let answer = self.mission.final_answer.as_deref()?;
        let state = self.state.read().await;
        first_correct_episode(state.drafts.all(), answer, self.total_episodes)
    }

    /// Participant count shown on the mission card.
    pub async fn display_participants(&self) -> u32 {
        if self.mission.stats.participants > 0 {
            return self.mission.stats.participants;
        }
        if self.state.read().await.ledger.is_empty() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use crate::identity::SessionIdentity;
    use crate::storage::MemoryStorage;
    use realpick_model::EpisodeStatus;

    fn mission() -> Mission {
        Mission::matching("m1", "Who ends up together?", MatchPairs::new(["A", "B"], ["X", "Y"]), 8)
            .with_episode_status(2, EpisodeStatus::Open)
            .with_episode_status(3, EpisodeStatus::Settled)
    }

    fn session_with(gateway: Arc<MemoryGateway>, user: Option<&str>) -> PickSession {
        let identity = match user {
            Some(id) => SessionIdentity::signed_in(id),
            None => SessionIdentity::anonymous(),
        };
        PickSession::new(
            mission(),
            Collaborators {
                gateway,
                storage: Arc::new(MemoryStorage::new()),
                identity: Arc::new(identity),
                events: VoteEvents::default(),
            },
            PickConfig::for_testing(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_rejects_non_match_mission() {
        let mut no_roster = mission();
        no_roster.options = None;
        let mut binary = mission();
        binary.form = realpick_model::MissionForm::Binary;

        for plain in [no_roster, binary] {
            let result = PickSession::new(
                plain,
                Collaborators {
                    gateway: Arc::new(MemoryGateway::new()),
                    storage: Arc::new(MemoryStorage::new()),
                    identity: Arc::new(SessionIdentity::anonymous()),
                    events: VoteEvents::default(),
                },
                PickConfig::default(),
            );
            assert!(matches!(result, Err(PickError::NotMatchMission(_))));
        }
    }

    #[tokio::test]
    async fn test_edit_requires_single_open_episode() {
        let session = session_with(Arc::new(MemoryGateway::new()), Some("u1"));
        assert!(matches!(
            session.connect("A", "X").await,
            Err(PickError::NoEpisodeSelected)
        ));

        session.toggle_episode(1).await.unwrap();
        session.toggle_episode(2).await.unwrap();
        assert!(matches!(
            session.connect("A", "X").await,
            Err(PickError::MultipleEpisodesSelected)
        ));

        session.select_episode(3).await.unwrap();
        assert!(matches!(
            session.connect("A", "X").await,
            Err(PickError::EpisodeNotOpen { episode: 3, status: EpisodeStatus::Settled })
        ));

        session.select_episode(4).await.unwrap();
        assert!(matches!(
            session.begin_drag(Side::Left, "A", PointerKind::Mouse).await,
            Err(PickError::EpisodeNotOpen { episode: 4, status: EpisodeStatus::Locked })
        ));
        assert!(session.drag_state().await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_candidate() {
        let session = session_with(Arc::new(MemoryGateway::new()), Some("u1"));
        session.select_episode(1).await.unwrap();
        assert!(matches!(
            session.connect("A", "Q").await,
            Err(PickError::UnknownCandidate { side: Side::Right, .. })
        ));
    }

    #[tokio::test]
    async fn test_drop_on_stray_bounds_never_picks_outsider() {
        let session = session_with(Arc::new(MemoryGateway::new()), Some("u1"));
        session.set_column_area(Side::Right, Rect::new(200.0, 0.0, 100.0, 300.0)).await;
        session.register_item_bounds(Side::Left, "A", Rect::new(10.0, 10.0, 80.0, 40.0)).await;
        session.register_item_bounds(Side::Right, "X", Rect::new(210.0, 10.0, 80.0, 40.0)).await;
        session.register_item_bounds(Side::Right, "Ghost", Rect::new(210.0, 200.0, 80.0, 40.0)).await;
        session.register_item_bounds(Side::Right, "Stale", Rect::new(400.0, 10.0, 80.0, 40.0)).await;
        session.select_episode(1).await.unwrap();

        // outside the column area: missed, nothing recorded
        session.begin_drag(Side::Left, "A", PointerKind::Mouse).await.unwrap();
        let outcome = session.end_drag(Point::new(440.0, 30.0)).await.unwrap();
        assert_eq!(outcome, DropOutcome::Missed);
        assert!(session.picks(1).await.is_empty());

        // inside the column: snaps to the nearest roster candidate
        session.begin_drag(Side::Left, "A", PointerKind::Mouse).await.unwrap();
        let outcome = session.end_drag(Point::new(250.0, 220.0)).await.unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Connected {
                episode_no: 1,
                pair: Pair::new("A", "X"),
                change: ConnectOutcome::Added,
            }
        );
        assert_eq!(session.picks(1).await, vec![Pair::new("A", "X")]);
    }

    #[tokio::test]
    async fn test_unregistered_bounds_stop_hitting() {
        let session = session_with(Arc::new(MemoryGateway::new()), Some("u1"));
        session.register_item_bounds(Side::Left, "A", Rect::new(10.0, 10.0, 80.0, 40.0)).await;
        session.register_item_bounds(Side::Right, "X", Rect::new(210.0, 10.0, 80.0, 40.0)).await;
        session.unregister_item_bounds(Side::Right, "X").await;
        session.select_episode(1).await.unwrap();

        session.begin_drag(Side::Left, "A", PointerKind::Touch).await.unwrap();
        let outcome = session.end_drag(Point::new(250.0, 30.0)).await.unwrap();
        assert_eq!(outcome, DropOutcome::Missed);
        assert!(session.picks(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_drop_on_own_column() {
        let session = session_with(Arc::new(MemoryGateway::new()), Some("u1"));
        session.register_item_bounds(Side::Left, "A", Rect::new(10.0, 10.0, 80.0, 40.0)).await;
        session.register_item_bounds(Side::Left, "B", Rect::new(10.0, 110.0, 80.0, 40.0)).await;
        session.select_episode(1).await.unwrap();

        session.begin_drag(Side::Left, "A", PointerKind::Mouse).await.unwrap();
        assert!(matches!(
            session.end_drag(Point::new(50.0, 130.0)).await,
            Err(PickError::SameColumn)
        ));
        assert!(session.picks(1).await.is_empty());
        assert!(session.drag_state().await.is_none());
    }

    #[tokio::test]
    async fn test_remove_connection() {
        let session = session_with(Arc::new(MemoryGateway::new()), Some("u1"));
        session.select_episode(1).await.unwrap();
        session.connect("A", "X").await.unwrap();

        assert!(!session.remove_connection("2-A-X").await.unwrap());
        assert!(session.remove_connection("1-A-X").await.unwrap());
        assert!(session.displayed_connections().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_requires_picks() {
        let session = session_with(Arc::new(MemoryGateway::new()), Some("u1"));
        session.select_episode(1).await.unwrap();
        assert!(matches!(session.submit().await, Err(PickError::EmptyPicks)));
    }

    #[tokio::test]
    async fn test_rejected_submission_keeps_drafts() {
        let gateway = Arc::new(MemoryGateway::new().with_write_mode(crate::gateway::WriteMode::Reject));
        let session = session_with(gateway.clone(), Some("u1"));
        session.select_episode(1).await.unwrap();
        session.connect("A", "X").await.unwrap();

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, PickError::Rejected(1)));
        assert!(err.is_retryable());
        assert!(!session.is_submitted(1).await);
        assert!(!session.is_submitting().await);
        assert_eq!(session.picks(1).await, vec![Pair::new("A", "X")]);
        assert!(session.can_edit().await);
    }

    #[tokio::test]
    async fn test_badges() {
        let gateway = Arc::new(MemoryGateway::new());
        let session = session_with(gateway, Some("u1"));
        session.select_episode(1).await.unwrap();
        session.connect("A", "X").await.unwrap();
        session.submit().await.unwrap();

        let badges = session.episode_badges().await;
        assert_eq!(badges.len(), 8);
        assert_eq!(badges[0], (1, EpisodeBadge::OpenParticipated));
        assert_eq!(badges[1], (2, EpisodeBadge::OpenNotParticipated));
        assert_eq!(badges[2], (3, EpisodeBadge::ClosedNotParticipated));
        assert_eq!(badges[3], (4, EpisodeBadge::Preview));
    }

    #[tokio::test]
    async fn test_display_participants() {
        let session = session_with(Arc::new(MemoryGateway::new()), Some("u1"));
        assert_eq!(session.display_participants().await, 0);

        session.select_episode(1).await.unwrap();
        session.connect("A", "X").await.unwrap();
        session.submit().await.unwrap();
        assert_eq!(session.display_participants().await, 1);
    }

    #[tokio::test]
    async fn test_settled_score() {
        let settled = mission().with_final_answer(vec![Pair::new("A", "Y")]);
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set("rp_matchpick_m1_2", r#"[{"left":"A","right":"Y"}]"#)
            .unwrap();

        let session = PickSession::new(
            settled,
            Collaborators {
                gateway: Arc::new(MemoryGateway::new()),
                storage,
                identity: Arc::new(SessionIdentity::anonymous()),
                events: VoteEvents::default(),
            },
            PickConfig::default(),
        )
        .unwrap();
        assert!(session.settled_score().await.is_none());

        session.load().await;
        let score = session.settled_score().await.unwrap();
        assert_eq!(score.episode_no, 2);
        assert_eq!(score.score, 90);
    }
}
