//! Points for settled couple-matching missions.
//!
//! Earlier episodes are worth more: 100 points for episode 1, ten fewer for
//! each later episode, never below 30.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pick::Pair;

#[cfg(feature = "typescript")]
use ts_rs::TS;

const FIRST_EPISODE_SCORE: i64 = 100;
const EPISODE_DECAY: i64 = 10;
const MIN_EPISODE_SCORE: i64 = 30;

/// The first episode whose picks contained the whole final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EpisodeScore {
    pub episode_no: u32,
    pub score: u32,
}

/// Score available for a correct pick made in `episode_no`.
pub fn score_for_episode(episode_no: u32) -> u32 {
    let decayed = FIRST_EPISODE_SCORE - (episode_no.max(1) as i64 - 1) * EPISODE_DECAY;
    decayed.max(MIN_EPISODE_SCORE) as u32
}

/// Points for an episode: its score when correct, the negated score otherwise.
pub fn match_points(episode_no: u32, correct: bool) -> i64 {
    let base = score_for_episode(episode_no) as i64;
    if correct {
        base
    } else {
        -base
    }
}

/// Find the first episode (1..=total) whose picks include every final-answer pair.
pub fn first_correct_episode(
    picks: &BTreeMap<u32, Vec<Pair>>,
    final_answer: &[Pair],
    total_episodes: u32,
) -> Option<EpisodeScore> {
    (1..=total_episodes).find_map(|episode_no| {
        let episode_picks = picks.get(&episode_no).filter(|p| !p.is_empty())?;
        final_answer
            .iter()
            .all(|answer| episode_picks.contains(answer))
            .then(|| EpisodeScore {
                episode_no,
                score: score_for_episode(episode_no),
            })
    })
}
