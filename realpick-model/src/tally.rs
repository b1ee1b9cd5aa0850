//! Cross-user pair tallies.
//!
//! Tallies are computed by the backend (or by a gateway from raw vote rows):
//! every pair of every vote in scope counts once, and participants are the
//! distinct users that own at least one of those votes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::pick::Pair;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Pair counts for an episode scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AggregateTally {
    /// `"{left}-{right}"` to number of votes containing that pair
    pub pair_counts: BTreeMap<String, u32>,
    /// Distinct users with a vote in scope
    pub total_participants: u32,
}

/// One row of a ranked tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RankedPair {
    pub key: String,
    pub count: u32,
    /// Whole percent of participants
    pub percentage: u32,
}

impl AggregateTally {
    /// Empty tally.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a tally from `(user_id, pairs)` vote rows.
    pub fn from_votes<'a, I>(votes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [Pair])>,
    {
        let mut pair_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut users: HashSet<&'a str> = HashSet::new();

        for (user_id, pairs) in votes {
            users.insert(user_id);
            for pair in pairs {
                *pair_counts.entry(pair.key()).or_insert(0) += 1;
            }
        }

        Self {
            pair_counts,
            total_participants: users.len() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pair_counts.is_empty()
    }

    /// Rank pairs by count, highest first, ties by key.
    ///
    /// Percentages are `round(count / participants * 100)` and 0 without
    /// participants. When every participant contributes at most one pair the
    /// rounded shares are trimmed so they never add up past 100.
    pub fn ranked(&self) -> Vec<RankedPair> {
        let mut ranked: Vec<RankedPair> = self
            .pair_counts
            .iter()
            .map(|(key, count)| RankedPair {
                key: key.clone(),
                count: *count,
                percentage: 0,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

        if self.total_participants == 0 {
            return ranked;
        }

        let total = self.total_participants as f64;
        let exact: Vec<f64> = ranked
            .iter()
            .map(|row| row.count as f64 / total * 100.0)
            .collect();
        for (row, share) in ranked.iter_mut().zip(&exact) {
            row.percentage = share.round() as u32;
        }

        let counted: u64 = ranked.iter().map(|row| row.count as u64).sum();
        let rounded_sum: u32 = ranked.iter().map(|row| row.percentage).sum();
        if counted <= self.total_participants as u64 && rounded_sum > 100 {
            let mut by_overshoot: Vec<usize> = (0..ranked.len()).collect();
            by_overshoot.sort_by(|&a, &b| {
                let over_a = ranked[a].percentage as f64 - exact[a];
                let over_b = ranked[b].percentage as f64 - exact[b];
                over_b.total_cmp(&over_a)
            });
            for &index in by_overshoot.iter().take((rounded_sum - 100) as usize) {
                ranked[index].percentage = ranked[index].percentage.saturating_sub(1);
            }
        }

        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(counts: &[(&str, u32)], participants: u32) -> AggregateTally {
        AggregateTally {
            pair_counts: counts.iter().map(|(k, c)| (k.to_string(), *c)).collect(),
            total_participants: participants,
        }
    }

    #[test]
    fn test_ranked_percentages() {
        let ranked = tally(&[("B-Y", 5), ("A-X", 10)], 15).ranked();
        assert_eq!(ranked[0].key, "A-X");
        assert_eq!(ranked[0].percentage, 67);
        assert_eq!(ranked[1].key, "B-Y");
        assert_eq!(ranked[1].percentage, 33);
    }

    #[test]
    fn test_zero_participants() {
        let ranked = tally(&[("A-X", 3), ("B-Y", 1)], 0).ranked();
        assert!(ranked.iter().all(|row| row.percentage == 0));
    }

    #[test]
    fn test_single_pair_shares_never_exceed_hundred() {
        // 8 users, one pair each: 12.5% rounds up to 13% for every pair
        let counts: Vec<(String, u32)> = (0..8).map(|i| (format!("L{}-R{}", i, i), 1)).collect();
        let refs: Vec<(&str, u32)> = counts.iter().map(|(k, c)| (k.as_str(), *c)).collect();
        let ranked = tally(&refs, 8).ranked();

        let sum: u32 = ranked.iter().map(|row| row.percentage).sum();
        assert!(sum <= 100, "sum was {}", sum);
        assert!(ranked.iter().all(|row| row.percentage == 12 || row.percentage == 13));
    }

    #[test]
    fn test_ties_sorted_by_key() {
        let ranked = tally(&[("C-Z", 2), ("A-X", 2)], 4).ranked();
        assert_eq!(ranked[0].key, "A-X");
        assert_eq!(ranked[1].key, "C-Z");
    }

    #[test]
    fn test_from_votes_counts_unique_users() {
        let ep1 = vec![Pair::new("A", "X"), Pair::new("B", "Y")];
        let ep2 = vec![Pair::new("A", "X")];
        let other = vec![Pair::new("A", "Y")];

        let tally = AggregateTally::from_votes(vec![
            ("u1", ep1.as_slice()),
            ("u1", ep2.as_slice()),
            ("u2", other.as_slice()),
        ]);

        assert_eq!(tally.total_participants, 2);
        assert_eq!(tally.pair_counts["A-X"], 2);
        assert_eq!(tally.pair_counts["B-Y"], 1);
        assert_eq!(tally.pair_counts["A-Y"], 1);
    }
}
