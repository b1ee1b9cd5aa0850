//! Picks and connections.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Column of the matching board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// One predicted couple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Pair {
    pub left: String,
    pub right: String,
}

impl Pair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Build a pair from two endpoints given in either column order.
    pub fn from_endpoints(a: (Side, &str), b: (Side, &str)) -> Option<Self> {
        match (a, b) {
            ((Side::Left, left), (Side::Right, right)) | ((Side::Right, right), (Side::Left, left)) => {
                Some(Self::new(left, right))
            }
            _ => None,
        }
    }

    /// Whether the pair uses `name` on the given side.
    pub fn involves(&self, side: Side, name: &str) -> bool {
        match side {
            Side::Left => self.left == name,
            Side::Right => self.right == name,
        }
    }

    /// Whether this pair shares either endpoint with `other`.
    pub fn shares_endpoint(&self, other: &Pair) -> bool {
        self.left == other.left || self.right == other.right
    }

    /// Tally key, `"{left}-{right}"`.
    pub fn key(&self) -> String {
        pair_key(&self.left, &self.right)
    }
}

/// Tally key of a couple.
pub fn pair_key(left: &str, right: &str) -> String {
    format!("{}-{}", left, right)
}

/// A pick as displayed on the board, tagged with its episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// `"{episode}-{left}-{right}"`
    pub id: String,
    pub left: String,
    pub right: String,
    pub episode_no: u32,
}

impl Connection {
    pub fn new(episode_no: u32, pair: &Pair) -> Self {
        Self {
            id: Self::id_for(episode_no, pair),
            left: pair.left.clone(),
            right: pair.right.clone(),
            episode_no,
        }
    }

    pub fn id_for(episode_no: u32, pair: &Pair) -> String {
        format!("{}-{}-{}", episode_no, pair.left, pair.right)
    }

    pub fn pair(&self) -> Pair {
        Pair::new(self.left.clone(), self.right.clone())
    }
}
