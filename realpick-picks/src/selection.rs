//! Episode selection state machine.

use realpick_model::Connection;
use std::collections::BTreeSet;

use crate::draft::DraftStore;
use crate::error::PickError;

/// What the current selection allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Nothing selected; nothing displayed
    Idle,
    /// One episode; editable when open and not submitted
    SingleEdit(u32),
    /// Several episodes, ascending; read-only
    MultiView(Vec<u32>),
}

impl SelectionMode {
    pub fn single(&self) -> Option<u32> {
        match self {
            SelectionMode::SingleEdit(ep) => Some(*ep),
            _ => None,
        }
    }
}

/// Selected episodes of a mission with `total` episodes.
#[derive(Debug, Clone)]
pub struct EpisodeSelection {
    selected: BTreeSet<u32>,
    total: u32,
}

impl EpisodeSelection {
    pub fn new(total_episodes: u32) -> Self {
        Self {
            selected: BTreeSet::new(),
            total: total_episodes,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    fn check_range(&self, episode_no: u32) -> Result<(), PickError> {
        if episode_no == 0 || episode_no > self.total {
            return Err(PickError::EpisodeOutOfRange {
                episode: episode_no,
                total: self.total,
            });
        }
        Ok(())
    }

    /// Add or remove an episode. Returns true if it is now selected.
    pub fn toggle(&mut self, episode_no: u32) -> Result<bool, PickError> {
        self.check_range(episode_no)?;
        if self.selected.remove(&episode_no) {
            Ok(false)
        } else {
            self.selected.insert(episode_no);
            Ok(true)
        }
    }

    /// Select exactly one episode.
    pub fn select_only(&mut self, episode_no: u32) -> Result<(), PickError> {
        self.check_range(episode_no)?;
        self.selected.clear();
        self.selected.insert(episode_no);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> Vec<u32> {
        self.selected.iter().copied().collect()
    }

    pub fn is_selected(&self, episode_no: u32) -> bool {
        self.selected.contains(&episode_no)
    }

    pub fn mode(&self) -> SelectionMode {
        match self.selected.len() {
            0 => SelectionMode::Idle,
            1 => SelectionMode::SingleEdit(*self.selected.iter().next().unwrap_or(&0)),
            _ => SelectionMode::MultiView(self.selected()),
        }
    }

    /// Connections to display, derived from the drafts on every call.
    pub fn displayed(&self, drafts: &DraftStore) -> Vec<Connection> {
        self.selected
            .iter()
            .flat_map(|&ep| drafts.picks(ep).iter().map(move |pair| Connection::new(ep, pair)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageKeys};
    use realpick_model::Pair;
    use std::sync::Arc;

    fn drafts() -> DraftStore {
        DraftStore::new(
            Arc::new(MemoryStorage::new()),
            StorageKeys::new("rp_matchpick", "m1"),
            false,
        )
    }

    #[test]
    fn test_modes() {
        let mut selection = EpisodeSelection::new(8);
        assert_eq!(selection.mode(), SelectionMode::Idle);

        assert!(selection.toggle(3).unwrap());
        assert_eq!(selection.mode(), SelectionMode::SingleEdit(3));

        selection.toggle(1).unwrap();
        assert_eq!(selection.mode(), SelectionMode::MultiView(vec![1, 3]));

        assert!(!selection.toggle(3).unwrap());
        assert_eq!(selection.mode(), SelectionMode::SingleEdit(1));

        selection.clear();
        assert_eq!(selection.mode(), SelectionMode::Idle);
    }

    #[test]
    fn test_out_of_range() {
        let mut selection = EpisodeSelection::new(8);
        assert!(matches!(
            selection.toggle(0),
            Err(PickError::EpisodeOutOfRange { episode: 0, total: 8 })
        ));
        assert!(selection.toggle(9).is_err());
        assert!(selection.select_only(9).is_err());
        assert_eq!(selection.mode(), SelectionMode::Idle);
    }

    #[test]
    fn test_displayed_follows_selection() {
        let mut drafts = drafts();
        drafts.connect(1, Pair::new("A", "X"));
        drafts.connect(2, Pair::new("B", "Y"));

        let mut selection = EpisodeSelection::new(8);
        assert!(selection.displayed(&drafts).is_empty());

        selection.toggle(2).unwrap();
        selection.toggle(1).unwrap();
        let shown = selection.displayed(&drafts);
        let ids: Vec<&str> = shown.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1-A-X", "2-B-Y"]);

        selection.clear();
        assert!(selection.displayed(&drafts).is_empty());
        selection.toggle(1).unwrap();
        assert_eq!(selection.displayed(&drafts), vec![Connection::new(1, &Pair::new("A", "X"))]);
    }
}
