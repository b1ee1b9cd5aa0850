//! Drag-to-connect gestures.
//!
//! Mouse and touch drags go through the same controller. The controller only
//! tracks the gesture and resolves the drop target; whether an edit is allowed
//! and what it does to the drafts is decided by the session.

use realpick_model::{MatchPairs, Side};
use serde::{Deserialize, Serialize};

use crate::geometry::{BoundsRegistry, Point, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// A drag in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    /// Episode being edited when the drag began
    pub episode_no: u32,
    pub side: Side,
    pub item: String,
    pub pointer: PointerKind,
    /// From the dragged item's centre to the pointer
    pub ghost: Option<Segment>,
}

#[derive(Debug, Default)]
pub struct DragController {
    active: Option<DragState>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a drag, replacing any drag already in progress.
    pub fn begin(&mut self, episode_no: u32, side: Side, item: impl Into<String>, pointer: PointerKind) {
        self.active = Some(DragState {
            episode_no,
            side,
            item: item.into(),
            pointer,
            ghost: None,
        });
    }

    pub fn active(&self) -> Option<&DragState> {
        self.active.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Update the ghost line. `None` when idle or the item has no bounds.
    pub fn move_to(&mut self, point: Point, registry: &BoundsRegistry) -> Option<Segment> {
        let state = self.active.as_mut()?;
        state.ghost = registry
            .item_bounds(state.side, &state.item)
            .map(|rect| Segment {
                start: rect.center(),
                end: point,
            });
        state.ghost
    }

    /// End the gesture and hand back its state.
    pub fn finish(&mut self) -> Option<DragState> {
        self.active.take()
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }
}

/// Candidate under a drop point.
///
/// An exact hit on the bounds of a roster candidate wins. Otherwise, inside a
/// column area, the nearest candidate of that column that `is_connected` does
/// not report as already used. Bounds registered under names missing from the
/// roster are never a target.
pub fn resolve_target<F>(
    point: Point,
    registry: &BoundsRegistry,
    roster: &MatchPairs,
    is_connected: F,
) -> Option<(Side, String)>
where
    F: Fn(Side, &str) -> bool,
{
    if let Some((side, name)) = registry.item_at(point) {
        if roster.contains(side, name) {
            return Some((side, name.to_string()));
        }
    }
    let side = registry.column_at(point)?;
    registry
        .nearest(side, roster.column(side), point, |name| is_connected(side, name))
        .map(|name| (side, name.to_string()))
}
