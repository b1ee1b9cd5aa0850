//! Connection lines for rendering.

use realpick_model::{Connection, Pair, Side};

use crate::geometry::{BoundsRegistry, Segment};

/// A displayed pair with every episode that contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedPair {
    pub key: String,
    pub pair: Pair,
    /// Ascending, no duplicates
    pub episodes: Vec<u32>,
}

/// A grouped pair with its on-screen segment.
#[derive(Debug, Clone, PartialEq)]
pub struct PairLine {
    pub key: String,
    pub pair: Pair,
    pub episodes: Vec<u32>,
    /// Left item's right edge to right item's left edge, at vertical mid-points
    pub segment: Segment,
}

/// Group connections by pair key, keeping first-seen order.
pub fn group_connections(connections: &[Connection]) -> Vec<GroupedPair> {
    let mut groups: Vec<GroupedPair> = Vec::new();
    for connection in connections {
        let pair = connection.pair();
        let key = pair.key();
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.episodes.push(connection.episode_no),
            None => groups.push(GroupedPair {
                key,
                pair,
                episodes: vec![connection.episode_no],
            }),
        }
    }
    for group in &mut groups {
        group.episodes.sort_unstable();
        group.episodes.dedup();
    }
    groups
}

/// Lines for every grouped pair whose two candidates have registered bounds.
pub fn connection_lines(connections: &[Connection], registry: &BoundsRegistry) -> Vec<PairLine> {
    group_connections(connections)
        .into_iter()
        .filter_map(|group| {
            let left = registry.item_bounds(Side::Left, &group.pair.left)?;
            let right = registry.item_bounds(Side::Right, &group.pair.right)?;
            Some(PairLine {
                key: group.key,
                pair: group.pair,
                episodes: group.episodes,
                segment: Segment {
                    start: left.right_mid(),
                    end: right.left_mid(),
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};

    #[test]
    fn test_grouping() {
        let ax = Pair::new("A", "X");
        let by = Pair::new("B", "Y");
        let connections = vec![
            Connection::new(3, &ax),
            Connection::new(1, &by),
            Connection::new(1, &ax),
        ];

        let groups = group_connections(&connections);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "A-X");
        assert_eq!(groups[0].episodes, vec![1, 3]);
        assert_eq!(groups[1].episodes, vec![1]);
    }

    #[test]
    fn test_lines_need_bounds() {
        let mut registry = BoundsRegistry::new();
        registry.register_item(Side::Left, "A", Rect::new(0.0, 0.0, 100.0, 40.0));
        registry.register_item(Side::Right, "X", Rect::new(200.0, 100.0, 100.0, 40.0));

        let connections = vec![
            Connection::new(1, &Pair::new("A", "X")),
            Connection::new(1, &Pair::new("B", "Y")),
        ];
        let lines = connection_lines(&connections, &registry);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].segment.start, Point::new(100.0, 20.0));
        assert_eq!(lines[0].segment.end, Point::new(200.0, 120.0));
    }
}
