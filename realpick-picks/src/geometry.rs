//! Board geometry: points, rectangles and the bounds registry used for
//! hit-testing drops.

use realpick_model::Side;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Inclusive of the edges.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn left_mid(&self) -> Point {
        Point::new(self.x, self.y + self.height / 2.0)
    }

    pub fn right_mid(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height / 2.0)
    }
}

/// A straight line between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// Screen bounds of candidates and column areas.
#[derive(Debug, Clone, Default)]
pub struct BoundsRegistry {
    items: BTreeMap<(Side, String), Rect>,
    columns: BTreeMap<Side, Rect>,
}

impl BoundsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_item(&mut self, side: Side, name: impl Into<String>, bounds: Rect) {
        self.items.insert((side, name.into()), bounds);
    }

    pub fn unregister_item(&mut self, side: Side, name: &str) {
        self.items.remove(&(side, name.to_string()));
    }

    pub fn set_column_area(&mut self, side: Side, area: Rect) {
        self.columns.insert(side, area);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.columns.clear();
    }

    pub fn item_bounds(&self, side: Side, name: &str) -> Option<Rect> {
        self.items.get(&(side, name.to_string())).copied()
    }

    /// Candidate whose bounds contain the point.
    pub fn item_at(&self, point: Point) -> Option<(Side, &str)> {
        self.items
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|((side, name), _)| (*side, name.as_str()))
    }

    /// Column whose area contains the point.
    pub fn column_at(&self, point: Point) -> Option<Side> {
        self.columns
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(side, _)| *side)
    }

    /// Nearest registered candidate of `roster` by centre distance, skipping
    /// names for which `skip` is true. Ties go to the earlier roster entry.
    pub fn nearest<'a, F>(&self, side: Side, roster: &'a [String], point: Point, skip: F) -> Option<&'a str>
    where
        F: Fn(&str) -> bool,
    {
        let mut best: Option<(&'a str, f64)> = None;
        for name in roster {
            if skip(name) {
                continue;
            }
            let Some(rect) = self.item_bounds(side, name) else {
                continue;
            };
            let distance = rect.center().distance_to(point);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((name.as_str(), distance));
            }
        }
        best.map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BoundsRegistry {
        let mut registry = BoundsRegistry::new();
        registry.set_column_area(Side::Left, Rect::new(0.0, 0.0, 100.0, 300.0));
        registry.set_column_area(Side::Right, Rect::new(200.0, 0.0, 100.0, 300.0));
        registry.register_item(Side::Left, "A", Rect::new(10.0, 10.0, 80.0, 40.0));
        registry.register_item(Side::Right, "X", Rect::new(210.0, 10.0, 80.0, 40.0));
        registry.register_item(Side::Right, "Y", Rect::new(210.0, 110.0, 80.0, 40.0));
        registry
    }

    #[test]
    fn test_rect_points() {
        let rect = Rect::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(rect.center(), Point::new(60.0, 40.0));
        assert_eq!(rect.left_mid(), Point::new(10.0, 40.0));
        assert_eq!(rect.right_mid(), Point::new(110.0, 40.0));
        assert!(rect.contains(Point::new(110.0, 60.0)));
        assert!(!rect.contains(Point::new(111.0, 60.0)));
    }

    #[test]
    fn test_hit_tests() {
        let registry = registry();
        assert_eq!(registry.item_at(Point::new(250.0, 20.0)), Some((Side::Right, "X")));
        assert_eq!(registry.item_at(Point::new(250.0, 80.0)), None);
        assert_eq!(registry.column_at(Point::new(250.0, 80.0)), Some(Side::Right));
        assert_eq!(registry.column_at(Point::new(150.0, 80.0)), None);
    }

    #[test]
    fn test_nearest_skips() {
        let registry = registry();
        let roster = vec!["X".to_string(), "Y".to_string(), "Z".to_string()];
        let point = Point::new(250.0, 60.0);
        assert_eq!(registry.nearest(Side::Right, &roster, point, |_| false), Some("X"));
        assert_eq!(registry.nearest(Side::Right, &roster, point, |n| n == "X"), Some("Y"));
        assert_eq!(registry.nearest(Side::Right, &roster, point, |_| true), None);
    }
}
