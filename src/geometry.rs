//! Axis-aligned geometry in CSS pixels.

use serde::{Deserialize, Serialize};

/// A point in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Content size in CSS pixels (e.g. a document's scroll extent).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle.
///
/// Width and height are never negative; bounds are inclusive on every edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Build a rectangle, mapping non-finite values to `0` and clamping the
    /// size to be non-negative.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: finite_or_zero(x),
            y: finite_or_zero(y),
            width: finite_or_zero(width).max(0.0),
            height: finite_or_zero(height).max(0.0),
        }
    }

    /// Square of half-width `radius` centered on `center`.
    pub fn around(center: Point, radius: f64) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        )
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Touching edges count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.x > self.right()
            || other.right() < self.x
            || other.y > self.bottom()
            || other.bottom() < self.y)
    }

    /// Euclidean distance from `point` to this rectangle's center.
    pub fn distance_to_center(&self, point: Point) -> f64 {
        let center = self.center();
        let dx = point.x - center.x;
        let dy = point.y - center.y;
        (dx * dx + dy * dy).sqrt()
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_clamps_negative_and_non_finite_values() {
        let rect = Rect::new(f64::NAN, 4.0, -10.0, f64::INFINITY);
        assert_eq!(rect, Rect::new(0.0, 4.0, 0.0, 0.0));
    }

    #[test]
    fn contains_is_inclusive_on_all_edges() {
        let rect = Rect::new(10.0, 10.0, 20.0, 5.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(30.0, 15.0)));
        assert!(!rect.contains(Point::new(30.1, 15.0)));
        assert!(!rect.contains(Point::new(9.9, 12.0)));
    }

    #[test]
    fn touching_edges_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(10.5, 0.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn zero_sized_rect_intersects_when_inside() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let dot = Rect::new(50.0, 50.0, 0.0, 0.0);
        assert!(outer.intersects(&dot));
        assert!(dot.intersects(&outer));
    }

    #[test]
    fn distance_to_center_is_euclidean() {
        let rect = Rect::new(0.0, 0.0, 6.0, 8.0);
        assert!((rect.distance_to_center(Point::new(0.0, 0.0)) - 5.0).abs() < 1e-9);
    }
}
