use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer pixel coordinate. May lie outside the document while a drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<egui::Pos2> for PixelPoint {
    fn from(pos: egui::Pos2) -> Self {
        Self::new(pos.x.floor() as i32, pos.y.floor() as i32)
    }
}

impl From<PixelPoint> for egui::Pos2 {
    fn from(point: PixelPoint) -> Self {
        egui::pos2(point.x as f32, point.y as f32)
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle of whole pixels.
///
/// `x`/`y` is the top-left pixel, the rectangle covers `width * height` pixels.
/// Any rectangle with a non-positive width or height is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const EMPTY: PixelRect = PixelRect { x: 0, y: 0, width: 0, height: 0 };

    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning two inclusive corner pixels, in any order.
    pub fn from_corners(a: PixelPoint, b: PixelPoint) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        let right = a.x.max(b.x);
        let bottom = a.y.max(b.y);
        Self::new(left, top, right - left + 1, bottom - top + 1)
    }

    /// Tight bounds of a point list (inclusive). Empty for an empty list.
    pub fn from_points(points: &[PixelPoint]) -> Self {
        let Some(first) = points.first() else {
            return Self::EMPTY;
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in &points[1..] {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    /// Last covered column (inclusive).
    pub fn right(&self) -> i32 {
        self.x + self.width - 1
    }

    /// Last covered row (inclusive).
    pub fn bottom(&self) -> i32 {
        self.y + self.height - 1
    }

    pub fn top_left(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }

    pub fn contains(&self, point: PixelPoint) -> bool {
        !self.is_empty()
            && point.x >= self.x
            && point.y >= self.y
            && point.x <= self.right()
            && point.y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &PixelRect) -> bool {
        other.is_empty()
            || (self.contains(other.top_left())
                && self.contains(PixelPoint::new(other.right(), other.bottom())))
    }

    /// Smallest rectangle covering both. Empty operands are ignored.
    pub fn union(&self, other: &PixelRect) -> PixelRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        PixelRect::new(left, top, right - left + 1, bottom - top + 1)
    }

    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top || self.is_empty() || other.is_empty() {
            PixelRect::EMPTY
        } else {
            PixelRect::new(left, top, right - left + 1, bottom - top + 1)
        }
    }

    pub fn translated(&self, dx: i32, dy: i32) -> PixelRect {
        PixelRect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn with_size(&self, width: i32, height: i32) -> PixelRect {
        PixelRect::new(self.x, self.y, width, height)
    }

    /// Grows the rectangle by `amount` pixels on every side.
    pub fn inflated(&self, amount: i32) -> PixelRect {
        PixelRect::new(
            self.x - amount,
            self.y - amount,
            self.width + 2 * amount,
            self.height + 2 * amount,
        )
    }
}

impl From<PixelRect> for egui::Rect {
    fn from(rect: PixelRect) -> Self {
        egui::Rect::from_min_size(
            egui::pos2(rect.x as f32, rect.y as f32),
            egui::vec2(rect.width.max(0) as f32, rect.height.max(0) as f32),
        )
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_ignores_empty() {
        let a = PixelRect::new(2, 2, 3, 3);
        assert_eq!(a.union(&PixelRect::EMPTY), a);
        assert_eq!(PixelRect::EMPTY.union(&a), a);
        assert_eq!(
            a.union(&PixelRect::new(10, 0, 1, 1)),
            PixelRect::new(2, 0, 9, 5)
        );
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = PixelRect::new(0, 0, 5, 5);
        let b = PixelRect::new(5, 0, 5, 5);
        assert!(a.intersect(&b).is_empty());
        assert_eq!(a.intersect(&PixelRect::new(3, 3, 10, 10)), PixelRect::new(3, 3, 2, 2));
    }

    #[test]
    fn bounds_of_points_are_inclusive() {
        let rect = PixelRect::from_points(&[
            PixelPoint::new(3, 7),
            PixelPoint::new(-1, 2),
            PixelPoint::new(4, 4),
        ]);
        assert_eq!(rect, PixelRect::new(-1, 2, 6, 6));
        assert!(rect.contains(PixelPoint::new(4, 7)));
        assert!(!rect.contains(PixelPoint::new(5, 7)));
    }

    #[test]
    fn egui_rect_conversion() {
        let rect: egui::Rect = PixelRect::new(1, 2, 3, 4).into();
        assert_eq!(rect.min, egui::pos2(1.0, 2.0));
        assert_eq!(rect.size(), egui::vec2(3.0, 4.0));
    }
}
