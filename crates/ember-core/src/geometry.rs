#![forbid(unsafe_code)]

//! Geometric primitives in continuous pixel space.
//!
//! The graph engine reconciles three coordinate spaces: normalized model
//! space ([0,1] x depth), full canvas pixel space, and the scrollable
//! viewport. Canvas and viewport coordinates are `f64` because zoomed
//! canvases routinely exceed what fits in an integer viewport and scale
//! factors are fractional.

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in pixel space, used for layout bounds, viewport clipping,
/// and dirty-region reporting.
///
/// Origin is at the top-left; `width`/`height` are extents, with the
/// right/bottom edges exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectF {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with the given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Left edge (alias for x).
    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> PointF {
        PointF::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: PointF) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle if the rectangles don't overlap.
    #[inline]
    pub fn intersection(&self, other: &RectF) -> RectF {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &RectF) -> Option<RectF> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(RectF::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Check whether this rectangle overlaps another.
    #[inline]
    pub fn intersects(&self, other: &RectF) -> bool {
        self.intersection_opt(other).is_some()
    }

    /// The smallest rectangle containing both this one and another.
    pub fn union(&self, other: &RectF) -> RectF {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        RectF::new(x, y, right - x, bottom - y)
    }
}

#[cfg(test)]
mod tests {
    use super::{PointF, RectF};

    #[test]
    fn rect_contains_edges() {
        let rect = RectF::new(2.0, 3.0, 4.0, 5.0);
        assert!(rect.contains(PointF::new(2.0, 3.0)));
        assert!(rect.contains(PointF::new(5.9, 7.9)));
        assert!(!rect.contains(PointF::new(6.0, 3.0)));
        assert!(!rect.contains(PointF::new(2.0, 8.0)));
    }

    #[test]
    fn rect_intersection_overlaps() {
        let a = RectF::new(0.0, 0.0, 4.0, 4.0);
        let b = RectF::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(a.intersection(&b), RectF::new(2.0, 2.0, 2.0, 2.0));
    }

    #[test]
    fn rect_intersection_no_overlap_is_empty() {
        let a = RectF::new(0.0, 0.0, 2.0, 2.0);
        let b = RectF::new(3.0, 3.0, 2.0, 2.0);
        assert!(a.intersection(&b).is_empty());
        assert_eq!(a.intersection_opt(&b), None);
    }

    #[test]
    fn rect_union_covers_both() {
        let a = RectF::new(0.0, 0.0, 2.0, 2.0);
        let b = RectF::new(3.0, 1.0, 2.0, 4.0);
        assert_eq!(a.union(&b), RectF::new(0.0, 0.0, 5.0, 5.0));
    }

    #[test]
    fn rect_center() {
        let rect = RectF::new(10.0, 20.0, 4.0, 8.0);
        assert_eq!(rect.center(), PointF::new(12.0, 24.0));
    }

    #[test]
    fn empty_rect_contains_nothing() {
        let rect = RectF::new(1.0, 1.0, 0.0, 5.0);
        assert!(rect.is_empty());
        assert!(!rect.contains(PointF::new(1.0, 1.0)));
    }
}
