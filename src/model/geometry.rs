//! Geometry primitives in page units and bitmap pixels.

use serde::{Deserialize, Serialize};

/// A point in top-down page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in top-down page units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Create a rectangle from its edges.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from origin and size.
    pub fn from_size(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn centre(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Whether the point lies inside the rectangle (edges inclusive).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Grow (or shrink with a negative amount) every side.
    pub fn inset(&self, amount: f32) -> Rect {
        Rect::new(
            self.left + amount,
            self.top + amount,
            self.right - amount,
            self.bottom - amount,
        )
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Height of the shared vertical range (negative when apart).
    pub fn vertical_overlap(&self, other: &Rect) -> f32 {
        self.bottom.min(other.bottom) - self.top.max(other.top)
    }

    /// Scale every coordinate by a factor.
    pub fn scale(&self, factor: f32) -> Rect {
        Rect::new(
            self.left * factor,
            self.top * factor,
            self.right * factor,
            self.bottom * factor,
        )
    }

    /// Convert to the pixel rectangle covering this rectangle at `scale`
    /// pixels per unit, clamped to the bitmap.
    pub fn to_pixels(&self, scale: f32, width: u32, height: u32) -> PixelRect {
        let clamp = |v: f32, max: u32| -> u32 { (v.max(0.0) as u32).min(max) };
        PixelRect::new(
            clamp((self.left * scale).floor(), width),
            clamp((self.top * scale).floor(), height),
            clamp((self.right * scale).ceil(), width),
            clamp((self.bottom * scale).ceil(), height),
        )
    }

    /// Whether all four sides lie within `tolerance` of the other's.
    pub fn approx_eq(&self, other: &Rect, tolerance: f32) -> bool {
        (self.left - other.left).abs() <= tolerance
            && (self.top - other.top).abs() <= tolerance
            && (self.right - other.right).abs() <= tolerance
            && (self.bottom - other.bottom).abs() <= tolerance
    }
}

/// Axis-aligned rectangle in bitmap pixels.
///
/// `right` and `bottom` are exclusive, so `width()` is `right - left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right: right.max(left),
            bottom: bottom.max(top),
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Horizontal centre, doubled to stay in integers.
    pub fn centre_x2(&self) -> u32 {
        self.left + self.right
    }

    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &PixelRect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    pub fn union(&self, other: &PixelRect) -> PixelRect {
        PixelRect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    pub fn intersection(&self, other: &PixelRect) -> Option<PixelRect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        (left < right && top < bottom).then(|| PixelRect::new(left, top, right, bottom))
    }

    pub fn intersection_area(&self, other: &PixelRect) -> u64 {
        self.intersection(other).map(|r| r.area()).unwrap_or(0)
    }

    /// Shared vertical extent in rows (negative when apart).
    pub fn vertical_overlap(&self, other: &PixelRect) -> i64 {
        self.bottom.min(other.bottom) as i64 - self.top.max(other.top) as i64
    }

    /// Convert back to page units given the pixels-per-unit scale.
    pub fn to_units(&self, scale: f32) -> Rect {
        Rect::new(
            self.left as f32 / scale,
            self.top as f32 / scale,
            self.right as f32 / scale,
            self.bottom as f32 / scale,
        )
    }

    pub fn approx_eq(&self, other: &PixelRect, tolerance: u32) -> bool {
        self.left.abs_diff(other.left) <= tolerance
            && self.top.abs_diff(other.top) <= tolerance
            && self.right.abs_diff(other.right) <= tolerance
            && self.bottom.abs_diff(other.bottom) <= tolerance
    }
}
