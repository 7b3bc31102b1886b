//! Geometry primitives shared by both document models.

use serde::{Deserialize, Serialize};

/// A page-relative rectangle with an explicit 0-indexed page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x0: f64,
    /// Top edge
    pub y0: f64,
    /// Right edge
    pub x1: f64,
    /// Bottom edge
    pub y1: f64,
    /// Page index (0-indexed)
    #[serde(default)]
    pub page: usize,
}

impl BoundingBox {
    /// Create a box, ordering the coordinates so that `x1 >= x0` and `y1 >= y0`.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64, page: usize) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
            page,
        }
    }

    /// Create a box from `[x0, y0, x1, y1]`.
    pub fn from_array(coords: [f64; 4], page: usize) -> Self {
        Self::new(coords[0], coords[1], coords[2], coords[3], page)
    }

    /// Coordinates as `[x0, y0, x1, y1]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }

    /// A full-page box.
    pub fn page_box(width: f64, height: f64, page: usize) -> Self {
        Self::new(0.0, 0.0, width, height, page)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    /// Smallest box covering both boxes. The page of `self` is kept.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            page: self.page,
        }
    }

    /// Check the ordering invariant and that every coordinate is finite.
    pub fn is_valid(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite()) && self.x1 >= self.x0 && self.y1 >= self.y0
    }

    /// Compare coordinates within `tolerance` and pages exactly.
    pub fn approx_eq(&self, other: &BoundingBox, tolerance: f64) -> bool {
        self.page == other.page
            && self
                .to_array()
                .iter()
                .zip(other.to_array().iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// A `[start, end]` offset pair into the document text, counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Closed-interval containment: identical spans contain each other.
    pub fn contains(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Smallest span covering both.
    pub fn union(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Shift both offsets forward, or `None` on overflow.
    pub fn offset(&self, by: usize) -> Option<Span> {
        Some(Span::new(self.start.checked_add(by)?, self.end.checked_add(by)?))
    }

    /// Check `start <= end <= len`.
    pub fn fits(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }
}
