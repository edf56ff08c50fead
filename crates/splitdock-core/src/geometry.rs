#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Layout happens in signed integer pixels with the origin at the top-left of
//! the owning window. Lengths are never negative once a tree is consistent,
//! but intermediate arithmetic (separator drags, window shrinking) is easier
//! to reason about in `i32` than with saturating unsigned math.

use serde::{Deserialize, Serialize};

/// Split direction of a container.
///
/// A `Horizontal` container lays its children out left to right, so its
/// separators are vertical lines that move along the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The other axis.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Horizontal)
    }
}

/// Where an item goes relative to a reference item (or the whole window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    OnLeft,
    OnTop,
    OnRight,
    OnBottom,
}

impl Location {
    pub const ALL: [Location; 4] = [
        Location::OnLeft,
        Location::OnTop,
        Location::OnRight,
        Location::OnBottom,
    ];

    /// Orientation a container needs to hold the new item beside its anchor.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::OnLeft | Self::OnRight => Orientation::Horizontal,
            Self::OnTop | Self::OnBottom => Orientation::Vertical,
        }
    }

    /// `true` when the new item goes before its anchor (left or top).
    #[must_use]
    pub const fn is_side1(self) -> bool {
        matches!(self, Self::OnLeft | Self::OnTop)
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::OnLeft => Self::OnRight,
            Self::OnTop => Self::OnBottom,
            Self::OnRight => Self::OnLeft,
            Self::OnBottom => Self::OnTop,
        }
    }
}

/// A point in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate along `orientation`.
    #[inline]
    #[must_use]
    pub const fn along(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size::new(0, 0);

    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Length along `orientation`.
    #[inline]
    #[must_use]
    pub const fn length(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// Copy with the length along `orientation` replaced.
    #[inline]
    #[must_use]
    pub const fn with_length(self, orientation: Orientation, length: i32) -> Self {
        match orientation {
            Orientation::Horizontal => Self::new(length, self.height),
            Orientation::Vertical => Self::new(self.width, length),
        }
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn expanded_to(self, other: Size) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn bounded_to(self, other: Size) -> Self {
        Self::new(self.width.min(other.width), self.height.min(other.height))
    }

    /// `true` if either dimension is zero or negative.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// `true` if both dimensions are at least those of `other`.
    #[inline]
    #[must_use]
    pub const fn covers(&self, other: Size) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    #[inline]
    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Check if the rectangle has zero area.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Start coordinate along `orientation`.
    #[inline]
    #[must_use]
    pub const fn position(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }

    /// Length along `orientation`.
    #[inline]
    #[must_use]
    pub const fn length(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// End coordinate (exclusive) along `orientation`.
    #[inline]
    #[must_use]
    pub const fn end(&self, orientation: Orientation) -> i32 {
        self.position(orientation) + self.length(orientation)
    }

    /// Copy with the span along `orientation` replaced, keeping the cross axis.
    #[inline]
    #[must_use]
    pub const fn with_span(self, orientation: Orientation, position: i32, length: i32) -> Self {
        match orientation {
            Orientation::Horizontal => Self::new(position, self.y, length, self.height),
            Orientation::Vertical => Self::new(self.x, position, self.width, length),
        }
    }

    /// Move by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns `None` when the rectangles don't overlap.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (x < right && y < bottom).then(|| Rect::new(x, y, right - x, bottom - y))
    }

    /// The smallest rectangle that contains both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}
