#![forbid(unsafe_code)]

//! Separators between sibling items.
//!
//! A separator is a value object: its position is recomputed on every
//! relayout and the caller moves it through
//! [`MultiSplitter::move_separator`](crate::MultiSplitter::move_separator).
//! It holds no drag state.

use std::fmt;

use serde::{Deserialize, Serialize};
use splitdock_core::geometry::{Orientation, Rect};

use crate::error::LayoutError;
use crate::item::ItemId;

/// Stable identifier for separators in one layout tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeparatorId(u64);

impl SeparatorId {
    pub const MIN: Self = Self(1);

    pub fn new(raw: u64) -> Result<Self, LayoutError> {
        if raw == 0 {
            return Err(LayoutError::ZeroId { kind: "separator" });
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn checked_next(self) -> Result<Self, LayoutError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(LayoutError::IdOverflow { kind: "separator" });
        };
        Self::new(next)
    }
}

impl fmt::Display for SeparatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How [`MultiSplitter::move_separator`](crate::MultiSplitter::move_separator)
/// treats a position that would squeeze a neighbour below its minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeparatorMove {
    /// Clamp to the nearest legal position.
    #[default]
    Clamp,
    /// Reject the request.
    Strict,
}

/// Boundary between two adjacent visible siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separator {
    pub(crate) id: SeparatorId,
    pub(crate) container: ItemId,
    pub(crate) orientation: Orientation,
    pub(crate) position: i32,
    pub(crate) span: Rect,
}

impl Separator {
    pub(crate) fn new(id: SeparatorId, container: ItemId, orientation: Orientation) -> Self {
        Self {
            id,
            container,
            orientation,
            position: 0,
            span: Rect::default(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> SeparatorId {
        self.id
    }

    /// Container whose children this separator divides.
    #[must_use]
    pub const fn container(&self) -> ItemId {
        self.container
    }

    /// Orientation of the owning container; the separator moves along it.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Coordinate of the separator's leading edge along its axis.
    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    /// Area the separator covers, for hit testing by the view layer.
    #[must_use]
    pub const fn geometry(&self) -> Rect {
        self.span
    }
}
