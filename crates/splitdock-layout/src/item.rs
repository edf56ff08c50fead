#![forbid(unsafe_code)]

//! Layout tree nodes.
//!
//! Items live in an arena owned by [`MultiSplitter`](crate::MultiSplitter)
//! and refer to each other by [`ItemId`]. A leaf hosts at most one guest (the
//! frame the view layer draws into); a leaf without a guest is a placeholder
//! that keeps its slot in the tree so a hidden dock widget can come back to
//! the same place.

use std::fmt;

use serde::{Deserialize, Serialize};
use splitdock_core::geometry::{Orientation, Rect, Size};

use crate::error::LayoutError;
use crate::separator::SeparatorId;

/// Largest size hint an item can carry.
pub const MAX_SIZE_HINT: Size = Size::new(16_777_215, 16_777_215);

/// Stable identifier for items in one layout tree.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Lowest valid item ID. Every tree uses it for its root.
    pub const MIN: Self = Self(1);

    /// Create a new item ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, LayoutError> {
        if raw == 0 {
            return Err(LayoutError::ZeroId { kind: "item" });
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, LayoutError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(LayoutError::IdOverflow { kind: "item" });
        };
        Self::new(next)
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle for whatever the view layer hosts inside a leaf.
///
/// The layout engine never interprets it beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(u64);

impl GuestId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Leaf {
    pub(crate) guest: Option<GuestId>,
    pub(crate) ref_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Container {
    pub(crate) orientation: Orientation,
    pub(crate) children: Vec<ItemId>,
    /// One per adjacent pair of visible children, in order.
    pub(crate) separators: Vec<SeparatorId>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ItemKind {
    Leaf(Leaf),
    Container(Container),
}

/// One node of the layout tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) parent: Option<ItemId>,
    pub(crate) geometry: Rect,
    pub(crate) min_size: Size,
    pub(crate) max_size_hint: Size,
    /// Share of the parent's available length. Zero while hidden.
    pub(crate) percentage: f64,
    /// Size the item had when it last stopped being visible.
    pub(crate) last_visible_size: Size,
    pub(crate) kind: ItemKind,
}

impl Item {
    pub(crate) fn new_leaf(id: ItemId, guest: Option<GuestId>, min_size: Size) -> Self {
        Self {
            id,
            parent: None,
            geometry: Rect::default(),
            min_size,
            max_size_hint: MAX_SIZE_HINT,
            percentage: 0.0,
            last_visible_size: min_size,
            kind: ItemKind::Leaf(Leaf {
                guest,
                ref_count: 1,
            }),
        }
    }

    pub(crate) fn new_container(id: ItemId, orientation: Orientation) -> Self {
        Self {
            id,
            parent: None,
            geometry: Rect::default(),
            min_size: Size::ZERO,
            max_size_hint: MAX_SIZE_HINT,
            percentage: 0.0,
            last_visible_size: Size::ZERO,
            kind: ItemKind::Container(Container {
                orientation,
                children: Vec::new(),
                separators: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub const fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    /// Geometry in window coordinates. Hidden items have an empty rect.
    #[must_use]
    pub const fn geometry(&self) -> Rect {
        self.geometry
    }

    /// Own minimum size. For containers the effective minimum is derived
    /// from the children, see [`MultiSplitter::min_size_of`](crate::MultiSplitter::min_size_of).
    #[must_use]
    pub const fn min_size(&self) -> Size {
        self.min_size
    }

    #[must_use]
    pub const fn max_size_hint(&self) -> Size {
        self.max_size_hint
    }

    #[must_use]
    pub const fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub const fn last_visible_size(&self) -> Size {
        self.last_visible_size
    }

    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.kind, ItemKind::Container(_))
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, ItemKind::Leaf(_))
    }

    /// `true` for a leaf with no guest.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self.kind, ItemKind::Leaf(Leaf { guest: None, .. }))
    }

    #[must_use]
    pub const fn guest(&self) -> Option<GuestId> {
        match &self.kind {
            ItemKind::Leaf(leaf) => leaf.guest,
            ItemKind::Container(_) => None,
        }
    }

    /// Number of holders keeping this leaf alive. Always 0 for containers.
    #[must_use]
    pub const fn ref_count(&self) -> u32 {
        match &self.kind {
            ItemKind::Leaf(leaf) => leaf.ref_count,
            ItemKind::Container(_) => 0,
        }
    }

    #[must_use]
    pub const fn orientation(&self) -> Option<Orientation> {
        match &self.kind {
            ItemKind::Container(container) => Some(container.orientation),
            ItemKind::Leaf(_) => None,
        }
    }

    /// Ordered children. Empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[ItemId] {
        match &self.kind {
            ItemKind::Container(container) => &container.children,
            ItemKind::Leaf(_) => &[],
        }
    }

    #[must_use]
    pub fn separator_ids(&self) -> &[SeparatorId] {
        match &self.kind {
            ItemKind::Container(container) => &container.separators,
            ItemKind::Leaf(_) => &[],
        }
    }

    pub(crate) fn container(&self) -> Option<&Container> {
        match &self.kind {
            ItemKind::Container(container) => Some(container),
            ItemKind::Leaf(_) => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut Container> {
        match &mut self.kind {
            ItemKind::Container(container) => Some(container),
            ItemKind::Leaf(_) => None,
        }
    }

    pub(crate) fn leaf_mut(&mut self) -> Option<&mut Leaf> {
        match &mut self.kind {
            ItemKind::Leaf(leaf) => Some(leaf),
            ItemKind::Container(_) => None,
        }
    }
}
