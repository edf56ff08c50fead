#![forbid(unsafe_code)]

//! The layout tree for one window.
//!
//! A [`MultiSplitter`] owns every [`Item`] and [`Separator`] of one window in
//! an arena keyed by ID. The root is always a container and never changes ID.
//! Every mutation finishes with the same pass: collapse redundant containers,
//! resync separators, grow the window if the minimum no longer fits, relayout
//! from the root, then refresh percentages from the resulting lengths.
//! Resizing the window only relayouts, so proportions survive any sequence of
//! resizes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use splitdock_core::geometry::{Orientation, Point, Rect, Size};

use crate::error::LayoutError;
use crate::item::{GuestId, Item, ItemId, ItemKind};
use crate::separator::{Separator, SeparatorId};
use crate::sizing::{self, LengthRequest};

/// Default separator thickness in pixels.
pub const DEFAULT_SEPARATOR_THICKNESS: i32 = 5;

/// Minimum size given to leaves that don't ask for one.
pub const DEFAULT_MIN_SIZE: Size = Size::new(80, 90);

/// Per-tree tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub separator_thickness: i32,
    pub default_min_size: Size,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            separator_thickness: DEFAULT_SEPARATOR_THICKNESS,
            default_min_size: DEFAULT_MIN_SIZE,
        }
    }
}

/// Item tree of one window.
#[derive(Debug, Clone)]
pub struct MultiSplitter {
    pub(crate) config: SplitterConfig,
    pub(crate) items: BTreeMap<ItemId, Item>,
    pub(crate) separators: BTreeMap<SeparatorId, Separator>,
    pub(crate) root: ItemId,
    pub(crate) size: Size,
    pub(crate) next_item: u64,
    pub(crate) next_separator: u64,
    pub(crate) reaped: Vec<ItemId>,
}

impl MultiSplitter {
    /// Empty layout of the given size with default configuration.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self::with_config(size, SplitterConfig::default())
    }

    #[must_use]
    pub fn with_config(size: Size, config: SplitterConfig) -> Self {
        let root_id = ItemId::MIN;
        let mut root = Item::new_container(root_id, Orientation::Vertical);
        root.geometry = Rect::from_size(size);
        root.percentage = 1.0;
        root.last_visible_size = size;
        let mut items = BTreeMap::new();
        items.insert(root_id, root);
        Self {
            config,
            items,
            separators: BTreeMap::new(),
            root: root_id,
            size,
            next_item: root_id.get() + 1,
            next_separator: SeparatorId::MIN.get(),
            reaped: Vec::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Current size of the root, which always matches the window content.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub const fn root_item(&self) -> ItemId {
        self.root
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of leaves, visible or not.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.values().filter(|item| item.is_leaf()).count()
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.items
            .values()
            .filter(|item| item.guest().is_some())
            .count()
    }

    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.items
            .values()
            .filter(|item| item.is_placeholder())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Leaves in depth-first order.
    #[must_use]
    pub fn items(&self) -> Vec<ItemId> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(item) = self.items.get(&id) else {
                continue;
            };
            match &item.kind {
                ItemKind::Leaf(_) => leaves.push(id),
                ItemKind::Container(container) => {
                    stack.extend(container.children.iter().rev().copied());
                }
            }
        }
        leaves
    }

    #[must_use]
    pub fn item_for_guest(&self, guest: GuestId) -> Option<ItemId> {
        self.items
            .values()
            .find(|item| item.guest() == Some(guest))
            .map(Item::id)
    }

    /// All separators, grouped by container in depth-first order.
    #[must_use]
    pub fn separators(&self) -> Vec<&Separator> {
        let mut out = Vec::with_capacity(self.separators.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(container) = self.items.get(&id).and_then(Item::container) else {
                continue;
            };
            out.extend(
                container
                    .separators
                    .iter()
                    .filter_map(|sid| self.separators.get(sid)),
            );
            stack.extend(container.children.iter().rev().copied());
        }
        out
    }

    #[must_use]
    pub fn separator(&self, id: SeparatorId) -> Option<&Separator> {
        self.separators.get(&id)
    }

    #[must_use]
    pub fn num_separators(&self) -> usize {
        self.separators.len()
    }

    /// A leaf is visible while it hosts a guest; a container while any
    /// descendant is.
    #[must_use]
    pub fn is_visible(&self, id: ItemId) -> bool {
        match self.items.get(&id).map(|item| &item.kind) {
            Some(ItemKind::Leaf(leaf)) => leaf.guest.is_some(),
            Some(ItemKind::Container(container)) => {
                container.children.iter().any(|child| self.is_visible(*child))
            }
            None => false,
        }
    }

    /// Visible children of a container, in order.
    #[must_use]
    pub fn visible_children(&self, id: ItemId) -> Vec<ItemId> {
        self.children_of(id)
            .into_iter()
            .filter(|child| self.is_visible(*child))
            .collect()
    }

    /// Effective minimum size. Hidden items need no space.
    #[must_use]
    pub fn min_size_of(&self, id: ItemId) -> Size {
        let Some(item) = self.items.get(&id) else {
            return Size::ZERO;
        };
        match &item.kind {
            ItemKind::Leaf(leaf) if leaf.guest.is_some() => item.min_size,
            ItemKind::Leaf(_) => Size::ZERO,
            ItemKind::Container(container) => {
                let orientation = container.orientation;
                let mut along = 0;
                let mut across = 0;
                let mut visible = 0;
                for child in &container.children {
                    if !self.is_visible(*child) {
                        continue;
                    }
                    let min = self.min_size_of(*child);
                    along += min.length(orientation);
                    across = across.max(min.length(orientation.opposite()));
                    visible += 1;
                }
                along += gaps(visible) * self.config.separator_thickness;
                Size::ZERO
                    .with_length(orientation, along)
                    .with_length(orientation.opposite(), across)
            }
        }
    }

    /// Minimum size of the whole layout.
    #[must_use]
    pub fn min_size(&self) -> Size {
        self.min_size_of(self.root)
    }

    /// Slack along `orientation`: the layout length minus what the visible
    /// items need at their minimum, separators included.
    #[must_use]
    pub fn available_length_for_orientation(&self, orientation: Orientation) -> i32 {
        self.size.length(orientation) - self.min_size().length(orientation)
    }

    /// Drain the IDs of items removed since the last call.
    ///
    /// Holders of item IDs must drop them once they show up here.
    pub fn take_reaped(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.reaped)
    }

    // ---------------------------------------------------------------------
    // Internal plumbing shared by the mutation modules.
    // ---------------------------------------------------------------------

    pub(crate) fn thickness(&self) -> i32 {
        self.config.separator_thickness
    }

    pub(crate) fn item_ref(&self, id: ItemId) -> Result<&Item, LayoutError> {
        self.items
            .get(&id)
            .ok_or(LayoutError::UnknownItem { item: id })
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Result<&mut Item, LayoutError> {
        self.items
            .get_mut(&id)
            .ok_or(LayoutError::UnknownItem { item: id })
    }

    pub(crate) fn allocate_item_id(&mut self) -> Result<ItemId, LayoutError> {
        let id = ItemId::new(self.next_item)?;
        self.next_item = id.checked_next()?.get();
        Ok(id)
    }

    fn allocate_separator_id(&mut self) -> Result<SeparatorId, LayoutError> {
        let id = SeparatorId::new(self.next_separator)?;
        self.next_separator = id.checked_next()?.get();
        Ok(id)
    }

    pub(crate) fn parent_of(&self, id: ItemId) -> Option<ItemId> {
        self.items.get(&id).and_then(Item::parent)
    }

    pub(crate) fn children_of(&self, id: ItemId) -> Vec<ItemId> {
        self.items
            .get(&id)
            .map(|item| item.children().to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn orientation_of(&self, id: ItemId) -> Orientation {
        self.items
            .get(&id)
            .and_then(Item::orientation)
            .unwrap_or(Orientation::Vertical)
    }

    pub(crate) fn set_percentage(&mut self, id: ItemId, percentage: f64) {
        if let Some(item) = self.items.get_mut(&id) {
            item.percentage = percentage;
        }
    }

    pub(crate) fn has_other_visible_child(&self, parent: ItemId, except: ItemId) -> bool {
        self.children_of(parent)
            .into_iter()
            .any(|child| child != except && self.is_visible(child))
    }

    /// Guests hosted by the subtree rooted at `id`.
    pub(crate) fn guests_in(&self, id: ItemId) -> Vec<GuestId> {
        let mut guests = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(item) = self.items.get(&current) else {
                continue;
            };
            if let Some(guest) = item.guest() {
                guests.push(guest);
            }
            stack.extend(item.children().iter().copied());
        }
        guests
    }

    /// Remove `id` from its parent's children. The item stays in the arena.
    pub(crate) fn detach(&mut self, id: ItemId) {
        let Some(parent) = self.parent_of(id) else {
            return;
        };
        if let Some(container) = self.items.get_mut(&parent).and_then(Item::container_mut) {
            container.children.retain(|child| *child != id);
        }
        if let Some(item) = self.items.get_mut(&id) {
            item.parent = None;
        }
    }

    /// Drop a subtree from the arena and queue its IDs for reaping.
    pub(crate) fn delete_subtree(&mut self, id: ItemId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(item) = self.items.remove(&current) else {
                continue;
            };
            if let ItemKind::Container(container) = item.kind {
                for separator in container.separators {
                    self.separators.remove(&separator);
                }
                stack.extend(container.children);
            }
            self.reaped.push(current);
        }
    }

    /// Drop a single container whose children were already re-parented.
    fn discard_container(&mut self, id: ItemId) {
        if let Some(item) = self.items.remove(&id) {
            for separator in item.separator_ids() {
                self.separators.remove(separator);
            }
            self.reaped.push(id);
        }
    }

    /// The common tail of every structural mutation.
    pub(crate) fn finish_structural_change(&mut self) -> Result<(), LayoutError> {
        self.normalize();
        self.sync_separators()?;
        self.grow_to_fit();
        self.relayout();
        self.refresh_percentages();
        if cfg!(debug_assertions) {
            // check_sanity logs whatever it finds.
            let _ = self.check_sanity();
        }
        Ok(())
    }

    /// Grow the layout when the visible items no longer fit.
    pub(crate) fn grow_to_fit(&mut self) -> bool {
        let min = self.min_size();
        if self.size.covers(min) {
            return false;
        }
        let grown = self.size.expanded_to(min);
        tracing::debug!(
            from_width = self.size.width,
            from_height = self.size.height,
            to_width = grown.width,
            to_height = grown.height,
            "layout grew to fit its minimum size"
        );
        self.size = grown;
        true
    }

    /// Recompute every geometry and separator position from the root.
    pub(crate) fn relayout(&mut self) {
        let root = self.root;
        let rect = Rect::from_size(self.size);
        if let Some(item) = self.items.get_mut(&root) {
            item.last_visible_size = self.size;
        }
        self.layout_subtree(root, rect);
    }

    fn layout_subtree(&mut self, id: ItemId, rect: Rect) {
        let thickness = self.thickness();
        let Some(item) = self.items.get_mut(&id) else {
            return;
        };
        item.geometry = rect;
        let Some(container) = item.container() else {
            return;
        };
        let orientation = container.orientation;
        let children = container.children.clone();
        let separators = container.separators.clone();

        let visibility: Vec<bool> = children.iter().map(|c| self.is_visible(*c)).collect();
        let requests: Vec<LengthRequest> = children
            .iter()
            .zip(&visibility)
            .filter(|(_, visible)| **visible)
            .map(|(child, _)| LengthRequest {
                percentage: self.items.get(child).map_or(0.0, |c| c.percentage),
                min: self.min_size_of(*child).length(orientation),
            })
            .collect();
        let available = rect.length(orientation) - gaps(requests.len()) * thickness;
        let mut lengths = sizing::apportion(available, &requests).into_iter();
        let mut separators = separators.into_iter();

        let mut cursor = rect.position(orientation);
        let mut placed = 0;
        for (child, visible) in children.into_iter().zip(visibility) {
            if !visible {
                let origin = match orientation {
                    Orientation::Horizontal => Point::new(cursor, rect.y),
                    Orientation::Vertical => Point::new(rect.x, cursor),
                };
                self.collapse_subtree(child, origin);
                continue;
            }
            if placed > 0 {
                if let Some(separator) = separators.next().and_then(|s| self.separators.get_mut(&s))
                {
                    separator.position = cursor;
                    separator.span = rect.with_span(orientation, cursor, thickness);
                }
                cursor += thickness;
            }
            let length = lengths.next().unwrap_or(0);
            self.layout_subtree(child, rect.with_span(orientation, cursor, length));
            cursor += length;
            placed += 1;
        }
    }

    fn collapse_subtree(&mut self, id: ItemId, origin: Point) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(item) = self.items.get_mut(&current) {
                item.geometry = Rect::from_origin_size(origin, Size::ZERO);
                stack.extend(item.children().iter().copied());
            }
        }
    }

    /// Make every container hold one separator per visible sibling pair.
    ///
    /// Existing separators keep their IDs; only the tail is added or dropped.
    pub(crate) fn sync_separators(&mut self) -> Result<(), LayoutError> {
        let containers: Vec<ItemId> = self
            .items
            .values()
            .filter(|item| item.is_container())
            .map(Item::id)
            .collect();
        for id in containers {
            let needed = self.visible_children(id).len().saturating_sub(1);
            let Some(container) = self.items.get(&id).and_then(Item::container) else {
                continue;
            };
            let orientation = container.orientation;
            let mut current = container.separators.clone();
            while current.len() > needed {
                if let Some(stale) = current.pop() {
                    self.separators.remove(&stale);
                }
            }
            while current.len() < needed {
                let separator = self.allocate_separator_id()?;
                self.separators
                    .insert(separator, Separator::new(separator, id, orientation));
                current.push(separator);
            }
            for separator in &current {
                if let Some(entry) = self.separators.get_mut(separator) {
                    entry.container = id;
                    entry.orientation = orientation;
                }
            }
            if let Some(container) = self.items.get_mut(&id).and_then(Item::container_mut) {
                container.separators = current;
            }
        }
        Ok(())
    }

    /// Recompute percentages from the lengths of the last relayout.
    pub(crate) fn refresh_percentages(&mut self) {
        let containers: Vec<ItemId> = self
            .items
            .values()
            .filter(|item| item.is_container())
            .map(Item::id)
            .collect();
        for id in containers {
            let orientation = self.orientation_of(id);
            let children = self.children_of(id);
            let visible = self.visible_children(id);
            let lengths: Vec<i32> = visible
                .iter()
                .map(|child| {
                    self.items
                        .get(child)
                        .map_or(0, |c| c.geometry.length(orientation))
                })
                .collect();
            let total: i32 = lengths.iter().sum();
            for child in children {
                let share = match visible.iter().position(|v| *v == child) {
                    Some(index) if total > 0 => f64::from(lengths[index]) / f64::from(total),
                    Some(_) => 1.0 / visible.len() as f64,
                    None => 0.0,
                };
                self.set_percentage(child, share);
            }
        }
    }

    /// Collapse redundant structure.
    ///
    /// Empty containers go away, single-child containers are replaced by
    /// their child, containers nested in a parent of the same orientation are
    /// spliced into it, and a root with a single container child absorbs it.
    pub(crate) fn normalize(&mut self) {
        let root = self.root;
        self.simplify_children(root);
        self.absorb_single_root_child();
    }

    fn simplify_children(&mut self, id: ItemId) {
        let Some(container) = self.items.get(&id).and_then(Item::container) else {
            return;
        };
        let orientation = container.orientation;
        let children = container.children.clone();
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            self.simplify_children(child);
            self.place_simplified(id, orientation, child, &mut kept);
        }
        if let Some(container) = self.items.get_mut(&id).and_then(Item::container_mut) {
            container.children = kept;
        }
    }

    fn place_simplified(
        &mut self,
        parent: ItemId,
        orientation: Orientation,
        child: ItemId,
        kept: &mut Vec<ItemId>,
    ) {
        let Some(item) = self.items.get(&child) else {
            return;
        };
        let Some(container) = item.container() else {
            kept.push(child);
            return;
        };
        let grandchildren = container.children.clone();
        let child_orientation = container.orientation;
        let share = item.percentage;
        let remembered = item.last_visible_size;
        let child_visible = self.is_visible(child);

        match grandchildren.len() {
            0 => self.discard_container(child),
            1 => {
                let only = grandchildren[0];
                if let Some(inner) = self.items.get_mut(&only) {
                    inner.parent = Some(parent);
                    inner.percentage = share;
                    if !child_visible {
                        inner.last_visible_size = remembered;
                    }
                }
                self.discard_container(child);
                self.place_simplified(parent, orientation, only, kept);
            }
            _ if child_orientation == orientation => {
                for &grandchild in &grandchildren {
                    if let Some(inner) = self.items.get_mut(&grandchild) {
                        inner.parent = Some(parent);
                        inner.percentage *= share;
                    }
                    kept.push(grandchild);
                }
                self.discard_container(child);
            }
            _ => kept.push(child),
        }
    }

    fn absorb_single_root_child(&mut self) {
        loop {
            let root = self.root;
            let children = self.children_of(root);
            let [only] = children.as_slice() else {
                return;
            };
            let only = *only;
            let Some(inner) = self.items.get(&only).and_then(Item::container) else {
                return;
            };
            let orientation = inner.orientation;
            let grandchildren = inner.children.clone();
            for grandchild in &grandchildren {
                if let Some(item) = self.items.get_mut(grandchild) {
                    item.parent = Some(root);
                }
            }
            if let Some(container) = self.items.get_mut(&root).and_then(Item::container_mut) {
                container.orientation = orientation;
                container.children = grandchildren;
            }
            self.discard_container(only);
        }
    }
}

/// Number of separators between `count` visible siblings.
pub(crate) fn gaps(count: usize) -> i32 {
    i32::try_from(count.saturating_sub(1)).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layout_has_only_the_root() {
        let layout = MultiSplitter::new(Size::new(800, 500));
        assert_eq!(layout.count(), 0);
        assert_eq!(layout.visible_count(), 0);
        assert_eq!(layout.placeholder_count(), 0);
        assert_eq!(layout.num_separators(), 0);
        assert!(layout.items().is_empty());
        assert!(layout.is_empty());
        assert_eq!(layout.min_size(), Size::ZERO);
        assert_eq!(layout.root_item(), ItemId::MIN);
        assert!(layout.item(ItemId::MIN).is_some_and(Item::is_container));
    }

    #[test]
    fn available_length_of_empty_layout_is_full_size() {
        let layout = MultiSplitter::new(Size::new(800, 500));
        assert_eq!(
            layout.available_length_for_orientation(Orientation::Horizontal),
            800
        );
        assert_eq!(
            layout.available_length_for_orientation(Orientation::Vertical),
            500
        );
    }

    #[test]
    fn gaps_counts_pairs() {
        assert_eq!(gaps(0), 0);
        assert_eq!(gaps(1), 0);
        assert_eq!(gaps(4), 3);
    }

    #[test]
    fn config_defaults() {
        let config = SplitterConfig::default();
        assert_eq!(config.separator_thickness, 5);
        assert_eq!(config.default_min_size, Size::new(80, 90));
    }
}
