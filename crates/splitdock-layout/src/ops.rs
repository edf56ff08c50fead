#![forbid(unsafe_code)]

//! Mutations: insertion, hiding and showing, removal, reference counting,
//! window resize and separator moves.
//!
//! Preconditions are checked before anything is touched, so an `Err` always
//! leaves the tree as it was.

use splitdock_core::geometry::{Location, Orientation, Size};

use crate::error::LayoutError;
use crate::item::{GuestId, Item, ItemId};
use crate::separator::{SeparatorId, SeparatorMove};
use crate::sizing;
use crate::splitter::{MultiSplitter, gaps};

/// How much room a newly visible item claims from its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthMode {
    /// An equal share with the siblings that are already visible.
    #[default]
    Fair,
    /// A specific length along the parent's axis.
    Preferred(i32),
    /// Whatever the item measured when it was last visible.
    Remembered,
}

/// Options for [`MultiSplitter::insert_item`] and
/// [`MultiSplitter::insert_placeholder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertOptions {
    /// Minimum size; the tree default when `None`.
    pub min_size: Option<Size>,
    /// Size to claim when visible (or to remember, for placeholders).
    pub preferred_size: Option<Size>,
    pub max_size_hint: Option<Size>,
}

impl InsertOptions {
    #[must_use]
    pub fn with_min_size(mut self, size: Size) -> Self {
        self.min_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_preferred_size(mut self, size: Size) -> Self {
        self.preferred_size = Some(size);
        self
    }
}

/// What became of a leaf after its guest left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestRelease {
    /// Other holders remain; the leaf is now a placeholder.
    Placeholder,
    /// The guest was the last holder; the leaf is gone.
    Removed,
}

impl MultiSplitter {
    /// Insert a visible leaf hosting `guest`.
    ///
    /// With no `relative_to` the leaf goes to the `location` edge of the
    /// whole window. The new leaf holds one reference, owned by the guest.
    pub fn insert_item(
        &mut self,
        guest: GuestId,
        location: Location,
        relative_to: Option<ItemId>,
        options: InsertOptions,
    ) -> Result<ItemId, LayoutError> {
        self.check_anchor(relative_to)?;
        if self.item_for_guest(guest).is_some() {
            return Err(LayoutError::DuplicateGuest { guest });
        }
        let id = self.new_leaf(Some(guest), options)?;
        self.attach(id, location, relative_to)?;
        let mode = options
            .preferred_size
            .map_or(LengthMode::Fair, |size| {
                LengthMode::Preferred(size.length(location.orientation()))
            });
        self.show_branch(id, mode)?;
        self.finish_structural_change()?;
        tracing::debug!(item = %id, guest = %guest, ?location, "inserted item");
        Ok(id)
    }

    /// Insert a hidden leaf that only reserves a slot.
    ///
    /// The placeholder holds one reference, owned by the caller.
    pub fn insert_placeholder(
        &mut self,
        location: Location,
        relative_to: Option<ItemId>,
        options: InsertOptions,
    ) -> Result<ItemId, LayoutError> {
        self.check_anchor(relative_to)?;
        let id = self.new_leaf(None, options)?;
        self.attach(id, location, relative_to)?;
        self.finish_structural_change()?;
        tracing::debug!(item = %id, ?location, "inserted placeholder");
        Ok(id)
    }

    /// Hide a visible leaf, dropping the guest's reference.
    ///
    /// Siblings absorb the freed length in proportion to their shares. If
    /// the guest was the only holder the leaf is removed instead.
    pub fn turn_into_placeholder(&mut self, id: ItemId) -> Result<GuestRelease, LayoutError> {
        let item = self.item_ref(id)?;
        if !item.is_leaf() {
            return Err(LayoutError::NotALeaf { item: id });
        }
        if item.guest().is_none() {
            return Err(LayoutError::NotVisible { item: id });
        }

        self.hide_branch(id, true);
        let remaining = {
            let leaf = self.leaf_mut(id)?;
            leaf.guest = None;
            leaf.ref_count = leaf.ref_count.saturating_sub(1);
            leaf.ref_count
        };
        let release = if remaining == 0 {
            self.detach(id);
            self.delete_subtree(id);
            GuestRelease::Removed
        } else {
            GuestRelease::Placeholder
        };
        self.finish_structural_change()?;
        tracing::debug!(item = %id, ?release, "guest left item");
        Ok(release)
    }

    /// Show a placeholder again with `guest`, at the size it had when hidden.
    ///
    /// The guest takes a reference of its own.
    pub fn restore_placeholder(&mut self, id: ItemId, guest: GuestId) -> Result<(), LayoutError> {
        if !self.item_ref(id)?.is_placeholder() {
            return Err(LayoutError::NotAPlaceholder { item: id });
        }
        if self.item_for_guest(guest).is_some() {
            return Err(LayoutError::DuplicateGuest { guest });
        }
        {
            let leaf = self.leaf_mut(id)?;
            leaf.guest = Some(guest);
            leaf.ref_count = leaf.ref_count.saturating_add(1);
        }
        self.show_branch(id, LengthMode::Remembered)?;
        self.finish_structural_change()?;
        tracing::debug!(item = %id, guest = %guest, "placeholder restored");
        Ok(())
    }

    /// Swap the guest hosted by a visible leaf without touching geometry.
    pub fn replace_guest(&mut self, id: ItemId, guest: GuestId) -> Result<(), LayoutError> {
        if self.item_ref(id)?.guest().is_none() {
            return Err(LayoutError::NotVisible { item: id });
        }
        if let Some(existing) = self.item_for_guest(guest) {
            if existing == id {
                return Ok(());
            }
            return Err(LayoutError::DuplicateGuest { guest });
        }
        self.leaf_mut(id)?.guest = Some(guest);
        Ok(())
    }

    /// Remove an item (a leaf, or a container with everything below it)
    /// regardless of its reference count.
    pub fn remove_item(&mut self, id: ItemId) -> Result<(), LayoutError> {
        self.item_ref(id)?;
        if id == self.root {
            return Err(LayoutError::RootItem { item: id });
        }
        if self.is_visible(id) {
            self.hide_branch(id, false);
        }
        self.detach(id);
        self.delete_subtree(id);
        self.finish_structural_change()?;
        tracing::debug!(item = %id, "removed item");
        Ok(())
    }

    /// Remove every item, keeping the root and the window size.
    pub fn clear(&mut self) -> Result<(), LayoutError> {
        for child in self.children_of(self.root) {
            self.detach(child);
            self.delete_subtree(child);
        }
        self.finish_structural_change()
    }

    /// Add a holder to a leaf. Returns the new count.
    pub fn ref_item(&mut self, id: ItemId) -> Result<u32, LayoutError> {
        let leaf = self.leaf_mut(id)?;
        leaf.ref_count = leaf.ref_count.saturating_add(1);
        Ok(leaf.ref_count)
    }

    /// Drop a holder from a leaf, removing it when none are left.
    /// Returns the remaining count.
    pub fn unref_item(&mut self, id: ItemId) -> Result<u32, LayoutError> {
        let remaining = {
            let leaf = self.leaf_mut(id)?;
            leaf.ref_count = leaf.ref_count.saturating_sub(1);
            leaf.ref_count
        };
        if remaining == 0 {
            self.remove_item(id)?;
        }
        Ok(remaining)
    }

    /// Window resize entry point. The layout never gets smaller than its
    /// minimum; the size actually applied is returned.
    pub fn set_size(&mut self, size: Size) -> Size {
        let applied = size.expanded_to(self.min_size());
        if applied != size {
            tracing::debug!(
                requested_width = size.width,
                requested_height = size.height,
                width = applied.width,
                height = applied.height,
                "resize clamped to minimum size"
            );
        }
        self.size = applied;
        self.relayout();
        applied
    }

    /// Change a leaf's minimum size, growing the window if needed.
    pub fn set_min_size(&mut self, id: ItemId, size: Size) -> Result<(), LayoutError> {
        let item = self.item_mut(id)?;
        if !item.is_leaf() {
            return Err(LayoutError::NotALeaf { item: id });
        }
        item.min_size = size;
        self.grow_to_fit();
        self.relayout();
        Ok(())
    }

    pub fn set_max_size_hint(&mut self, id: ItemId, size: Size) -> Result<(), LayoutError> {
        self.item_mut(id)?.max_size_hint = size;
        Ok(())
    }

    /// Drag a separator to `position` (its leading edge, in window
    /// coordinates). Returns the position actually applied.
    ///
    /// The siblings nearest the separator give up length first; the one
    /// directly on the other side takes all of it.
    pub fn move_separator(
        &mut self,
        separator: SeparatorId,
        position: i32,
        mode: SeparatorMove,
    ) -> Result<i32, LayoutError> {
        if position < 0 {
            return Err(LayoutError::NegativeSeparatorPosition {
                separator,
                position,
            });
        }
        let entry = self
            .separator(separator)
            .ok_or(LayoutError::UnknownSeparator { separator })?;
        let container = entry.container();
        let current = entry.position();
        let index = self
            .item_ref(container)?
            .separator_ids()
            .iter()
            .position(|s| *s == separator)
            .ok_or(LayoutError::UnknownSeparator { separator })?;

        let thickness = self.thickness();
        let orientation = self.orientation_of(container);
        let visible = self.visible_children(container);
        let bounds = self.item_ref(container)?.geometry();
        let mins: Vec<i32> = visible
            .iter()
            .map(|child| self.min_size_of(*child).length(orientation))
            .collect();
        let mut lengths: Vec<i32> = visible
            .iter()
            .map(|child| {
                self.items
                    .get(child)
                    .map_or(0, |item| item.geometry().length(orientation))
            })
            .collect();

        let (before, after) = mins.split_at(index + 1);
        let lowest = bounds.position(orientation)
            + before.iter().sum::<i32>()
            + gaps(before.len()) * thickness;
        let highest = bounds.end(orientation)
            - after.iter().sum::<i32>()
            - gaps(after.len()) * thickness
            - thickness;

        let target = if (lowest..=highest).contains(&position) {
            position
        } else {
            match mode {
                SeparatorMove::Strict => {
                    return Err(LayoutError::SeparatorOutOfBounds {
                        separator,
                        position,
                        min: lowest,
                        max: highest,
                    });
                }
                SeparatorMove::Clamp => position.clamp(lowest, highest.max(lowest)),
            }
        };

        let delta = target - current;
        if delta < 0 {
            let taken = sizing::shrink_in_order(&mut lengths, &mins, (0..=index).rev(), -delta);
            lengths[index + 1] += taken;
        } else if delta > 0 {
            let taken =
                sizing::shrink_in_order(&mut lengths, &mins, index + 1..visible.len(), delta);
            lengths[index] += taken;
        }

        let total: i32 = lengths.iter().sum();
        if total > 0 {
            for (child, length) in visible.iter().zip(&lengths) {
                self.set_percentage(*child, f64::from(*length) / f64::from(total));
            }
        }
        self.relayout();
        let applied = self.separator(separator).map_or(target, |s| s.position());
        tracing::trace!(separator = %separator, requested = position, applied, "separator moved");
        Ok(applied)
    }

    // ---------------------------------------------------------------------
    // Internals.
    // ---------------------------------------------------------------------

    fn check_anchor(&self, relative_to: Option<ItemId>) -> Result<(), LayoutError> {
        if let Some(anchor) = relative_to {
            self.item_ref(anchor)?;
            if anchor == self.root {
                return Err(LayoutError::RootItem { item: anchor });
            }
        }
        Ok(())
    }

    fn leaf_mut(&mut self, id: ItemId) -> Result<&mut crate::item::Leaf, LayoutError> {
        self.item_mut(id)?
            .leaf_mut()
            .ok_or(LayoutError::NotALeaf { item: id })
    }

    fn new_leaf(
        &mut self,
        guest: Option<GuestId>,
        options: InsertOptions,
    ) -> Result<ItemId, LayoutError> {
        let id = self.allocate_item_id()?;
        let min_size = options.min_size.unwrap_or(self.config.default_min_size);
        let mut item = Item::new_leaf(id, guest, min_size);
        if let Some(max) = options.max_size_hint {
            item.max_size_hint = max;
        }
        item.last_visible_size = options
            .preferred_size
            .map_or(min_size, |size| size.expanded_to(min_size));
        self.items.insert(id, item);
        Ok(id)
    }

    /// Place a detached node into the tree next to `relative_to` (or at the
    /// window edge), creating a wrapping container when orientations differ.
    pub(crate) fn attach(
        &mut self,
        node: ItemId,
        location: Location,
        relative_to: Option<ItemId>,
    ) -> Result<(), LayoutError> {
        let orientation = location.orientation();
        let (parent, index) = match relative_to {
            None => {
                let root = self.root;
                let children = self.children_of(root).len();
                if self.orientation_of(root) != orientation {
                    if children >= 2 {
                        self.hoist_root_children(orientation)?;
                    } else {
                        self.set_orientation(root, orientation);
                    }
                }
                let len = self.children_of(root).len();
                (root, if location.is_side1() { 0 } else { len })
            }
            Some(anchor) => {
                let parent = self
                    .parent_of(anchor)
                    .ok_or(LayoutError::RootItem { item: anchor })?;
                let siblings = self.children_of(parent);
                let parent_orientation = self.orientation_of(parent);
                // A hidden anchor's slot is reused in place instead of
                // wrapping it in a container of its own.
                if parent_orientation == orientation
                    || siblings.len() == 1
                    || !self.is_visible(anchor)
                {
                    if siblings.len() == 1 && parent_orientation != orientation {
                        self.set_orientation(parent, orientation);
                    }
                    let at = siblings.iter().position(|s| *s == anchor).unwrap_or(0);
                    (parent, if location.is_side1() { at } else { at + 1 })
                } else {
                    let wrapper = self.wrap_in_container(anchor, orientation)?;
                    (wrapper, usize::from(!location.is_side1()))
                }
            }
        };

        if let Some(container) = self.items.get_mut(&parent).and_then(Item::container_mut) {
            let index = index.min(container.children.len());
            container.children.insert(index, node);
        }
        let item = self.item_mut(node)?;
        item.parent = Some(parent);
        item.percentage = 0.0;
        Ok(())
    }

    fn set_orientation(&mut self, id: ItemId, orientation: Orientation) {
        if let Some(container) = self.items.get_mut(&id).and_then(Item::container_mut) {
            container.orientation = orientation;
        }
    }

    /// Move the root's children into a new container so the root can take
    /// `orientation`.
    fn hoist_root_children(&mut self, orientation: Orientation) -> Result<(), LayoutError> {
        let root = self.root;
        let holder = self.allocate_item_id()?;
        let visible = self.is_visible(root);
        let (old_orientation, children, separators) = {
            let container = self
                .items
                .get_mut(&root)
                .and_then(Item::container_mut)
                .ok_or(LayoutError::NotALeaf { item: root })?;
            let old = container.orientation;
            container.orientation = orientation;
            (
                old,
                std::mem::take(&mut container.children),
                std::mem::take(&mut container.separators),
            )
        };
        let mut item = Item::new_container(holder, old_orientation);
        item.parent = Some(root);
        item.geometry = crate::Rect::from_size(self.size);
        item.last_visible_size = self.size;
        item.percentage = if visible { 1.0 } else { 0.0 };
        for child in &children {
            if let Some(child) = self.items.get_mut(child) {
                child.parent = Some(holder);
            }
        }
        for separator in &separators {
            if let Some(separator) = self.separators.get_mut(separator) {
                separator.container = holder;
            }
        }
        if let Some(container) = item.container_mut() {
            container.children = children;
            container.separators = separators;
        }
        self.items.insert(holder, item);
        if let Some(container) = self.items.get_mut(&root).and_then(Item::container_mut) {
            container.children.push(holder);
        }
        Ok(())
    }

    /// Replace `anchor` by a new container of `orientation` holding it.
    fn wrap_in_container(
        &mut self,
        anchor: ItemId,
        orientation: Orientation,
    ) -> Result<ItemId, LayoutError> {
        let parent = self
            .parent_of(anchor)
            .ok_or(LayoutError::RootItem { item: anchor })?;
        let wrapper = self.allocate_item_id()?;
        let (geometry, percentage, remembered) = {
            let item = self.item_ref(anchor)?;
            (item.geometry(), item.percentage(), item.last_visible_size())
        };
        let mut item = Item::new_container(wrapper, orientation);
        item.parent = Some(parent);
        item.geometry = geometry;
        item.percentage = percentage;
        item.last_visible_size = remembered;
        if let Some(container) = item.container_mut() {
            container.children.push(anchor);
        }
        self.items.insert(wrapper, item);
        if let Some(container) = self.items.get_mut(&parent).and_then(Item::container_mut) {
            for child in &mut container.children {
                if *child == anchor {
                    *child = wrapper;
                }
            }
        }
        let anchor_item = self.item_mut(anchor)?;
        anchor_item.parent = Some(wrapper);
        anchor_item.percentage = 1.0;
        Ok(wrapper)
    }

    /// Give a node that just became visible its share of the parent.
    ///
    /// Ancestors that were hidden only because this node was hidden become
    /// visible with it, each taking its parent's whole length, up to the
    /// first ancestor that was already visible. There the top of the chain
    /// claims a length per `mode` and the siblings scale down to make room.
    pub(crate) fn show_branch(&mut self, node: ItemId, mode: LengthMode) -> Result<(), LayoutError> {
        let mut top = node;
        while let Some(parent) = self.parent_of(top) {
            if parent == self.root || self.has_other_visible_child(parent, top) {
                break;
            }
            self.set_percentage(top, 1.0);
            top = parent;
        }
        let Some(parent) = self.parent_of(top) else {
            return Ok(());
        };
        let others: Vec<ItemId> = self
            .visible_children(parent)
            .into_iter()
            .filter(|child| *child != top)
            .collect();
        if others.is_empty() {
            self.set_percentage(top, 1.0);
            return Ok(());
        }

        // Settle the window size with the new node at its minimum first so
        // the parent's length is final.
        self.set_percentage(top, 0.0);
        self.sync_separators()?;
        self.grow_to_fit();
        self.relayout();

        let orientation = self.orientation_of(parent);
        let parent_length = self.item_ref(parent)?.geometry().length(orientation);
        let available = parent_length - gaps(others.len() + 1) * self.thickness();
        let top_item = self.item_ref(top)?;
        let min = self.min_size_of(top).length(orientation);
        let desired = match mode {
            LengthMode::Fair => {
                let share = available / i32::try_from(others.len() + 1).unwrap_or(i32::MAX);
                share.min(top_item.max_size_hint().length(orientation))
            }
            LengthMode::Preferred(length) => length,
            LengthMode::Remembered => top_item.last_visible_size().length(orientation),
        };
        let others_min: i32 = others
            .iter()
            .map(|child| self.min_size_of(*child).length(orientation))
            .sum();
        let length = desired.min(available - others_min).max(min);
        let share = if available > 0 {
            (f64::from(length) / f64::from(available)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let others_total: f64 = others
            .iter()
            .filter_map(|child| self.items.get(child))
            .map(Item::percentage)
            .sum();
        let count = others.len() as f64;
        for child in &others {
            let current = self.items.get(child).map_or(0.0, Item::percentage);
            let scaled = if others_total > 0.0 {
                current / others_total * (1.0 - share)
            } else {
                (1.0 - share) / count
            };
            self.set_percentage(*child, scaled);
        }
        self.set_percentage(top, share);
        Ok(())
    }

    /// Prepare a visible node for hiding: optionally remember the sizes
    /// along the chain that goes dark with it, and hand its share to the
    /// siblings that stay visible.
    pub(crate) fn hide_branch(&mut self, node: ItemId, remember: bool) {
        let mut top = node;
        loop {
            if remember {
                if let Some(item) = self.items.get_mut(&top) {
                    item.last_visible_size = item.geometry.size();
                }
            }
            match self.parent_of(top) {
                Some(parent) if parent != self.root && !self.has_other_visible_child(parent, top) => {
                    top = parent;
                }
                _ => break,
            }
        }
        let Some(parent) = self.parent_of(top) else {
            return;
        };
        let others: Vec<ItemId> = self
            .visible_children(parent)
            .into_iter()
            .filter(|child| *child != top)
            .collect();
        let total: f64 = others
            .iter()
            .filter_map(|child| self.items.get(child))
            .map(Item::percentage)
            .sum();
        let count = others.len() as f64;
        for child in &others {
            let current = self.items.get(child).map_or(0.0, Item::percentage);
            let share = if total > 0.0 { current / total } else { 1.0 / count };
            self.set_percentage(*child, share);
        }
        self.set_percentage(top, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;

    fn guest(raw: u64) -> GuestId {
        GuestId::new(raw)
    }

    fn width(layout: &MultiSplitter, id: ItemId) -> i32 {
        layout.item(id).map_or(-1, |item| item.geometry().width)
    }

    #[test]
    fn first_item_fills_the_window() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(guest(1), Location::OnTop, None, InsertOptions::default())
            .unwrap();
        assert_eq!(layout.item(a).unwrap().geometry(), Rect::new(0, 0, 800, 500));
        assert_eq!(layout.count(), 1);
        assert_eq!(layout.num_separators(), 0);
        layout.check_sanity().unwrap();
    }

    #[test]
    fn left_and_right_split_evenly() {
        let mut layout = MultiSplitter::new(Size::new(501, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let b = layout
            .insert_item(guest(2), Location::OnRight, Some(a), InsertOptions::default())
            .unwrap();
        assert_eq!(layout.num_separators(), 1);
        assert!((width(&layout, a) - width(&layout, b)).abs() <= 1);
        assert_eq!(width(&layout, a) + width(&layout, b) + 5, 501);
        layout.check_sanity().unwrap();
    }

    #[test]
    fn orthogonal_insert_wraps_the_anchor() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let b = layout
            .insert_item(guest(2), Location::OnRight, Some(a), InsertOptions::default())
            .unwrap();
        let c = layout
            .insert_item(guest(3), Location::OnBottom, Some(b), InsertOptions::default())
            .unwrap();
        let wrapper = layout.item(c).unwrap().parent().unwrap();
        assert_ne!(wrapper, layout.root_item());
        assert_eq!(
            layout.item(wrapper).unwrap().orientation(),
            Some(Orientation::Vertical)
        );
        assert_eq!(layout.item(wrapper).unwrap().children(), &[b, c]);
        assert_eq!(layout.num_separators(), 2);
        layout.check_sanity().unwrap();
    }

    #[test]
    fn window_edge_insert_hoists_root_children() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let b = layout
            .insert_item(guest(2), Location::OnRight, None, InsertOptions::default())
            .unwrap();
        let c = layout
            .insert_item(guest(3), Location::OnBottom, None, InsertOptions::default())
            .unwrap();
        let root = layout.item(layout.root_item()).unwrap();
        assert_eq!(root.orientation(), Some(Orientation::Vertical));
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[1], c);
        assert_eq!(layout.items(), vec![a, b, c]);
        layout.check_sanity().unwrap();
    }

    #[test]
    fn hide_and_show_round_trip() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let b = layout
            .insert_item(guest(2), Location::OnRight, None, InsertOptions::default())
            .unwrap();
        let c = layout
            .insert_item(guest(3), Location::OnRight, None, InsertOptions::default())
            .unwrap();
        layout.ref_item(b).unwrap();
        let before: Vec<Rect> = [a, b, c]
            .iter()
            .map(|id| layout.item(*id).unwrap().geometry())
            .collect();

        assert_eq!(layout.turn_into_placeholder(b).unwrap(), GuestRelease::Placeholder);
        assert_eq!(layout.visible_count(), 2);
        assert_eq!(layout.placeholder_count(), 1);
        assert_eq!(layout.count(), 3);
        assert_eq!(layout.num_separators(), 1);
        assert_eq!(layout.item(b).unwrap().geometry().size(), Size::ZERO);
        layout.check_sanity().unwrap();

        layout.restore_placeholder(b, guest(2)).unwrap();
        assert_eq!(layout.visible_count(), 3);
        assert_eq!(layout.placeholder_count(), 0);
        let after: Vec<Rect> = [a, b, c]
            .iter()
            .map(|id| layout.item(*id).unwrap().geometry())
            .collect();
        assert_eq!(before, after);
        layout.check_sanity().unwrap();
    }

    #[test]
    fn releasing_the_only_holder_removes_the_leaf() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        assert_eq!(layout.turn_into_placeholder(a).unwrap(), GuestRelease::Removed);
        assert_eq!(layout.count(), 0);
        assert_eq!(layout.take_reaped(), vec![a]);
        assert!(layout.take_reaped().is_empty());
    }

    #[test]
    fn placeholder_anchor_is_not_wrapped() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let hidden = layout
            .insert_placeholder(Location::OnRight, None, InsertOptions::default())
            .unwrap();
        assert_eq!(layout.item(hidden).unwrap().ref_count(), 1);
        let b = layout
            .insert_item(
                guest(2),
                Location::OnBottom,
                Some(hidden),
                InsertOptions::default(),
            )
            .unwrap();
        assert_eq!(layout.item(b).unwrap().parent(), Some(layout.root_item()));
        assert_eq!(layout.items(), vec![a, hidden, b]);
        layout.check_sanity().unwrap();
    }

    #[test]
    fn removing_collapses_single_child_containers() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let b = layout
            .insert_item(guest(2), Location::OnRight, Some(a), InsertOptions::default())
            .unwrap();
        let c = layout
            .insert_item(guest(3), Location::OnBottom, Some(b), InsertOptions::default())
            .unwrap();
        layout.remove_item(c).unwrap();
        assert_eq!(layout.item(b).unwrap().parent(), Some(layout.root_item()));
        assert_eq!(layout.num_separators(), 1);
        layout.remove_item(a).unwrap();
        assert_eq!(layout.count(), 1);
        assert_eq!(layout.item(b).unwrap().geometry(), Rect::new(0, 0, 800, 500));
        layout.check_sanity().unwrap();
    }

    #[test]
    fn unref_to_zero_removes() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_placeholder(Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        assert_eq!(layout.ref_item(a).unwrap(), 2);
        assert_eq!(layout.unref_item(a).unwrap(), 1);
        assert!(layout.contains(a));
        assert_eq!(layout.unref_item(a).unwrap(), 0);
        assert!(!layout.contains(a));
    }

    #[test]
    fn precondition_failures_leave_tree_untouched() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let before = layout.to_snapshot();
        let missing = ItemId::new(999).unwrap();
        assert_eq!(
            layout.insert_item(guest(2), Location::OnLeft, Some(missing), InsertOptions::default()),
            Err(LayoutError::UnknownItem { item: missing })
        );
        assert_eq!(
            layout.insert_item(guest(1), Location::OnLeft, Some(a), InsertOptions::default()),
            Err(LayoutError::DuplicateGuest { guest: guest(1) })
        );
        assert_eq!(
            layout.remove_item(layout.root_item()),
            Err(LayoutError::RootItem {
                item: layout.root_item()
            })
        );
        assert_eq!(
            layout.restore_placeholder(a, guest(5)),
            Err(LayoutError::NotAPlaceholder { item: a })
        );
        assert_eq!(layout.to_snapshot(), before);
    }

    #[test]
    fn window_grows_to_fit_minimums() {
        let mut layout = MultiSplitter::new(Size::new(100, 100));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        layout
            .insert_item(guest(2), Location::OnRight, Some(a), InsertOptions::default())
            .unwrap();
        assert_eq!(layout.size(), Size::new(165, 100));
        assert_eq!(layout.set_size(Size::new(10, 10)), Size::new(165, 90));
        layout.check_sanity().unwrap();
    }

    #[test]
    fn resize_keeps_proportions() {
        let mut layout = MultiSplitter::new(Size::new(501, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let b = layout
            .insert_item(guest(2), Location::OnRight, Some(a), InsertOptions::default())
            .unwrap();
        let before = (width(&layout, a), width(&layout, b));
        layout.set_size(Size::new(1920, 1080));
        let (wa, wb) = (width(&layout, a), width(&layout, b));
        assert!(f64::from((wa - wb).abs()) / f64::from(wa.max(wb)) <= 0.01);
        layout.set_size(Size::new(501, 500));
        assert_eq!((width(&layout, a), width(&layout, b)), before);
    }

    #[test]
    fn separator_moves_respect_minimums() {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(guest(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let b = layout
            .insert_item(guest(2), Location::OnRight, Some(a), InsertOptions::default())
            .unwrap();
        let separator = layout.separators()[0].id();

        assert_eq!(
            layout.move_separator(separator, 300, SeparatorMove::Strict),
            Ok(300)
        );
        assert_eq!(width(&layout, a), 300);
        assert_eq!(width(&layout, b), 495);

        assert_eq!(
            layout.move_separator(separator, 10, SeparatorMove::Clamp),
            Ok(80)
        );
        assert_eq!(
            layout.move_separator(separator, 790, SeparatorMove::Strict),
            Err(LayoutError::SeparatorOutOfBounds {
                separator,
                position: 790,
                min: 80,
                max: 715,
            })
        );
        assert_eq!(
            layout.move_separator(separator, -1, SeparatorMove::Clamp),
            Err(LayoutError::NegativeSeparatorPosition {
                separator,
                position: -1,
            })
        );
        layout.check_sanity().unwrap();
    }
}
