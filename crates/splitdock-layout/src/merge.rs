#![forbid(unsafe_code)]

//! Cross-tree operations: grafting another window's layout into this one,
//! and previewing where an insertion would land.

use std::collections::BTreeMap;

use splitdock_core::geometry::{Location, Rect, Size};

use crate::error::LayoutError;
use crate::item::{GuestId, Item, ItemId, ItemKind};
use crate::ops::{InsertOptions, LengthMode};
use crate::splitter::MultiSplitter;

impl MultiSplitter {
    /// Move every item of `other` into this tree as one new sibling subtree.
    ///
    /// Placeholders, reference counts, percentages and guests travel
    /// unchanged. The returned map translates `other`'s item IDs into the
    /// IDs they now have here, so holders can be re-homed.
    pub fn add_multi_splitter(
        &mut self,
        other: MultiSplitter,
        location: Location,
        relative_to: Option<ItemId>,
    ) -> Result<BTreeMap<ItemId, ItemId>, LayoutError> {
        if let Some(anchor) = relative_to {
            self.item_ref(anchor)?;
            if anchor == self.root {
                return Err(LayoutError::RootItem { item: anchor });
            }
        }
        for guest in other.guests_in(other.root) {
            if self.item_for_guest(guest).is_some() {
                return Err(LayoutError::DuplicateGuest { guest });
            }
        }

        let source = match other.children_of(other.root).as_slice() {
            [] => return Ok(BTreeMap::new()),
            [only] => *only,
            _ => other.root,
        };

        let mut mapping = BTreeMap::new();
        let grafted = self.adopt(&other, source, &mut mapping)?;
        if let Some(item) = self.items.get_mut(&grafted) {
            item.last_visible_size = other.size;
            item.percentage = 0.0;
        }
        self.attach(grafted, location, relative_to)?;
        if self.is_visible(grafted) {
            let length = other.size.length(self.orientation_of_parent(grafted));
            self.show_branch(grafted, LengthMode::Preferred(length))?;
        }
        self.finish_structural_change()?;

        // Containers may have been spliced away by normalization.
        mapping.retain(|_, new| self.items.contains_key(new));
        tracing::debug!(
            items = mapping.len(),
            ?location,
            relative_to = ?relative_to.map(ItemId::get),
            "merged layout"
        );
        Ok(mapping)
    }

    /// Rectangle a new visible leaf would get, without changing anything.
    ///
    /// The preview runs the real insertion on a copy, so it accounts for
    /// wrapping containers and window growth.
    pub fn rect_for_insert(
        &self,
        location: Location,
        relative_to: Option<ItemId>,
        min_size: Size,
        preferred_size: Size,
    ) -> Result<Rect, LayoutError> {
        let mut preview = self.clone();
        let guest = preview.unused_guest();
        let options = InsertOptions::default()
            .with_min_size(min_size)
            .with_preferred_size(preferred_size);
        let id = preview.insert_item(guest, location, relative_to, options)?;
        Ok(preview.item_ref(id)?.geometry())
    }

    fn unused_guest(&self) -> GuestId {
        let highest = self
            .items
            .values()
            .filter_map(Item::guest)
            .map(GuestId::get)
            .max()
            .unwrap_or(0);
        GuestId::new(highest.saturating_add(1))
    }

    fn orientation_of_parent(&self, id: ItemId) -> splitdock_core::Orientation {
        self.parent_of(id)
            .map_or(splitdock_core::Orientation::Vertical, |parent| {
                self.orientation_of(parent)
            })
    }

    /// Copy `source` and its subtree from `other` under fresh IDs.
    fn adopt(
        &mut self,
        other: &MultiSplitter,
        source: ItemId,
        mapping: &mut BTreeMap<ItemId, ItemId>,
    ) -> Result<ItemId, LayoutError> {
        let original = other.item_ref(source)?;
        let id = self.allocate_item_id()?;
        mapping.insert(source, id);

        let kind = match &original.kind {
            ItemKind::Leaf(leaf) => ItemKind::Leaf(leaf.clone()),
            ItemKind::Container(container) => {
                let mut children = Vec::with_capacity(container.children.len());
                for child in &container.children {
                    let adopted = self.adopt(other, *child, mapping)?;
                    if let Some(item) = self.items.get_mut(&adopted) {
                        item.parent = Some(id);
                    }
                    children.push(adopted);
                }
                let mut fresh = Item::new_container(id, container.orientation);
                if let Some(target) = fresh.container_mut() {
                    target.children = children;
                }
                fresh.kind
            }
        };
        self.items.insert(
            id,
            Item {
                id,
                parent: None,
                geometry: original.geometry,
                min_size: original.min_size,
                max_size_hint: original.max_size_hint,
                percentage: original.percentage,
                last_visible_size: original.last_visible_size,
                kind,
            },
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitdock_core::Orientation;

    fn guest(raw: u64) -> GuestId {
        GuestId::new(raw)
    }

    fn side_by_side(first: u64, size: Size) -> (MultiSplitter, ItemId, ItemId) {
        let mut layout = MultiSplitter::new(size);
        let a = layout
            .insert_item(guest(first), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        let b = layout
            .insert_item(
                guest(first + 1),
                Location::OnRight,
                Some(a),
                InsertOptions::default(),
            )
            .unwrap();
        (layout, a, b)
    }

    #[test]
    fn merge_flattens_matching_orientation() {
        let (floating, fa, fb) = side_by_side(1, Size::new(400, 400));
        let mut main = MultiSplitter::new(Size::new(800, 500));
        let c = main
            .insert_item(guest(10), Location::OnBottom, None, InsertOptions::default())
            .unwrap();
        assert_eq!(main.num_separators(), 0);

        let mapping = main
            .add_multi_splitter(floating, Location::OnRight, None)
            .unwrap();
        assert_eq!(main.num_separators(), 2);
        assert_eq!(main.count(), 3);
        let na = mapping[&fa];
        let nb = mapping[&fb];
        assert_eq!(main.items(), vec![c, na, nb]);
        assert_eq!(main.item(na).unwrap().guest(), Some(guest(1)));
        assert_eq!(
            main.item(main.root_item()).unwrap().orientation(),
            Some(Orientation::Horizontal)
        );
        main.check_sanity().unwrap();
    }

    #[test]
    fn merge_keeps_placeholders_and_refcounts() {
        let (mut floating, fa, fb) = side_by_side(1, Size::new(400, 400));
        floating.ref_item(fb).unwrap();
        floating.turn_into_placeholder(fb).unwrap();
        let mut main = MultiSplitter::new(Size::new(800, 500));
        let c = main
            .insert_item(guest(10), Location::OnLeft, None, InsertOptions::default())
            .unwrap();

        let mapping = main
            .add_multi_splitter(floating, Location::OnBottom, Some(c))
            .unwrap();
        let nb = mapping[&fb];
        assert!(main.item(nb).unwrap().is_placeholder());
        assert_eq!(main.item(nb).unwrap().ref_count(), 1);
        assert_eq!(main.item(mapping[&fa]).unwrap().ref_count(), 1);
        assert_eq!(main.placeholder_count(), 1);
        assert_eq!(main.visible_count(), 2);
        main.check_sanity().unwrap();
    }

    #[test]
    fn merge_uses_dragged_size_when_it_fits() {
        let mut floating = MultiSplitter::new(Size::new(300, 200));
        floating
            .insert_item(guest(1), Location::OnTop, None, InsertOptions::default())
            .unwrap();
        let mut main = MultiSplitter::new(Size::new(800, 500));
        main.insert_item(guest(10), Location::OnTop, None, InsertOptions::default())
            .unwrap();
        let preview = main
            .rect_for_insert(
                Location::OnBottom,
                None,
                Size::new(80, 90),
                floating.size(),
            )
            .unwrap();
        assert_eq!(preview.height, 200);
        let mapping = main
            .add_multi_splitter(floating, Location::OnBottom, None)
            .unwrap();
        let merged = main.item(*mapping.values().next().unwrap()).unwrap();
        assert_eq!(merged.geometry(), preview);
    }

    #[test]
    fn merge_rejects_shared_guests_without_mutating() {
        let (floating, _, _) = side_by_side(1, Size::new(400, 400));
        let mut main = MultiSplitter::new(Size::new(800, 500));
        main.insert_item(guest(2), Location::OnTop, None, InsertOptions::default())
            .unwrap();
        let before = main.to_snapshot();
        assert_eq!(
            main.add_multi_splitter(floating, Location::OnLeft, None),
            Err(LayoutError::DuplicateGuest { guest: guest(2) })
        );
        assert_eq!(main.to_snapshot(), before);
    }

    #[test]
    fn merging_an_empty_layout_is_a_no_op() {
        let mut main = MultiSplitter::new(Size::new(800, 500));
        let mapping = main
            .add_multi_splitter(MultiSplitter::new(Size::new(10, 10)), Location::OnLeft, None)
            .unwrap();
        assert!(mapping.is_empty());
        assert_eq!(main.count(), 0);
    }

    #[test]
    fn rect_for_insert_does_not_mutate() {
        let (layout, a, _) = side_by_side(1, Size::new(800, 500));
        let before = layout.to_snapshot();
        let rect = layout
            .rect_for_insert(Location::OnLeft, Some(a), Size::new(80, 90), Size::new(100, 100))
            .unwrap();
        assert_eq!(rect.x, 0);
        assert_eq!(rect.width, 100);
        assert_eq!(layout.to_snapshot(), before);
    }
}
