#![forbid(unsafe_code)]

//! Serializable layout snapshots.
//!
//! A snapshot records every item with its geometry, constraints, share of
//! its parent and, for leaves, the guest and reference count. Restoring a
//! snapshot rebuilds the tree under the same IDs and relayouts it; with the
//! same window size the geometry comes back identical.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use splitdock_core::geometry::{Orientation, Rect, Size};

use crate::error::LayoutError;
use crate::item::{Container, GuestId, Item, ItemId, ItemKind, Leaf};
use crate::splitter::MultiSplitter;

/// Current snapshot schema version.
pub const LAYOUT_SCHEMA_VERSION: u16 = 1;

/// Deepest container nesting a snapshot may describe. Layout passes recurse
/// once per level.
pub const MAX_SNAPSHOT_DEPTH: usize = 256;

/// Whole-tree snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub schema_version: u16,
    pub size: Size,
    pub root: ItemId,
    /// Next item ID the tree would allocate.
    pub next_id: u64,
    /// Items in depth-first order, root first.
    pub items: Vec<ItemRecord>,
}

/// One item in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub parent: Option<ItemId>,
    pub geometry: Rect,
    pub min_size: Size,
    pub max_size_hint: Size,
    pub percentage: f64,
    pub last_visible_size: Size,
    pub kind: ItemRecordKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemRecordKind {
    Leaf {
        guest: Option<GuestId>,
        placeholder: bool,
        ref_count: u32,
    },
    Container {
        orientation: Orientation,
        children: Vec<ItemId>,
    },
}

impl ItemRecord {
    /// Guest hosted by a leaf record.
    #[must_use]
    pub fn guest(&self) -> Option<GuestId> {
        match &self.kind {
            ItemRecordKind::Leaf { guest, .. } => *guest,
            ItemRecordKind::Container { .. } => None,
        }
    }
}

impl MultiSplitter {
    /// Capture the tree.
    #[must_use]
    pub fn to_snapshot(&self) -> LayoutSnapshot {
        let mut records = Vec::with_capacity(self.items.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(item) = self.items.get(&id) else {
                continue;
            };
            let kind = match &item.kind {
                ItemKind::Leaf(leaf) => ItemRecordKind::Leaf {
                    guest: leaf.guest,
                    placeholder: leaf.guest.is_none(),
                    ref_count: leaf.ref_count,
                },
                ItemKind::Container(container) => {
                    stack.extend(container.children.iter().rev().copied());
                    ItemRecordKind::Container {
                        orientation: container.orientation,
                        children: container.children.clone(),
                    }
                }
            };
            records.push(ItemRecord {
                id,
                parent: item.parent,
                geometry: item.geometry,
                min_size: item.min_size,
                max_size_hint: item.max_size_hint,
                percentage: item.percentage,
                last_visible_size: item.last_visible_size,
                kind,
            });
        }
        LayoutSnapshot {
            schema_version: LAYOUT_SCHEMA_VERSION,
            size: self.size,
            root: self.root,
            next_id: self.next_item,
            items: records,
        }
    }

    /// Build a tree from a snapshot using the default configuration.
    pub fn from_snapshot(snapshot: &LayoutSnapshot) -> Result<Self, LayoutError> {
        let mut layout = MultiSplitter::new(snapshot.size);
        layout.restore(snapshot)?;
        Ok(layout)
    }

    /// Replace the whole tree with `snapshot`.
    ///
    /// The snapshot is validated and the new tree checked for sanity before
    /// it replaces the current one; on error nothing changes. Items of the
    /// old tree that don't survive are queued for reaping.
    pub fn restore(&mut self, snapshot: &LayoutSnapshot) -> Result<(), LayoutError> {
        validate(snapshot)?;

        let mut rebuilt = MultiSplitter::with_config(snapshot.size, self.config);
        rebuilt.items.clear();
        rebuilt.root = snapshot.root;
        rebuilt.next_item = snapshot.next_id;
        for record in &snapshot.items {
            let kind = match &record.kind {
                ItemRecordKind::Leaf {
                    guest, ref_count, ..
                } => ItemKind::Leaf(Leaf {
                    guest: *guest,
                    ref_count: *ref_count,
                }),
                ItemRecordKind::Container {
                    orientation,
                    children,
                } => ItemKind::Container(Container {
                    orientation: *orientation,
                    children: children.clone(),
                    separators: Vec::new(),
                }),
            };
            rebuilt.items.insert(
                record.id,
                Item {
                    id: record.id,
                    parent: record.parent,
                    geometry: record.geometry,
                    min_size: record.min_size,
                    max_size_hint: record.max_size_hint,
                    percentage: record.percentage,
                    last_visible_size: record.last_visible_size,
                    kind,
                },
            );
        }
        rebuilt.normalize();
        rebuilt.sync_separators()?;
        rebuilt.grow_to_fit();
        rebuilt.relayout();
        rebuilt.check_sanity()?;
        rebuilt.reaped.clear();

        let mut reaped = std::mem::take(&mut self.reaped);
        reaped.extend(
            self.items
                .keys()
                .filter(|id| !rebuilt.items.contains_key(id))
                .copied(),
        );
        rebuilt.reaped = reaped;
        *self = rebuilt;
        tracing::debug!(
            items = self.items.len(),
            width = self.size.width,
            height = self.size.height,
            "layout restored"
        );
        Ok(())
    }
}

fn invalid(item: Option<ItemId>, reason: impl Into<String>) -> LayoutError {
    LayoutError::InvalidSnapshot {
        item,
        reason: reason.into(),
    }
}

/// Structural validation of a snapshot before anything is built from it.
fn validate(snapshot: &LayoutSnapshot) -> Result<(), LayoutError> {
    if snapshot.schema_version != LAYOUT_SCHEMA_VERSION {
        return Err(LayoutError::UnsupportedSchemaVersion {
            version: snapshot.schema_version,
        });
    }
    if snapshot.size.width < 0 || snapshot.size.height < 0 {
        return Err(invalid(None, format!("negative size {:?}", snapshot.size)));
    }

    let mut records: BTreeMap<ItemId, &ItemRecord> = BTreeMap::new();
    for record in &snapshot.items {
        if records.insert(record.id, record).is_some() {
            return Err(invalid(Some(record.id), "duplicate item id"));
        }
        if record.id.get() >= snapshot.next_id {
            return Err(invalid(
                Some(record.id),
                format!("id not below next_id {}", snapshot.next_id),
            ));
        }
        if !record.percentage.is_finite() || record.percentage < 0.0 {
            return Err(invalid(
                Some(record.id),
                format!("invalid percentage {}", record.percentage),
            ));
        }
        if let ItemRecordKind::Leaf {
            guest,
            placeholder,
            ref_count,
        } = &record.kind
        {
            if *placeholder != guest.is_none() {
                return Err(invalid(Some(record.id), "placeholder flag disagrees with guest"));
            }
            if *ref_count == 0 {
                return Err(invalid(Some(record.id), "leaf without holders"));
            }
        }
    }

    let root = records
        .get(&snapshot.root)
        .ok_or_else(|| invalid(Some(snapshot.root), "root missing"))?;
    if root.parent.is_some() {
        return Err(invalid(Some(snapshot.root), "root has a parent"));
    }
    if !matches!(root.kind, ItemRecordKind::Container { .. }) {
        return Err(invalid(Some(snapshot.root), "root is a leaf"));
    }

    let mut reached = BTreeSet::new();
    let mut guests = BTreeSet::new();
    let mut stack = vec![(snapshot.root, 0_usize)];
    while let Some((id, depth)) = stack.pop() {
        if depth > MAX_SNAPSHOT_DEPTH {
            return Err(invalid(
                Some(id),
                format!("nested deeper than {MAX_SNAPSHOT_DEPTH} levels"),
            ));
        }
        if !reached.insert(id) {
            return Err(invalid(Some(id), "item reachable twice"));
        }
        let record = records
            .get(&id)
            .ok_or_else(|| invalid(Some(id), "referenced item missing"))?;
        match &record.kind {
            ItemRecordKind::Leaf { guest, .. } => {
                if let Some(guest) = guest {
                    if !guests.insert(*guest) {
                        return Err(invalid(Some(id), format!("guest {guest} hosted twice")));
                    }
                }
            }
            ItemRecordKind::Container { children, .. } => {
                for child in children {
                    let entry = records
                        .get(child)
                        .ok_or_else(|| invalid(Some(id), format!("missing child {child}")))?;
                    if entry.parent != Some(id) {
                        return Err(invalid(
                            Some(*child),
                            format!("parent {:?} disagrees with container {id}", entry.parent),
                        ));
                    }
                    stack.push((*child, depth + 1));
                }
            }
        }
    }
    if let Some(stray) = records.keys().find(|id| !reached.contains(id)) {
        return Err(invalid(Some(*stray), "item unreachable from root"));
    }
    Ok(())
}
