#![forbid(unsafe_code)]

//! Structural and geometric invariant checks.
//!
//! Both entry points are pure: they never mutate the tree, so they can be
//! called at any point, any number of times, with identical results.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::item::{GuestId, ItemId, ItemKind};
use crate::separator::SeparatorId;
use crate::splitter::{MultiSplitter, gaps};

/// Tolerance for the sum of visible children's percentages.
const PERCENTAGE_EPSILON: f64 = 0.01;

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    MissingRoot,
    RootHasParent,
    RootIsLeaf,
    RootGeometryMismatch,
    RootBelowMinimum,
    MissingChild,
    ParentMismatch,
    UnreachableItem,
    RedundantContainer,
    ZeroRefCount,
    DuplicateGuest,
    NegativeGeometry,
    BelowMinimumSize,
    HiddenItemHasLength,
    LengthMismatch,
    CrossAxisMismatch,
    SeparatorCountMismatch,
    SeparatorMisplaced,
    OrphanSeparator,
    NegativeSeparatorPosition,
    PercentageSum,
}

/// One invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub item: Option<ItemId>,
    pub separator: Option<SeparatorId>,
    pub message: String,
}

/// Every finding for one tree, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&InvariantIssue> {
        self.issues.first()
    }
}

/// The first violated invariant, as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub issue: InvariantIssue,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layout invariant violated ({:?}): {}",
            self.issue.code, self.issue.message
        )
    }
}

impl std::error::Error for InvariantViolation {}

impl MultiSplitter {
    /// Validate the tree, failing on the first violated invariant.
    ///
    /// Violations are logged at `error` level.
    pub fn check_sanity(&self) -> Result<(), InvariantViolation> {
        let report = self.invariant_report();
        match report.issues.into_iter().next() {
            None => Ok(()),
            Some(issue) => {
                tracing::error!(
                    code = ?issue.code,
                    item = ?issue.item.map(ItemId::get),
                    separator = ?issue.separator.map(SeparatorId::get),
                    message = %issue.message,
                    "layout invariant violated"
                );
                Err(InvariantViolation { issue })
            }
        }
    }

    /// Collect every invariant finding.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        let mut checker = Checker::default();
        self.check_root(&mut checker);
        self.check_structure(&mut checker);
        self.check_leaves(&mut checker);
        self.check_containers(&mut checker);
        InvariantReport {
            issues: checker.issues,
        }
    }

    fn check_root(&self, checker: &mut Checker) {
        let Some(root) = self.items.get(&self.root) else {
            checker.item(InvariantCode::MissingRoot, self.root, "root item missing");
            return;
        };
        if let Some(parent) = root.parent {
            checker.item(
                InvariantCode::RootHasParent,
                self.root,
                format!("root has parent {parent}"),
            );
        }
        if root.is_leaf() {
            checker.item(InvariantCode::RootIsLeaf, self.root, "root is a leaf");
        }
        if root.geometry.size() != self.size || root.geometry.x != 0 || root.geometry.y != 0 {
            checker.item(
                InvariantCode::RootGeometryMismatch,
                self.root,
                format!("root geometry {:?} vs layout size {:?}", root.geometry, self.size),
            );
        }
        let min = self.min_size();
        if !self.size.covers(min) {
            checker.item(
                InvariantCode::RootBelowMinimum,
                self.root,
                format!("layout size {:?} below minimum {min:?}", self.size),
            );
        }
    }

    fn check_structure(&self, checker: &mut Checker) {
        let mut seen = BTreeSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                checker.item(
                    InvariantCode::ParentMismatch,
                    id,
                    "item reachable through more than one path",
                );
                continue;
            }
            let Some(item) = self.items.get(&id) else {
                continue;
            };
            for child in item.children() {
                match self.items.get(child) {
                    None => checker.item(
                        InvariantCode::MissingChild,
                        id,
                        format!("container references missing child {child}"),
                    ),
                    Some(entry) if entry.parent != Some(id) => checker.item(
                        InvariantCode::ParentMismatch,
                        *child,
                        format!("listed under {id} but parent is {:?}", entry.parent),
                    ),
                    Some(_) => stack.push(*child),
                }
            }
            if id != self.root && item.is_container() && item.children().len() < 2 {
                checker.item(
                    InvariantCode::RedundantContainer,
                    id,
                    format!("container has {} children", item.children().len()),
                );
            }
        }
        for id in self.items.keys() {
            if !seen.contains(id) {
                checker.item(
                    InvariantCode::UnreachableItem,
                    *id,
                    "item is not reachable from the root",
                );
            }
        }
    }

    fn check_leaves(&self, checker: &mut Checker) {
        let mut guests: BTreeMap<GuestId, ItemId> = BTreeMap::new();
        for item in self.items.values() {
            let geometry = item.geometry;
            if geometry.x < 0 || geometry.y < 0 || geometry.width < 0 || geometry.height < 0 {
                checker.item(
                    InvariantCode::NegativeGeometry,
                    item.id,
                    format!("negative geometry {geometry:?}"),
                );
            }
            let ItemKind::Leaf(leaf) = &item.kind else {
                continue;
            };
            if leaf.ref_count == 0 {
                checker.item(InvariantCode::ZeroRefCount, item.id, "leaf has no holders");
            }
            match leaf.guest {
                Some(guest) => {
                    if let Some(other) = guests.insert(guest, item.id) {
                        checker.item(
                            InvariantCode::DuplicateGuest,
                            item.id,
                            format!("guest {guest} also hosted by {other}"),
                        );
                    }
                    if !geometry.size().covers(item.min_size) {
                        checker.item(
                            InvariantCode::BelowMinimumSize,
                            item.id,
                            format!("size {:?} below minimum {:?}", geometry.size(), item.min_size),
                        );
                    }
                }
                None => {
                    if geometry.width != 0 || geometry.height != 0 {
                        checker.item(
                            InvariantCode::HiddenItemHasLength,
                            item.id,
                            format!("placeholder has geometry {geometry:?}"),
                        );
                    }
                }
            }
        }
    }

    fn check_containers(&self, checker: &mut Checker) {
        let thickness = self.thickness();
        let mut owned: BTreeSet<SeparatorId> = BTreeSet::new();
        for item in self.items.values() {
            let Some(container) = item.container() else {
                continue;
            };
            owned.extend(container.separators.iter().copied());
            let orientation = container.orientation;
            let visible = self.visible_children(item.id);

            if container.separators.len() != visible.len().saturating_sub(1) {
                checker.item(
                    InvariantCode::SeparatorCountMismatch,
                    item.id,
                    format!(
                        "{} separators for {} visible children",
                        container.separators.len(),
                        visible.len()
                    ),
                );
            }

            if visible.is_empty() {
                if item.id != self.root && (item.geometry.width != 0 || item.geometry.height != 0) {
                    checker.item(
                        InvariantCode::HiddenItemHasLength,
                        item.id,
                        format!("hidden container has geometry {:?}", item.geometry),
                    );
                }
                continue;
            }

            let mut cursor = item.geometry.position(orientation);
            let mut total = 0.0;
            for (index, child) in visible.iter().enumerate() {
                let Some(entry) = self.items.get(child) else {
                    continue;
                };
                total += entry.percentage;
                if index > 0 {
                    if let Some(separator) = container
                        .separators
                        .get(index - 1)
                        .and_then(|s| self.separators.get(s))
                    {
                        if separator.position != cursor || separator.orientation != orientation {
                            checker.separator(
                                InvariantCode::SeparatorMisplaced,
                                separator.id,
                                format!(
                                    "separator at {} (expected {cursor}) in container {}",
                                    separator.position, item.id
                                ),
                            );
                        }
                    }
                    cursor += thickness;
                }
                if entry.geometry.position(orientation) != cursor {
                    checker.item(
                        InvariantCode::LengthMismatch,
                        *child,
                        format!(
                            "starts at {} instead of {cursor}",
                            entry.geometry.position(orientation)
                        ),
                    );
                }
                let across = orientation.opposite();
                if entry.geometry.position(across) != item.geometry.position(across)
                    || entry.geometry.length(across) != item.geometry.length(across)
                {
                    checker.item(
                        InvariantCode::CrossAxisMismatch,
                        *child,
                        "cross-axis span differs from its container",
                    );
                }
                cursor = entry.geometry.position(orientation) + entry.geometry.length(orientation);
            }
            let expected_end = item.geometry.end(orientation);
            if cursor != expected_end {
                checker.item(
                    InvariantCode::LengthMismatch,
                    item.id,
                    format!(
                        "children and {} separators end at {cursor}, container ends at {expected_end}",
                        gaps(visible.len())
                    ),
                );
            }
            if (total - 1.0).abs() > PERCENTAGE_EPSILON {
                checker.item(
                    InvariantCode::PercentageSum,
                    item.id,
                    format!("visible children percentages sum to {total}"),
                );
            }
        }

        for separator in self.separators.values() {
            if !owned.contains(&separator.id) {
                checker.separator(
                    InvariantCode::OrphanSeparator,
                    separator.id,
                    format!("separator claims container {}", separator.container),
                );
            }
            if separator.position < 0 {
                checker.separator(
                    InvariantCode::NegativeSeparatorPosition,
                    separator.id,
                    format!("separator at {}", separator.position),
                );
            }
        }
    }
}

#[derive(Default)]
struct Checker {
    issues: Vec<InvariantIssue>,
}

impl Checker {
    fn item(&mut self, code: InvariantCode, item: ItemId, message: impl Into<String>) {
        self.issues.push(InvariantIssue {
            code,
            item: Some(item),
            separator: None,
            message: message.into(),
        });
    }

    fn separator(&mut self, code: InvariantCode, separator: SeparatorId, message: impl Into<String>) {
        self.issues.push(InvariantIssue {
            code,
            item: None,
            separator: Some(separator),
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::InsertOptions;
    use splitdock_core::geometry::{Location, Size};

    fn populated() -> MultiSplitter {
        let mut layout = MultiSplitter::new(Size::new(800, 500));
        let a = layout
            .insert_item(GuestId::new(1), Location::OnLeft, None, InsertOptions::default())
            .unwrap();
        layout
            .insert_item(
                GuestId::new(2),
                Location::OnBottom,
                Some(a),
                InsertOptions::default(),
            )
            .unwrap();
        layout
    }

    #[test]
    fn consistent_tree_is_clean() {
        let layout = populated();
        assert!(layout.invariant_report().is_clean());
        assert!(layout.check_sanity().is_ok());
    }

    #[test]
    fn check_is_idempotent() {
        let layout = populated();
        let before = layout.to_snapshot();
        let first = layout.check_sanity();
        let second = layout.check_sanity();
        assert_eq!(first, second);
        assert_eq!(layout.to_snapshot(), before);
    }

    #[test]
    fn detects_zero_refcount_and_bad_geometry() {
        let mut layout = populated();
        let leaf = layout.items()[0];
        if let Some(item) = layout.items.get_mut(&leaf) {
            item.leaf_mut().unwrap().ref_count = 0;
            item.geometry.width -= 1;
        }
        let codes: Vec<InvariantCode> = layout
            .invariant_report()
            .issues
            .iter()
            .map(|issue| issue.code)
            .collect();
        assert!(codes.contains(&InvariantCode::ZeroRefCount));
        assert!(codes.contains(&InvariantCode::CrossAxisMismatch));
        let violation = layout.check_sanity().unwrap_err();
        assert_eq!(violation.issue.item, Some(leaf));
    }

    #[test]
    fn detects_stray_separator_position() {
        let mut layout = populated();
        let separator = layout.separators()[0].id();
        if let Some(entry) = layout.separators.get_mut(&separator) {
            entry.position = -3;
        }
        let codes: Vec<InvariantCode> = layout
            .invariant_report()
            .issues
            .iter()
            .map(|issue| issue.code)
            .collect();
        assert!(codes.contains(&InvariantCode::SeparatorMisplaced));
        assert!(codes.contains(&InvariantCode::NegativeSeparatorPosition));
    }
}
