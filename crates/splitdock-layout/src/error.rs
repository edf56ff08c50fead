#![forbid(unsafe_code)]

use std::fmt;

use crate::item::{GuestId, ItemId};
use crate::sanity::InvariantViolation;
use crate::separator::SeparatorId;

/// Errors from layout tree operations.
///
/// Everything except [`LayoutError::Invariant`] is a precondition failure
/// detected before the tree is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    ZeroId {
        kind: &'static str,
    },
    IdOverflow {
        kind: &'static str,
    },
    UnknownItem {
        item: ItemId,
    },
    UnknownSeparator {
        separator: SeparatorId,
    },
    /// The root container cannot be removed, hidden or used as an anchor.
    RootItem {
        item: ItemId,
    },
    NotALeaf {
        item: ItemId,
    },
    NotAPlaceholder {
        item: ItemId,
    },
    NotVisible {
        item: ItemId,
    },
    DuplicateGuest {
        guest: GuestId,
    },
    NegativeSeparatorPosition {
        separator: SeparatorId,
        position: i32,
    },
    SeparatorOutOfBounds {
        separator: SeparatorId,
        position: i32,
        min: i32,
        max: i32,
    },
    UnsupportedSchemaVersion {
        version: u16,
    },
    InvalidSnapshot {
        item: Option<ItemId>,
        reason: String,
    },
    Invariant(InvariantViolation),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroId { kind } => write!(f, "{kind} id 0 is invalid"),
            Self::IdOverflow { kind } => write!(f, "{kind} id space exhausted"),
            Self::UnknownItem { item } => write!(f, "item {item} is not in this layout"),
            Self::UnknownSeparator { separator } => {
                write!(f, "separator {separator} is not in this layout")
            }
            Self::RootItem { item } => write!(f, "item {item} is the layout root"),
            Self::NotALeaf { item } => write!(f, "item {item} is a container"),
            Self::NotAPlaceholder { item } => write!(f, "item {item} is not a placeholder"),
            Self::NotVisible { item } => write!(f, "item {item} is not visible"),
            Self::DuplicateGuest { guest } => {
                write!(f, "guest {guest} is already hosted by this layout")
            }
            Self::NegativeSeparatorPosition {
                separator,
                position,
            } => write!(
                f,
                "separator {separator} cannot move to negative position {position}"
            ),
            Self::SeparatorOutOfBounds {
                separator,
                position,
                min,
                max,
            } => write!(
                f,
                "separator {separator} position {position} outside [{min}, {max}]"
            ),
            Self::UnsupportedSchemaVersion { version } => write!(
                f,
                "unsupported layout schema version {version} (expected {})",
                crate::snapshot::LAYOUT_SCHEMA_VERSION
            ),
            Self::InvalidSnapshot { item, reason } => match item {
                Some(item) => write!(f, "invalid layout snapshot at item {item}: {reason}"),
                None => write!(f, "invalid layout snapshot: {reason}"),
            },
            Self::Invariant(violation) => write!(f, "{violation}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invariant(violation) => Some(violation),
            _ => None,
        }
    }
}

impl From<InvariantViolation> for LayoutError {
    fn from(violation: InvariantViolation) -> Self {
        Self::Invariant(violation)
    }
}
