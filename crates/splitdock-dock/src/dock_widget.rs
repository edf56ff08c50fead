#![forbid(unsafe_code)]

//! The user-facing panel.
//!
//! A dock widget owns no geometry. It is either hosted by a [`Frame`]
//! (visible, possibly as one tab of several) or hidden. Independently of
//! that it may remember a [`Position`]: the main-window item it last
//! occupied, which keeps that item alive as a placeholder while the widget
//! is floating or closed.
//!
//! [`Frame`]: crate::Frame

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use splitdock_layout::{ItemId, Rect, Size};

use crate::ids::{DockWidgetId, FrameId, WindowId};

/// A remembered slot in a main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub window: WindowId,
    pub item: ItemId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DockWidget {
    pub(crate) id: DockWidgetId,
    pub(crate) name: String,
    pub(crate) affinities: BTreeSet<String>,
    pub(crate) min_size: Option<Size>,
    pub(crate) frame: Option<FrameId>,
    pub(crate) last_position: Option<Position>,
    pub(crate) last_floating_geometry: Option<Rect>,
}

impl DockWidget {
    pub(crate) fn new(id: DockWidgetId, name: String) -> Self {
        Self {
            id,
            name,
            affinities: BTreeSet::new(),
            min_size: None,
            frame: None,
            last_position: None,
            last_floating_geometry: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> DockWidgetId {
        self.id
    }

    /// Unique name, used to match the widget when a layout is restored.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn affinities(&self) -> &BTreeSet<String> {
        &self.affinities
    }

    /// Minimum size this widget asks for; `None` means the registry default.
    #[must_use]
    pub const fn min_size(&self) -> Option<Size> {
        self.min_size
    }

    #[must_use]
    pub const fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    /// Hosted by a frame.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.frame.is_some()
    }

    #[must_use]
    pub const fn last_position(&self) -> Option<Position> {
        self.last_position
    }

    #[must_use]
    pub const fn last_floating_geometry(&self) -> Option<Rect> {
        self.last_floating_geometry
    }
}

/// Two affinity sets may share a frame or window when both are empty or
/// they have a tag in common.
#[must_use]
pub fn affinities_compatible(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    if a.is_empty() && b.is_empty() {
        return true;
    }
    a.intersection(b).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|tag| (*tag).to_owned()).collect()
    }

    #[test]
    fn affinity_rules() {
        assert!(affinities_compatible(&set(&[]), &set(&[])));
        assert!(affinities_compatible(&set(&["af1", "af2"]), &set(&["af2"])));
        assert!(!affinities_compatible(&set(&["af1"]), &set(&["af2"])));
        assert!(!affinities_compatible(&set(&["af1"]), &set(&[])));
    }

    #[test]
    fn new_widget_is_hidden_without_history() {
        let widget = DockWidget::new(DockWidgetId::MIN, "one".into());
        assert_eq!(widget.name(), "one");
        assert!(!widget.is_open());
        assert!(widget.last_position().is_none());
        assert!(widget.last_floating_geometry().is_none());
    }
}
