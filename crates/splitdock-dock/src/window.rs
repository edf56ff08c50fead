#![forbid(unsafe_code)]

//! Main and floating windows.
//!
//! Every window owns exactly one [`MultiSplitter`]. The layout size always
//! equals the window's content size: a layout that grows to fit its minimum
//! grows the window with it.

use std::collections::BTreeSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use splitdock_layout::{MultiSplitter, Rect};

use crate::ids::{FrameId, WindowId};

bitflags! {
    /// Options for [`DockRegistry::create_main_window`](crate::DockRegistry::create_main_window).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MainWindowOptions: u8 {
        /// Start with a persistent central frame.
        const HAS_CENTRAL_FRAME = 0b0001;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Main,
    Floating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    #[default]
    Normal,
    Maximized,
}

#[derive(Debug, Clone)]
pub struct Window {
    pub(crate) id: WindowId,
    pub(crate) kind: WindowKind,
    pub(crate) name: Option<String>,
    pub(crate) geometry: Rect,
    /// Geometry to return to when leaving the maximized state.
    pub(crate) normal_geometry: Rect,
    pub(crate) state: WindowState,
    pub(crate) affinities: BTreeSet<String>,
    pub(crate) layout: MultiSplitter,
    pub(crate) central_frame: Option<FrameId>,
}

impl Window {
    pub(crate) fn new(
        id: WindowId,
        kind: WindowKind,
        name: Option<String>,
        geometry: Rect,
        layout: MultiSplitter,
    ) -> Self {
        Self {
            id,
            kind,
            name,
            geometry,
            normal_geometry: geometry,
            state: WindowState::Normal,
            affinities: BTreeSet::new(),
            layout,
            central_frame: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> WindowId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> WindowKind {
        self.kind
    }

    #[must_use]
    pub const fn is_main(&self) -> bool {
        matches!(self.kind, WindowKind::Main)
    }

    /// Unique name of a main window; floating windows have none.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn geometry(&self) -> Rect {
        self.geometry
    }

    #[must_use]
    pub const fn normal_geometry(&self) -> Rect {
        self.normal_geometry
    }

    #[must_use]
    pub const fn state(&self) -> WindowState {
        self.state
    }

    /// Affinities set on a main window. Floating windows take theirs from
    /// the dock widgets they host; see
    /// [`DockRegistry::window_affinities`](crate::DockRegistry::window_affinities).
    #[must_use]
    pub const fn affinities(&self) -> &BTreeSet<String> {
        &self.affinities
    }

    #[must_use]
    pub const fn layout(&self) -> &MultiSplitter {
        &self.layout
    }

    #[must_use]
    pub const fn central_frame(&self) -> Option<FrameId> {
        self.central_frame
    }

    /// Keep the window's size in step with its layout.
    pub(crate) fn sync_size(&mut self) {
        let size = self.layout.size();
        if self.geometry.size() != size {
            self.geometry = Rect::from_origin_size(self.geometry.origin(), size);
            if self.state == WindowState::Normal {
                self.normal_geometry = self.geometry;
            }
        }
    }
}
