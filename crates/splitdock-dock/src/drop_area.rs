#![forbid(unsafe_code)]

//! Dropping a dragged floating window onto another window.
//!
//! A side drop grafts the floating window's whole layout into the target as
//! one subtree ([`DockRegistry::add_multi_splitter`]); a center drop tabs
//! every dragged dock widget into one frame. Either way the dragged window
//! is gone afterwards.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use splitdock_layout::{ItemId, Location, Rect};

use crate::dock_widget::{Position, affinities_compatible};
use crate::error::DockError;
use crate::ids::{DockWidgetId, FrameId, WindowId};
use crate::registry::DockRegistry;

/// Where over a target a drop lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropLocation {
    Left,
    Top,
    Right,
    Bottom,
    /// As tabs of the target frame.
    Center,
}

impl DropLocation {
    pub const ALL: [DropLocation; 5] = [
        DropLocation::Left,
        DropLocation::Top,
        DropLocation::Right,
        DropLocation::Bottom,
        DropLocation::Center,
    ];

    /// The layout location of a side drop; `None` for [`DropLocation::Center`].
    #[must_use]
    pub const fn location(self) -> Option<Location> {
        match self {
            Self::Left => Some(Location::OnLeft),
            Self::Top => Some(Location::OnTop),
            Self::Right => Some(Location::OnRight),
            Self::Bottom => Some(Location::OnBottom),
            Self::Center => None,
        }
    }
}

impl DockRegistry {
    /// Drop `dragged` onto `target`, next to `target_frame` or at the
    /// window's edge.
    ///
    /// Returns `Ok(false)` with nothing changed when the affinities don't
    /// match.
    pub fn drop(
        &mut self,
        target: WindowId,
        dragged: WindowId,
        target_frame: Option<FrameId>,
        location: DropLocation,
    ) -> Result<bool, DockError> {
        self.check_drop(target, dragged, target_frame)?;
        let center_frame = match location.location() {
            Some(_) => None,
            None => Some(
                target_frame
                    .or(self.window_ref(target)?.central_frame)
                    .ok_or(DockError::MissingCentralFrame { window: target })?,
            ),
        };

        let dragged_affinities = self.window_affinities(dragged);
        let target_affinities: BTreeSet<String> = match center_frame.or(target_frame) {
            Some(frame) => self.frame_affinities(frame),
            None => self.window_affinities(target),
        };
        if !affinities_compatible(&dragged_affinities, &target_affinities) {
            tracing::warn!(
                target = %target,
                dragged = %dragged,
                ?location,
                "Refusing to dock widget with incompatible affinity"
            );
            return Ok(false);
        }

        match (location.location(), center_frame) {
            (Some(side), _) => self.merge_window(target, dragged, side, target_frame)?,
            (None, Some(frame)) => {
                let dock_widgets = self.dock_widgets_in(dragged);
                for dock_widget in dock_widgets {
                    self.detach_from_frame(dock_widget)?;
                    self.add_to_frame(frame, dock_widget)?;
                }
            }
            (None, None) => {}
        }
        tracing::debug!(target = %target, dragged = %dragged, ?location, "window dropped");
        self.after_mutation();
        Ok(true)
    }

    /// Graft a floating window's layout into `target` at `location`,
    /// relative to a frame of `target` or its whole window. The floating
    /// window is consumed; its frames and dock widgets move over unchanged.
    pub fn add_multi_splitter(
        &mut self,
        target: WindowId,
        source: WindowId,
        location: Location,
        relative_to: Option<FrameId>,
    ) -> Result<(), DockError> {
        self.check_drop(target, source, relative_to)?;
        self.merge_window(target, source, location, relative_to)?;
        self.after_mutation();
        Ok(())
    }

    /// Where a side drop of `dragged` would land in `target`, in target
    /// window coordinates. Nothing changes.
    pub fn rect_for_drop(
        &self,
        target: WindowId,
        dragged: WindowId,
        location: Location,
        relative_to: Option<FrameId>,
    ) -> Result<Rect, DockError> {
        self.check_drop(target, dragged, relative_to)?;
        let anchor = self.anchor_for(target, relative_to)?;
        let dragged_layout = &self.window_ref(dragged)?.layout;
        let rect = self.window_ref(target)?.layout.rect_for_insert(
            location,
            anchor,
            dragged_layout.min_size(),
            dragged_layout.size(),
        )?;
        Ok(rect)
    }

    fn check_drop(
        &self,
        target: WindowId,
        dragged: WindowId,
        target_frame: Option<FrameId>,
    ) -> Result<(), DockError> {
        self.window_ref(target)?;
        if self.window_ref(dragged)?.is_main() {
            return Err(DockError::NotAFloatingWindow { window: dragged });
        }
        if target == dragged {
            return Err(DockError::SameWindow { window: target });
        }
        if let Some(frame) = target_frame {
            self.frame_in_window(frame, target)?;
        }
        Ok(())
    }

    fn anchor_for(
        &self,
        window: WindowId,
        frame: Option<FrameId>,
    ) -> Result<Option<ItemId>, DockError> {
        frame
            .map(|frame| self.frame_in_window(frame, window).map(|entry| entry.item))
            .transpose()
    }

    /// Dock widgets of a window, frame by frame in layout order.
    fn dock_widgets_in(&self, window: WindowId) -> Vec<DockWidgetId> {
        self.frames_in(window)
            .into_iter()
            .filter_map(|frame| self.frames.get(&frame))
            .flat_map(|frame| frame.dock_widgets.iter().copied())
            .collect()
    }

    fn merge_window(
        &mut self,
        target: WindowId,
        source: WindowId,
        location: Location,
        relative_to: Option<FrameId>,
    ) -> Result<(), DockError> {
        let anchor = self.anchor_for(target, relative_to)?;
        let source_layout = self.window_ref(source)?.layout.clone();
        let source_separators = source_layout.num_separators();
        let mapping = self
            .window_mut(target)?
            .layout
            .add_multi_splitter(source_layout, location, anchor)?;

        let moved: Vec<_> = self
            .frames
            .values()
            .filter(|frame| frame.window == source)
            .map(|frame| frame.id)
            .collect();
        for frame in &moved {
            let Some(entry) = self.frames.get_mut(frame) else {
                continue;
            };
            let item = mapping
                .get(&entry.item)
                .copied()
                .ok_or_else(|| DockError::Inconsistent {
                    window: Some(target),
                    item: Some(entry.item),
                    reason: format!("frame {frame} was lost in the merge"),
                })?;
            entry.window = target;
            entry.item = item;
        }
        // The source's frames live on in the target; drop the window alone.
        self.windows.remove(&source);

        if self.window_ref(target)?.is_main() {
            for frame in moved {
                let entry = self.frame_ref(frame)?;
                let position = Position {
                    window: target,
                    item: entry.item,
                };
                let dock_widgets = entry.dock_widgets.clone();
                for dock_widget in dock_widgets {
                    self.set_position(dock_widget, Some(position))?;
                }
            }
        }
        self.settle(target);
        tracing::debug!(
            target = %target,
            source = %source,
            ?location,
            source_separators,
            "window merged"
        );
        Ok(())
    }
}
