#![forbid(unsafe_code)]

//! Showing, hiding, floating, docking and tabbing dock widgets.
//!
//! Affinity mismatches are policy outcomes: the call logs a warning and
//! returns `Ok(false)` with nothing changed. Unknown handles and impossible
//! anchors are `Err`, detected before anything changes.

use std::collections::BTreeSet;

use splitdock_layout::{InsertOptions, ItemId, Location, MultiSplitter, Rect, Size};

use crate::dock_widget::{Position, affinities_compatible};
use crate::error::DockError;
use crate::frame::{Frame, FrameOptions};
use crate::ids::{DockWidgetId, FrameId, WindowId};
use crate::registry::DockRegistry;
use crate::window::{Window, WindowKind};

/// How [`DockRegistry::add_dock_widget`] places the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddingOption {
    /// Dock and show.
    #[default]
    None,
    /// Reserve the slot as a placeholder; the widget appears there on
    /// [`DockRegistry::show`].
    StartHidden,
}

impl DockRegistry {
    /// Show a hidden dock widget: back at its remembered main-window
    /// position if it has one, otherwise in a new floating window.
    pub fn show(&mut self, dock_widget: DockWidgetId) -> Result<(), DockError> {
        let widget = self.dock_widget_ref(dock_widget)?;
        if widget.frame.is_some() {
            return Ok(());
        }
        let geometry = widget
            .last_floating_geometry
            .unwrap_or_else(|| Rect::from_size(self.config.floating_window_size));
        match self.valid_position(dock_widget) {
            Some(position) => self.restore_to_position(dock_widget, position)?,
            None => {
                self.float_into_new_window(dock_widget, geometry)?;
            }
        }
        tracing::debug!(dock_widget = %dock_widget, "dock widget shown");
        self.after_mutation();
        Ok(())
    }

    /// Hide a dock widget. Its main-window position is kept, so the slot
    /// stays behind as a placeholder.
    pub fn close(&mut self, dock_widget: DockWidgetId) -> Result<(), DockError> {
        if self.dock_widget_ref(dock_widget)?.frame.is_none() {
            return Ok(());
        }
        if self.is_floating(dock_widget) {
            let geometry = self
                .window_of(dock_widget)
                .and_then(|window| self.windows.get(&window))
                .map(Window::geometry);
            self.dock_widget_mut(dock_widget)?.last_floating_geometry = geometry;
        }
        self.detach_from_frame(dock_widget)?;
        tracing::debug!(dock_widget = %dock_widget, "dock widget closed");
        self.after_mutation();
        Ok(())
    }

    /// Close a dock widget, release its position and forget it.
    pub fn delete_dock_widget(&mut self, dock_widget: DockWidgetId) -> Result<(), DockError> {
        self.dock_widget_ref(dock_widget)?;
        self.detach_from_frame(dock_widget)?;
        self.set_position(dock_widget, None)?;
        self.dock_widgets.remove(&dock_widget);
        tracing::debug!(dock_widget = %dock_widget, "dock widget deleted");
        self.after_mutation();
        Ok(())
    }

    /// Float or redock a dock widget.
    ///
    /// Returns `Ok(false)` when asked to redock a widget that was never
    /// docked in a main window.
    pub fn set_floating(
        &mut self,
        dock_widget: DockWidgetId,
        floats: bool,
    ) -> Result<bool, DockError> {
        let widget = self.dock_widget_ref(dock_widget)?;
        if floats == self.is_floating(dock_widget) {
            return Ok(true);
        }
        if floats {
            let geometry = match widget.frame {
                Some(frame) => self.frame_global_geometry(frame)?,
                None => widget
                    .last_floating_geometry
                    .unwrap_or_else(|| Rect::from_size(self.config.floating_window_size)),
            };
            self.detach_from_frame(dock_widget)?;
            self.float_into_new_window(dock_widget, geometry)?;
        } else {
            let Some(position) = self.valid_position(dock_widget) else {
                return Ok(false);
            };
            self.detach_from_frame(dock_widget)?;
            self.restore_to_position(dock_widget, position)?;
        }
        tracing::debug!(dock_widget = %dock_widget, floats, "floating state changed");
        self.after_mutation();
        Ok(true)
    }

    /// Dock a widget into a main window at `location`, relative to the
    /// whole window or to another dock widget's slot in it.
    pub fn add_dock_widget(
        &mut self,
        window: WindowId,
        dock_widget: DockWidgetId,
        location: Location,
        relative_to: Option<DockWidgetId>,
        option: AddingOption,
    ) -> Result<bool, DockError> {
        self.main_window_ref(window)?;
        self.dock_widget_ref(dock_widget)?;
        if relative_to == Some(dock_widget) {
            return Err(DockError::SelfRelative { dock_widget });
        }
        let anchor = relative_to
            .map(|relative| self.anchor_item(window, relative))
            .transpose()?;
        if !self.accepts(&self.window_affinities(window), dock_widget) {
            return Ok(false);
        }
        self.dock_into(window, dock_widget, location, anchor, option)?;
        self.after_mutation();
        Ok(true)
    }

    /// Dock a widget next to a frame (or at an edge) of any window.
    pub fn nest_dock_widget(
        &mut self,
        window: WindowId,
        dock_widget: DockWidgetId,
        relative_to: Option<FrameId>,
        location: Location,
    ) -> Result<bool, DockError> {
        let is_main = self.window_ref(window)?.is_main();
        let current = self.dock_widget_ref(dock_widget)?.frame;
        // Detaching the only widget of a floating window would destroy it.
        if !is_main && self.window_of(dock_widget) == Some(window) && self.is_floating(dock_widget)
        {
            return Err(DockError::SelfRelative { dock_widget });
        }
        let anchor = match relative_to {
            Some(frame) => {
                let entry = self.frame_in_window(frame, window)?;
                if current == Some(frame) && entry.dock_widgets.len() == 1 {
                    return Err(DockError::SelfRelative { dock_widget });
                }
                Some(entry.item)
            }
            None => None,
        };
        if !self.accepts(&self.window_affinities(window), dock_widget) {
            return Ok(false);
        }
        self.dock_into(window, dock_widget, location, anchor, AddingOption::None)?;
        self.after_mutation();
        Ok(true)
    }

    /// Dock a widget at the `location` edge of the window showing `anchor`.
    pub fn add_dock_widget_to_containing_window(
        &mut self,
        anchor: DockWidgetId,
        dock_widget: DockWidgetId,
        location: Location,
    ) -> Result<bool, DockError> {
        self.dock_widget_ref(dock_widget)?;
        if anchor == dock_widget {
            return Err(DockError::SelfRelative { dock_widget });
        }
        let window = self
            .window_of(anchor)
            .ok_or(DockError::NotShown { dock_widget: anchor })?;
        if !self.accepts(&self.window_affinities(window), dock_widget) {
            return Ok(false);
        }
        self.dock_into(window, dock_widget, location, None, AddingOption::None)?;
        self.after_mutation();
        Ok(true)
    }

    /// Add `dock_widget` as the current tab of the frame showing `target`.
    pub fn add_dock_widget_as_tab(
        &mut self,
        target: DockWidgetId,
        dock_widget: DockWidgetId,
    ) -> Result<bool, DockError> {
        let frame = self
            .dock_widget_ref(target)?
            .frame
            .ok_or(DockError::NotShown { dock_widget: target })?;
        self.dock_widget_ref(dock_widget)?;
        if target == dock_widget {
            return Err(DockError::SelfRelative { dock_widget });
        }
        let affinities = self.frame_affinities(frame);
        self.tab_into(frame, dock_widget, &affinities)
    }

    /// Add a dock widget as a tab of a main window's central frame.
    pub fn add_dock_widget_as_tab_to_window(
        &mut self,
        window: WindowId,
        dock_widget: DockWidgetId,
    ) -> Result<bool, DockError> {
        let frame = self
            .main_window_ref(window)?
            .central_frame
            .ok_or(DockError::MissingCentralFrame { window })?;
        self.dock_widget_ref(dock_widget)?;
        let affinities = self.window_affinities(window);
        self.tab_into(frame, dock_widget, &affinities)
    }

    /// Make a dock widget the tab its frame shows. A hidden widget is left
    /// alone.
    pub fn set_as_current_tab(&mut self, dock_widget: DockWidgetId) -> Result<(), DockError> {
        let Some(frame) = self.dock_widget_ref(dock_widget)?.frame else {
            return Ok(());
        };
        if let Some(entry) = self.frames.get_mut(&frame) {
            entry.set_current(dock_widget);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_current_tab(&self, dock_widget: DockWidgetId) -> bool {
        self.dock_widgets
            .get(&dock_widget)
            .and_then(|widget| widget.frame)
            .and_then(|frame| self.frames.get(&frame))
            .and_then(Frame::current_dock_widget)
            == Some(dock_widget)
    }

    pub fn set_dock_widget_affinities<I, S>(
        &mut self,
        dock_widget: DockWidgetId,
        affinities: I,
    ) -> Result<(), DockError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dock_widget_mut(dock_widget)?.affinities =
            affinities.into_iter().map(Into::into).collect();
        Ok(())
    }

    pub fn set_main_window_affinities<I, S>(
        &mut self,
        window: WindowId,
        affinities: I,
    ) -> Result<(), DockError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.main_window_ref(window)?;
        self.window_mut(window)?.affinities = affinities.into_iter().map(Into::into).collect();
        Ok(())
    }

    /// Change the minimum size a dock widget asks for. Its frame, if any,
    /// follows, growing the window when needed.
    pub fn set_dock_widget_min_size(
        &mut self,
        dock_widget: DockWidgetId,
        min_size: Option<Size>,
    ) -> Result<(), DockError> {
        let widget = self.dock_widget_mut(dock_widget)?;
        widget.min_size = min_size;
        if let Some(frame) = widget.frame {
            self.refresh_frame_min_size(frame)?;
        }
        self.after_mutation();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Internal.
    // ---------------------------------------------------------------------

    /// Affinity gate shared by every docking entry point.
    fn accepts(&self, target: &BTreeSet<String>, dock_widget: DockWidgetId) -> bool {
        let Some(widget) = self.dock_widgets.get(&dock_widget) else {
            return false;
        };
        if affinities_compatible(&widget.affinities, target) {
            return true;
        }
        tracing::warn!(
            dock_widget = %dock_widget,
            widget_affinities = ?widget.affinities,
            target_affinities = ?target,
            "Refusing to dock widget with incompatible affinity"
        );
        false
    }

    /// The item in `window` a dock widget can serve as anchor with: its
    /// frame's item if shown there, else its remembered slot there.
    fn anchor_item(&self, window: WindowId, relative: DockWidgetId) -> Result<ItemId, DockError> {
        let widget = self.dock_widget_ref(relative)?;
        if let Some(frame) = widget.frame.and_then(|frame| self.frames.get(&frame)) {
            if frame.window == window {
                return Ok(frame.item);
            }
        }
        match widget.last_position {
            Some(position) if position.window == window => Ok(position.item),
            _ => Err(DockError::NotInWindow {
                dock_widget: relative,
                window,
            }),
        }
    }

    pub(crate) fn frame_in_window(
        &self,
        frame: FrameId,
        window: WindowId,
    ) -> Result<&Frame, DockError> {
        let entry = self.frame_ref(frame)?;
        if entry.window != window {
            return Err(DockError::FrameNotInWindow { frame, window });
        }
        Ok(entry)
    }

    /// Frame geometry in screen coordinates.
    fn frame_global_geometry(&self, frame: FrameId) -> Result<Rect, DockError> {
        let entry = self.frame_ref(frame)?;
        let origin = self.window_ref(entry.window)?.geometry.origin();
        let local = self
            .frame_geometry(frame)
            .ok_or_else(|| DockError::Inconsistent {
                window: Some(entry.window),
                item: Some(entry.item),
                reason: format!("frame {frame} has no item"),
            })?;
        Ok(local.translated(origin.x, origin.y))
    }

    fn dock_into(
        &mut self,
        window: WindowId,
        dock_widget: DockWidgetId,
        location: Location,
        anchor: Option<ItemId>,
        option: AddingOption,
    ) -> Result<(), DockError> {
        let is_main = self.window_ref(window)?.is_main();
        match option {
            AddingOption::None => {
                self.detach_from_frame(dock_widget)?;
                let frame = self.insert_frame(
                    window,
                    &[dock_widget],
                    location,
                    anchor,
                    None,
                    FrameOptions::empty(),
                )?;
                if is_main {
                    let item = self.frame_ref(frame)?.item;
                    self.set_position(dock_widget, Some(Position { window, item }))?;
                }
            }
            AddingOption::StartHidden => {
                if !is_main {
                    return Err(DockError::NotAMainWindow { window });
                }
                self.detach_from_frame(dock_widget)?;
                let min = self.frame_min_size(&[dock_widget]);
                let item = self.window_mut(window)?.layout.insert_placeholder(
                    location,
                    anchor,
                    InsertOptions::default().with_min_size(min),
                )?;
                // The placeholder's initial reference is the position's.
                let old = self
                    .dock_widget_mut(dock_widget)?
                    .last_position
                    .replace(Position { window, item });
                if let Some(old) = old {
                    if let Some(entry) = self.windows.get_mut(&old.window) {
                        if entry.layout.contains(old.item) {
                            entry.layout.unref_item(old.item)?;
                        }
                    }
                    self.settle(old.window);
                }
                self.settle(window);
            }
        }
        tracing::debug!(
            dock_widget = %dock_widget,
            window = %window,
            ?location,
            ?option,
            "dock widget docked"
        );
        Ok(())
    }

    fn tab_into(
        &mut self,
        frame: FrameId,
        dock_widget: DockWidgetId,
        affinities: &BTreeSet<String>,
    ) -> Result<bool, DockError> {
        if self.frame_ref(frame)?.contains(dock_widget) {
            self.set_as_current_tab(dock_widget)?;
            return Ok(true);
        }
        if !self.accepts(affinities, dock_widget) {
            return Ok(false);
        }
        self.detach_from_frame(dock_widget)?;
        self.add_to_frame(frame, dock_widget)?;
        tracing::debug!(dock_widget = %dock_widget, frame = %frame, "dock widget tabbed");
        self.after_mutation();
        Ok(true)
    }

    /// Put a hidden dock widget back at `position`: restore the placeholder
    /// with a new frame, or join the frame already shown there.
    pub(crate) fn restore_to_position(
        &mut self,
        dock_widget: DockWidgetId,
        position: Position,
    ) -> Result<(), DockError> {
        let item = self
            .window_ref(position.window)?
            .layout
            .item(position.item)
            .ok_or_else(|| DockError::Inconsistent {
                window: Some(position.window),
                item: Some(position.item),
                reason: format!("position of dock widget {dock_widget} is gone"),
            })?;
        match item.guest() {
            None => {
                let min = self.frame_min_size(&[dock_widget]);
                let frame = self.allocate_frame_id()?;
                let layout = &mut self.window_mut(position.window)?.layout;
                layout.set_min_size(position.item, min)?;
                layout.restore_placeholder(position.item, frame.into())?;
                let mut entry = Frame::new(
                    frame,
                    position.window,
                    position.item,
                    FrameOptions::empty(),
                );
                entry.add_tab(dock_widget);
                self.frames.insert(frame, entry);
                self.dock_widget_mut(dock_widget)?.frame = Some(frame);
                self.settle(position.window);
            }
            Some(guest) => {
                let frame = FrameId::from_guest(guest)?;
                self.add_to_frame(frame, dock_widget)?;
            }
        }
        Ok(())
    }

    /// Create a floating window at `geometry` holding just `dock_widget`.
    pub(crate) fn float_into_new_window(
        &mut self,
        dock_widget: DockWidgetId,
        geometry: Rect,
    ) -> Result<WindowId, DockError> {
        let size = geometry
            .size()
            .expanded_to(self.frame_min_size(&[dock_widget]));
        let id = self.allocate_window_id()?;
        let layout = MultiSplitter::with_config(size, self.config.splitter_config());
        self.windows.insert(
            id,
            Window::new(
                id,
                WindowKind::Floating,
                None,
                Rect::from_origin_size(geometry.origin(), size),
                layout,
            ),
        );
        self.insert_frame(
            id,
            &[dock_widget],
            Location::OnTop,
            None,
            None,
            FrameOptions::empty(),
        )?;
        tracing::debug!(dock_widget = %dock_widget, window = %id, "floating window created");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::MainWindowOptions;

    fn setup() -> (DockRegistry, WindowId) {
        let mut registry = DockRegistry::new();
        let main = registry
            .create_main_window("main", Size::new(800, 500), MainWindowOptions::empty())
            .unwrap();
        (registry, main)
    }

    #[test]
    fn show_without_history_floats_at_the_default_size() {
        let (mut registry, _) = setup();
        let dw = registry.create_dock_widget("dw").unwrap();
        registry.show(dw).unwrap();
        assert!(registry.is_floating(dw));
        let window = registry.window_of(dw).unwrap();
        assert_eq!(
            registry.window(window).unwrap().geometry(),
            Rect::new(0, 0, 400, 400)
        );
        registry.check_sanity().unwrap();
    }

    #[test]
    fn close_then_show_floats_at_the_remembered_geometry() {
        let (mut registry, _) = setup();
        let dw = registry.create_dock_widget("dw").unwrap();
        registry.show(dw).unwrap();
        let window = registry.window_of(dw).unwrap();
        registry.resize_window(window, Size::new(300, 250)).unwrap();
        registry.close(dw).unwrap();
        assert!(registry.floating_windows().is_empty());
        assert_eq!(
            registry.dock_widget(dw).unwrap().last_floating_geometry(),
            Some(Rect::new(0, 0, 300, 250))
        );
        registry.show(dw).unwrap();
        let window = registry.window_of(dw).unwrap();
        assert_eq!(registry.window(window).unwrap().geometry().size(), Size::new(300, 250));
    }

    #[test]
    fn relative_to_self_is_rejected() {
        let (mut registry, main) = setup();
        let dw = registry.create_dock_widget("dw").unwrap();
        assert_eq!(
            registry.add_dock_widget(main, dw, Location::OnLeft, Some(dw), AddingOption::None),
            Err(DockError::SelfRelative { dock_widget: dw })
        );
    }

    #[test]
    fn anchor_must_live_in_the_window() {
        let (mut registry, main) = setup();
        let a = registry.create_dock_widget("a").unwrap();
        let b = registry.create_dock_widget("b").unwrap();
        registry.show(a).unwrap();
        assert_eq!(
            registry.add_dock_widget(main, b, Location::OnLeft, Some(a), AddingOption::None),
            Err(DockError::NotInWindow {
                dock_widget: a,
                window: main
            })
        );
        assert!(registry.dock_widget(b).unwrap().frame().is_none());
    }

    #[test]
    fn tabbing_needs_a_shown_target() {
        let (mut registry, _) = setup();
        let a = registry.create_dock_widget("a").unwrap();
        let b = registry.create_dock_widget("b").unwrap();
        assert_eq!(
            registry.add_dock_widget_as_tab(a, b),
            Err(DockError::NotShown { dock_widget: a })
        );
    }

    #[test]
    fn window_tab_needs_a_central_frame() {
        let (mut registry, main) = setup();
        let dw = registry.create_dock_widget("dw").unwrap();
        assert_eq!(
            registry.add_dock_widget_as_tab_to_window(main, dw),
            Err(DockError::MissingCentralFrame { window: main })
        );
    }

    #[test]
    fn min_size_follows_into_the_frame() {
        let (mut registry, main) = setup();
        let dw = registry.create_dock_widget("dw").unwrap();
        registry
            .add_dock_widget(main, dw, Location::OnLeft, None, AddingOption::None)
            .unwrap();
        registry
            .set_dock_widget_min_size(dw, Some(Size::new(900, 100)))
            .unwrap();
        let item = registry.dock_widget(dw).unwrap().last_position().unwrap().item;
        let layout = registry.layout(main).unwrap();
        assert_eq!(layout.item(item).unwrap().min_size(), Size::new(900, 100));
        assert_eq!(registry.window(main).unwrap().geometry().width, 900);
        registry.check_sanity().unwrap();
    }
}
