#![forbid(unsafe_code)]

//! The registry of every dock widget, frame and window.
//!
//! One [`DockRegistry`] is created by the host at startup and passed to
//! everything that docks, floats, drops or restores. It owns the arenas,
//! allocates IDs and keeps the bookkeeping that ties dock widgets to layout
//! items consistent:
//!
//! - a visible leaf hosts exactly one frame, and holds one reference for it;
//! - a dock widget's remembered main-window position holds one reference on
//!   that item, so the item survives as a placeholder while the widget is
//!   floating or closed;
//! - floating windows hold no positions, and disappear with their last
//!   visible frame.
//!
//! Items a layout removes are reaped after every mutation and every handle
//! to them (frames, positions) is dropped.

use std::collections::{BTreeMap, BTreeSet};

use splitdock_layout::{
    GuestView, InsertOptions, ItemId, Location, MultiSplitter, Rect, Size,
};

use crate::config::{DockConfig, DockConfigError};
use crate::dock_widget::{DockWidget, Position};
use crate::error::DockError;
use crate::frame::{Frame, FrameOptions};
use crate::ids::{DockWidgetId, FrameId, WindowId};
use crate::window::{MainWindowOptions, Window, WindowKind};

#[derive(Debug, Clone)]
pub struct DockRegistry {
    pub(crate) config: DockConfig,
    pub(crate) dock_widgets: BTreeMap<DockWidgetId, DockWidget>,
    pub(crate) frames: BTreeMap<FrameId, Frame>,
    pub(crate) windows: BTreeMap<WindowId, Window>,
    pub(crate) next_dock_widget: u64,
    pub(crate) next_frame: u64,
    pub(crate) next_window: u64,
}

impl Default for DockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::from_validated(DockConfig::default())
    }

    /// Create a registry with `config`, rejecting it if
    /// [`DockConfig::validate`] reports anything.
    pub fn with_config(config: DockConfig) -> Result<Self, DockConfigError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(DockConfigError::Validation(errors));
        }
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: DockConfig) -> Self {
        Self {
            config,
            dock_widgets: BTreeMap::new(),
            frames: BTreeMap::new(),
            windows: BTreeMap::new(),
            next_dock_widget: DockWidgetId::MIN.get(),
            next_frame: FrameId::MIN.get(),
            next_window: WindowId::MIN.get(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DockConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Creation.
    // ---------------------------------------------------------------------

    /// Create a main window. Names are unique among main windows.
    pub fn create_main_window(
        &mut self,
        name: &str,
        size: Size,
        options: MainWindowOptions,
    ) -> Result<WindowId, DockError> {
        if self.main_window_by_name(name).is_some() {
            return Err(DockError::DuplicateName { name: name.into() });
        }
        let id = self.allocate_window_id()?;
        let layout = MultiSplitter::with_config(size, self.config.splitter_config());
        self.windows.insert(
            id,
            Window::new(
                id,
                WindowKind::Main,
                Some(name.to_owned()),
                Rect::from_size(size),
                layout,
            ),
        );
        if options.contains(MainWindowOptions::HAS_CENTRAL_FRAME) {
            let frame = self.insert_frame(
                id,
                &[],
                Location::OnTop,
                None,
                None,
                FrameOptions::IS_CENTRAL | FrameOptions::ALWAYS_SHOWS_TABS,
            )?;
            if let Some(window) = self.windows.get_mut(&id) {
                window.central_frame = Some(frame);
            }
        }
        tracing::debug!(window = %id, name, ?options, "main window created");
        self.after_mutation();
        Ok(id)
    }

    /// Create a hidden dock widget. Names are unique among dock widgets.
    pub fn create_dock_widget(&mut self, name: &str) -> Result<DockWidgetId, DockError> {
        if self.dock_widget_by_name(name).is_some() {
            return Err(DockError::DuplicateName { name: name.into() });
        }
        let id = DockWidgetId::new(self.next_dock_widget)?;
        self.next_dock_widget = id.checked_next()?.get();
        self.dock_widgets
            .insert(id, DockWidget::new(id, name.to_owned()));
        tracing::debug!(dock_widget = %id, name, "dock widget created");
        Ok(id)
    }

    /// Destroy a main window. Its dock widgets become hidden and lose the
    /// positions they had in it.
    pub fn delete_main_window(&mut self, window: WindowId) -> Result<(), DockError> {
        self.main_window_ref(window)?;
        self.destroy_window(window);
        self.after_mutation();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Queries.
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn dock_widget(&self, id: DockWidgetId) -> Option<&DockWidget> {
        self.dock_widgets.get(&id)
    }

    #[must_use]
    pub fn dock_widget_by_name(&self, name: &str) -> Option<DockWidgetId> {
        self.dock_widgets
            .values()
            .find(|widget| widget.name == name)
            .map(DockWidget::id)
    }

    pub fn dock_widgets(&self) -> impl Iterator<Item = &DockWidget> {
        self.dock_widgets.values()
    }

    #[must_use]
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(&id)
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    /// Frames of one window, in layout order.
    #[must_use]
    pub fn frames_in(&self, window: WindowId) -> Vec<FrameId> {
        let Some(window) = self.windows.get(&window) else {
            return Vec::new();
        };
        window
            .layout
            .items()
            .into_iter()
            .filter_map(|item| window.layout.item(item)?.guest())
            .filter_map(|guest| FrameId::from_guest(guest).ok())
            .filter(|frame| self.frames.contains_key(frame))
            .collect()
    }

    #[must_use]
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    #[must_use]
    pub fn main_window_by_name(&self, name: &str) -> Option<WindowId> {
        self.windows
            .values()
            .find(|window| window.is_main() && window.name() == Some(name))
            .map(Window::id)
    }

    #[must_use]
    pub fn main_windows(&self) -> Vec<WindowId> {
        self.windows
            .values()
            .filter(|window| window.is_main())
            .map(Window::id)
            .collect()
    }

    #[must_use]
    pub fn floating_windows(&self) -> Vec<WindowId> {
        self.windows
            .values()
            .filter(|window| !window.is_main())
            .map(Window::id)
            .collect()
    }

    pub fn layout(&self, window: WindowId) -> Result<&MultiSplitter, DockError> {
        Ok(&self.window_ref(window)?.layout)
    }

    /// The layout item hosting a frame.
    #[must_use]
    pub fn item_for_frame(&self, frame: FrameId) -> Option<ItemId> {
        self.frames.get(&frame).map(Frame::item)
    }

    /// The frame hosted by a layout item.
    #[must_use]
    pub fn frame_for_item(&self, window: WindowId, item: ItemId) -> Option<FrameId> {
        let guest = self.windows.get(&window)?.layout.item(item)?.guest()?;
        let frame = FrameId::from_guest(guest).ok()?;
        self.frames.contains_key(&frame).then_some(frame)
    }

    /// Window currently showing the dock widget.
    #[must_use]
    pub fn window_of(&self, dock_widget: DockWidgetId) -> Option<WindowId> {
        let frame = self.dock_widgets.get(&dock_widget)?.frame?;
        self.frames.get(&frame).map(Frame::window)
    }

    /// Alone in a floating window.
    #[must_use]
    pub fn is_floating(&self, dock_widget: DockWidgetId) -> bool {
        let Some(window) = self.window_of(dock_widget) else {
            return false;
        };
        let Some(window) = self.windows.get(&window) else {
            return false;
        };
        if window.is_main() {
            return false;
        }
        let frames = self.frames_in(window.id);
        frames.len() == 1
            && self
                .frames
                .get(&frames[0])
                .is_some_and(|frame| frame.dock_widgets.len() == 1)
    }

    #[must_use]
    pub fn is_in_main_window(&self, dock_widget: DockWidgetId) -> bool {
        self.window_of(dock_widget)
            .and_then(|window| self.windows.get(&window))
            .is_some_and(Window::is_main)
    }

    /// The dock widget remembers a main-window item it can go back to.
    #[must_use]
    pub fn has_previous_docked_location(&self, dock_widget: DockWidgetId) -> bool {
        self.valid_position(dock_widget).is_some()
    }

    /// Frame geometry in window coordinates.
    #[must_use]
    pub fn frame_geometry(&self, frame: FrameId) -> Option<Rect> {
        let frame = self.frames.get(&frame)?;
        let window = self.windows.get(&frame.window)?;
        window.layout.item(frame.item).map(|item| item.geometry())
    }

    /// Geometry of the frame showing the dock widget.
    #[must_use]
    pub fn dock_widget_geometry(&self, dock_widget: DockWidgetId) -> Option<Rect> {
        self.frame_geometry(self.dock_widgets.get(&dock_widget)?.frame?)
    }

    /// Affinities a window accepts: its own for a main window, those of the
    /// dock widgets it hosts for a floating one.
    #[must_use]
    pub fn window_affinities(&self, window: WindowId) -> BTreeSet<String> {
        let Some(entry) = self.windows.get(&window) else {
            return BTreeSet::new();
        };
        if entry.is_main() {
            return entry.affinities.clone();
        }
        self.frames_in(window)
            .into_iter()
            .flat_map(|frame| self.frame_affinities(frame))
            .collect()
    }

    /// Affinities of the dock widgets in a frame. An empty central frame
    /// takes its window's.
    #[must_use]
    pub fn frame_affinities(&self, frame: FrameId) -> BTreeSet<String> {
        let Some(entry) = self.frames.get(&frame) else {
            return BTreeSet::new();
        };
        if entry.dock_widgets.is_empty() {
            return self
                .windows
                .get(&entry.window)
                .filter(|window| window.is_main())
                .map(|window| window.affinities.clone())
                .unwrap_or_default();
        }
        entry
            .dock_widgets
            .iter()
            .filter_map(|id| self.dock_widgets.get(id))
            .flat_map(|widget| widget.affinities.iter().cloned())
            .collect()
    }

    /// Separators across every live window.
    #[must_use]
    pub fn num_separators(&self) -> usize {
        self.windows
            .values()
            .map(|window| window.layout.num_separators())
            .sum()
    }

    /// Push a window's frame geometry to the view layer.
    pub fn sync_views<V: GuestView + ?Sized>(
        &self,
        window: WindowId,
        view: &mut V,
    ) -> Result<(), DockError> {
        self.window_ref(window)?.layout.sync_views(view);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Internal plumbing shared by the operation modules.
    // ---------------------------------------------------------------------

    pub(crate) fn dock_widget_ref(&self, id: DockWidgetId) -> Result<&DockWidget, DockError> {
        self.dock_widgets
            .get(&id)
            .ok_or(DockError::UnknownDockWidget { dock_widget: id })
    }

    pub(crate) fn dock_widget_mut(
        &mut self,
        id: DockWidgetId,
    ) -> Result<&mut DockWidget, DockError> {
        self.dock_widgets
            .get_mut(&id)
            .ok_or(DockError::UnknownDockWidget { dock_widget: id })
    }

    pub(crate) fn frame_ref(&self, id: FrameId) -> Result<&Frame, DockError> {
        self.frames
            .get(&id)
            .ok_or(DockError::UnknownFrame { frame: id })
    }

    pub(crate) fn window_ref(&self, id: WindowId) -> Result<&Window, DockError> {
        self.windows
            .get(&id)
            .ok_or(DockError::UnknownWindow { window: id })
    }

    pub(crate) fn window_mut(&mut self, id: WindowId) -> Result<&mut Window, DockError> {
        self.windows
            .get_mut(&id)
            .ok_or(DockError::UnknownWindow { window: id })
    }

    pub(crate) fn main_window_ref(&self, id: WindowId) -> Result<&Window, DockError> {
        let window = self.window_ref(id)?;
        if !window.is_main() {
            return Err(DockError::NotAMainWindow { window: id });
        }
        Ok(window)
    }

    pub(crate) fn allocate_window_id(&mut self) -> Result<WindowId, DockError> {
        let id = WindowId::new(self.next_window)?;
        self.next_window = id.checked_next()?.get();
        Ok(id)
    }

    pub(crate) fn allocate_frame_id(&mut self) -> Result<FrameId, DockError> {
        let id = FrameId::new(self.next_frame)?;
        self.next_frame = id.checked_next()?.get();
        Ok(id)
    }

    /// The position a dock widget can return to, if it still resolves to a
    /// leaf of a live main window.
    pub(crate) fn valid_position(&self, dock_widget: DockWidgetId) -> Option<Position> {
        let position = self.dock_widgets.get(&dock_widget)?.last_position?;
        let window = self.windows.get(&position.window)?;
        (window.is_main() && window.layout.item(position.item)?.is_leaf()).then_some(position)
    }

    /// Minimum size of a frame holding `dock_widgets`.
    pub(crate) fn frame_min_size(&self, dock_widgets: &[DockWidgetId]) -> Size {
        let default = self.config.default_min_size;
        dock_widgets
            .iter()
            .filter_map(|id| self.dock_widgets.get(id))
            .fold(default, |min, widget| {
                min.expanded_to(widget.min_size.unwrap_or(default))
            })
    }

    /// Insert a visible leaf for a new frame holding `dock_widgets`.
    ///
    /// Positions are left to the caller.
    pub(crate) fn insert_frame(
        &mut self,
        window: WindowId,
        dock_widgets: &[DockWidgetId],
        location: Location,
        relative_to: Option<ItemId>,
        preferred_size: Option<Size>,
        options: FrameOptions,
    ) -> Result<FrameId, DockError> {
        let min = self.frame_min_size(dock_widgets);
        let mut insert = InsertOptions::default().with_min_size(min);
        if let Some(size) = preferred_size {
            insert = insert.with_preferred_size(size);
        }
        let id = self.allocate_frame_id()?;
        let item = self
            .window_mut(window)?
            .layout
            .insert_item(id.into(), location, relative_to, insert)?;
        let mut frame = Frame::new(id, window, item, options);
        for dock_widget in dock_widgets {
            frame.add_tab(*dock_widget);
            if let Some(widget) = self.dock_widgets.get_mut(dock_widget) {
                widget.frame = Some(id);
            }
        }
        self.frames.insert(id, frame);
        tracing::debug!(frame = %id, window = %window, item = %item, "frame inserted");
        self.settle(window);
        Ok(id)
    }

    /// Add a detached dock widget to an existing frame as its current tab.
    pub(crate) fn add_to_frame(
        &mut self,
        frame: FrameId,
        dock_widget: DockWidgetId,
    ) -> Result<(), DockError> {
        let entry = self
            .frames
            .get_mut(&frame)
            .ok_or(DockError::UnknownFrame { frame })?;
        entry.add_tab(dock_widget);
        let (window, item) = (entry.window, entry.item);
        self.dock_widget_mut(dock_widget)?.frame = Some(frame);
        self.refresh_frame_min_size(frame)?;
        if self.window_ref(window)?.is_main() {
            self.set_position(dock_widget, Some(Position { window, item }))?;
        }
        self.settle(window);
        Ok(())
    }

    /// Take a dock widget out of its frame. A non-central frame left empty
    /// is destroyed and its item released.
    pub(crate) fn detach_from_frame(&mut self, dock_widget: DockWidgetId) -> Result<(), DockError> {
        let Some(frame) = self.dock_widget_ref(dock_widget)?.frame else {
            return Ok(());
        };
        let (empty, central) = {
            let entry = self
                .frames
                .get_mut(&frame)
                .ok_or(DockError::UnknownFrame { frame })?;
            entry.remove_tab(dock_widget);
            (entry.is_empty(), entry.is_central())
        };
        self.dock_widget_mut(dock_widget)?.frame = None;
        if empty && !central {
            self.release_frame(frame)
        } else {
            self.refresh_frame_min_size(frame)
        }
    }

    /// Destroy a frame and drop its reference on the item, which becomes a
    /// placeholder if positions still hold it.
    pub(crate) fn release_frame(&mut self, frame: FrameId) -> Result<(), DockError> {
        let (window, item) = {
            let entry = self.frame_ref(frame)?;
            (entry.window, entry.item)
        };
        let release = self
            .window_mut(window)?
            .layout
            .turn_into_placeholder(item)?;
        if let Some(entry) = self.frames.remove(&frame) {
            for id in entry.dock_widgets {
                if let Some(widget) = self.dock_widgets.get_mut(&id) {
                    widget.frame = None;
                }
            }
        }
        if let Some(entry) = self.windows.get_mut(&window) {
            if entry.central_frame == Some(frame) {
                entry.central_frame = None;
            }
        }
        tracing::debug!(frame = %frame, window = %window, item = %item, ?release, "frame released");
        self.settle(window);
        Ok(())
    }

    pub(crate) fn refresh_frame_min_size(&mut self, frame: FrameId) -> Result<(), DockError> {
        let (window, item, min) = {
            let entry = self.frame_ref(frame)?;
            (
                entry.window,
                entry.item,
                self.frame_min_size(&entry.dock_widgets),
            )
        };
        self.window_mut(window)?.layout.set_min_size(item, min)?;
        self.settle(window);
        Ok(())
    }

    /// Point a dock widget at a new position, moving its reference.
    pub(crate) fn set_position(
        &mut self,
        dock_widget: DockWidgetId,
        position: Option<Position>,
    ) -> Result<(), DockError> {
        let old = self.dock_widget_ref(dock_widget)?.last_position;
        if old == position {
            return Ok(());
        }
        if let Some(new) = position {
            self.window_mut(new.window)?.layout.ref_item(new.item)?;
        }
        self.dock_widget_mut(dock_widget)?.last_position = position;
        if let Some(old) = old {
            if let Some(window) = self.windows.get_mut(&old.window) {
                if window.layout.contains(old.item) {
                    window.layout.unref_item(old.item)?;
                }
            }
            self.settle(old.window);
        }
        Ok(())
    }

    /// Bring a window's bookkeeping up to date after its layout changed:
    /// follow the layout size, drop handles to reaped items, and destroy a
    /// floating window with nothing left to show.
    pub(crate) fn settle(&mut self, window: WindowId) {
        let Some(entry) = self.windows.get_mut(&window) else {
            return;
        };
        entry.sync_size();
        let reaped = entry.layout.take_reaped();
        let abandoned = !entry.is_main() && entry.layout.visible_count() == 0;
        if !reaped.is_empty() {
            self.forget_items(window, &reaped);
        }
        if abandoned {
            self.destroy_window(window);
        }
    }

    /// Drop frames and positions that refer to removed items.
    pub(crate) fn forget_items(&mut self, window: WindowId, items: &[ItemId]) {
        let gone: BTreeSet<ItemId> = items.iter().copied().collect();
        let frames: Vec<FrameId> = self
            .frames
            .values()
            .filter(|frame| frame.window == window && gone.contains(&frame.item))
            .map(Frame::id)
            .collect();
        for frame in frames {
            self.discard_frame(frame);
        }
        for widget in self.dock_widgets.values_mut() {
            if widget
                .last_position
                .is_some_and(|p| p.window == window && gone.contains(&p.item))
            {
                widget.last_position = None;
            }
        }
    }

    /// Remove a frame whose item is already gone. Its dock widgets become
    /// hidden.
    pub(crate) fn discard_frame(&mut self, frame: FrameId) {
        let Some(entry) = self.frames.remove(&frame) else {
            return;
        };
        for id in &entry.dock_widgets {
            if let Some(widget) = self.dock_widgets.get_mut(id) {
                widget.frame = None;
            }
        }
        if let Some(window) = self.windows.get_mut(&entry.window) {
            if window.central_frame == Some(frame) {
                window.central_frame = None;
            }
        }
        tracing::trace!(frame = %frame, "frame discarded");
    }

    /// Remove a window with all its frames and the positions pointing into
    /// it.
    pub(crate) fn destroy_window(&mut self, window: WindowId) {
        if self.windows.remove(&window).is_none() {
            return;
        }
        let frames: Vec<FrameId> = self
            .frames
            .values()
            .filter(|frame| frame.window == window)
            .map(Frame::id)
            .collect();
        for frame in frames {
            self.discard_frame(frame);
        }
        for widget in self.dock_widgets.values_mut() {
            if widget.last_position.is_some_and(|p| p.window == window) {
                widget.last_position = None;
            }
        }
        tracing::debug!(window = %window, "window destroyed");
    }

    /// Run the registry-wide sanity check when configured to. Problems are
    /// logged by the check itself.
    pub(crate) fn after_mutation(&self) {
        if self.config.check_sanity {
            let _ = self.check_sanity();
        }
    }
}
