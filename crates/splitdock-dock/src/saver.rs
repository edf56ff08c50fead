#![forbid(unsafe_code)]

//! Layout persistence.
//!
//! A [`LayoutDocument`] records every main window (by name), every floating
//! window, and every dock widget (by name) with the position it remembers.
//! Restoring matches names against what the registry has now: unknown main
//! windows and dock widgets in the document are skipped, and reference
//! counts are rebuilt from the frames and positions that actually come back.
//!
//! Restoring works on a copy of the registry that replaces the original
//! only once every record has been applied, so a malformed document leaves
//! everything as it was.
//!
//! ```rust,ignore
//! let saver = LayoutSaver::new();
//! saver.save_to_file(&registry, "layout.json")?;
//! // ...
//! saver.restore_from_file(&mut registry, "layout.json")?;
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use splitdock_layout::{
    GuestId, ItemId, LayoutError, LayoutSnapshot, MultiSplitter, Rect, Size, SplitterConfig,
};

use crate::dock_widget::Position;
use crate::error::DockError;
use crate::frame::{Frame, FrameOptions};
use crate::ids::{DockWidgetId, FrameId, WindowId};
use crate::registry::DockRegistry;
use crate::window::{Window, WindowKind, WindowState};

/// Current document schema version.
pub const SAVER_SCHEMA_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub schema_version: u16,
    pub main_windows: Vec<MainWindowRecord>,
    pub floating_windows: Vec<FloatingWindowRecord>,
    pub dock_widgets: Vec<DockWidgetRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainWindowRecord {
    pub name: String,
    pub geometry: Rect,
    pub normal_geometry: Rect,
    pub state: WindowState,
    pub affinities: BTreeSet<String>,
    pub layout: LayoutSnapshot,
    pub frames: Vec<FrameRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingWindowRecord {
    pub geometry: Rect,
    pub layout: LayoutSnapshot,
    pub frames: Vec<FrameRecord>,
}

/// A frame, keyed by the guest ID its leaf carries in the saved layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub guest: GuestId,
    /// [`FrameOptions`] bits.
    pub options: u8,
    /// Tab names in order.
    pub dock_widgets: Vec<String>,
    pub current: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockWidgetRecord {
    pub name: String,
    pub last_position: Option<PositionRecord>,
    pub last_floating_geometry: Option<Rect>,
    pub min_size: Option<Size>,
    #[serde(default)]
    pub affinities: BTreeSet<String>,
}

/// A remembered slot, by main window name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub window: String,
    pub item: ItemId,
}

/// Errors from saving or restoring a layout.
#[derive(Debug)]
pub enum SaverError {
    /// I/O error reading or writing a file.
    Io(std::io::Error),
    /// JSON encode or decode error.
    Json(serde_json::Error),
    UnsupportedVersion {
        version: u16,
    },
    /// The document parses but does not describe a usable layout.
    InvalidDocument {
        reason: String,
    },
    Dock(DockError),
}

impl fmt::Display for SaverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::UnsupportedVersion { version } => write!(
                f,
                "unsupported layout document version {version} (expected {SAVER_SCHEMA_VERSION})"
            ),
            Self::InvalidDocument { reason } => write!(f, "invalid layout document: {reason}"),
            Self::Dock(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SaverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Dock(e) => Some(e),
            Self::UnsupportedVersion { .. } | Self::InvalidDocument { .. } => None,
        }
    }
}

impl From<DockError> for SaverError {
    fn from(err: DockError) -> Self {
        Self::Dock(err)
    }
}

impl From<LayoutError> for SaverError {
    fn from(err: LayoutError) -> Self {
        Self::Dock(DockError::Layout(err))
    }
}

/// Saves and restores a registry's windows and dock widgets.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutSaver;

impl LayoutSaver {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Capture the registry as a document.
    #[must_use]
    pub fn document(&self, registry: &DockRegistry) -> LayoutDocument {
        let main_windows = registry
            .windows
            .values()
            .filter(|window| window.is_main())
            .map(|window| MainWindowRecord {
                name: window.name.clone().unwrap_or_default(),
                geometry: window.geometry,
                normal_geometry: window.normal_geometry,
                state: window.state,
                affinities: window.affinities.clone(),
                layout: window.layout.to_snapshot(),
                frames: frame_records(registry, window.id),
            })
            .collect();
        let floating_windows = registry
            .windows
            .values()
            .filter(|window| !window.is_main())
            .map(|window| FloatingWindowRecord {
                geometry: window.geometry,
                layout: window.layout.to_snapshot(),
                frames: frame_records(registry, window.id),
            })
            .collect();
        let dock_widgets = registry
            .dock_widgets
            .values()
            .map(|widget| DockWidgetRecord {
                name: widget.name.clone(),
                last_position: widget.last_position.and_then(|position| {
                    let window = registry.windows.get(&position.window)?.name.clone()?;
                    Some(PositionRecord {
                        window,
                        item: position.item,
                    })
                }),
                last_floating_geometry: widget.last_floating_geometry,
                min_size: widget.min_size,
                affinities: widget.affinities.clone(),
            })
            .collect();
        LayoutDocument {
            schema_version: SAVER_SCHEMA_VERSION,
            main_windows,
            floating_windows,
            dock_widgets,
        }
    }

    /// Serialize the registry to pretty-printed JSON.
    pub fn serialize_layout(&self, registry: &DockRegistry) -> Result<String, SaverError> {
        serde_json::to_string_pretty(&self.document(registry)).map_err(SaverError::Json)
    }

    pub fn save_to_file(
        &self,
        registry: &DockRegistry,
        path: impl AsRef<Path>,
    ) -> Result<(), SaverError> {
        let json = self.serialize_layout(registry)?;
        std::fs::write(path.as_ref(), json).map_err(SaverError::Io)
    }

    /// Restore from JSON produced by [`LayoutSaver::serialize_layout`].
    pub fn restore_layout(
        &self,
        registry: &mut DockRegistry,
        json: &str,
    ) -> Result<(), SaverError> {
        let document: LayoutDocument = serde_json::from_str(json).map_err(SaverError::Json)?;
        self.restore_document(registry, &document)
    }

    pub fn restore_from_file(
        &self,
        registry: &mut DockRegistry,
        path: impl AsRef<Path>,
    ) -> Result<(), SaverError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(SaverError::Io)?;
        self.restore_layout(registry, &json)
    }

    /// Restore from a document.
    ///
    /// Main windows named in the document get their saved layout, state and
    /// affinities; existing floating windows are replaced by the saved ones.
    /// Dock widgets named in the document go back to their saved frames and
    /// positions. Everything else is left alone, except that dock widgets
    /// shown in a replaced window end up hidden.
    ///
    /// On error the registry is left exactly as it was.
    pub fn restore_document(
        &self,
        registry: &mut DockRegistry,
        document: &LayoutDocument,
    ) -> Result<(), SaverError> {
        if document.schema_version != SAVER_SCHEMA_VERSION {
            return Err(SaverError::UnsupportedVersion {
                version: document.schema_version,
            });
        }
        let mut names = BTreeSet::new();
        for record in &document.main_windows {
            if !names.insert(record.name.as_str()) {
                return Err(invalid(format!(
                    "main window {:?} appears more than once",
                    record.name
                )));
            }
        }

        let mut staged = registry.clone();
        self.apply_document(&mut staged, document)?;
        *registry = staged;
        registry.after_mutation();
        Ok(())
    }

    fn apply_document(
        &self,
        registry: &mut DockRegistry,
        document: &LayoutDocument,
    ) -> Result<(), SaverError> {
        let config = registry.config.splitter_config();

        let mut mains = Vec::new();
        for record in &document.main_windows {
            let Some(id) = registry.main_window_by_name(&record.name) else {
                tracing::debug!(name = %record.name, "skipping unknown main window");
                continue;
            };
            let layout = prepare_layout(&record.layout, &record.frames, config)?;
            mains.push((id, record, layout));
        }
        let mut floats = Vec::new();
        for record in &document.floating_windows {
            floats.push((record, prepare_layout(&record.layout, &record.frames, config)?));
        }

        let known = known_dock_widgets(registry, document);
        let max_guest = document
            .main_windows
            .iter()
            .flat_map(|record| &record.frames)
            .chain(document.floating_windows.iter().flat_map(|record| &record.frames))
            .map(|frame| frame.guest.get())
            .max()
            .unwrap_or(0);

        // Let go of everything the document is about to place.
        for id in known.values() {
            registry.detach_from_frame(*id)?;
            registry.set_position(*id, None)?;
        }
        for window in registry.floating_windows() {
            registry.destroy_window(window);
        }
        // New frame IDs must not collide with guests still in the saved
        // layouts while those are being renamed.
        registry.next_frame = registry.next_frame.max(max_guest.saturating_add(1));

        let mut restored: Vec<(WindowId, &[FrameRecord])> = Vec::new();
        let mut restored_mains: BTreeMap<&str, WindowId> = BTreeMap::new();
        for (id, record, layout) in mains {
            let stale: Vec<FrameId> = registry
                .frames
                .values()
                .filter(|frame| frame.window == id)
                .map(Frame::id)
                .collect();
            for frame in stale {
                registry.discard_frame(frame);
            }
            for widget in registry.dock_widgets.values_mut() {
                if widget.last_position.is_some_and(|p| p.window == id) {
                    widget.last_position = None;
                }
            }
            let window = registry.window_mut(id)?;
            window.geometry = Rect::from_origin_size(record.geometry.origin(), layout.size());
            window.normal_geometry = record.normal_geometry;
            window.state = record.state;
            window.affinities = record.affinities.clone();
            window.central_frame = None;
            window.layout = layout;
            restored.push((id, &record.frames));
            restored_mains.insert(record.name.as_str(), id);
        }
        for (record, layout) in floats {
            let id = registry.allocate_window_id()?;
            let geometry = Rect::from_origin_size(record.geometry.origin(), layout.size());
            registry.windows.insert(
                id,
                Window::new(id, WindowKind::Floating, None, geometry, layout),
            );
            restored.push((id, &record.frames));
        }

        for (window, frames) in &restored {
            for record in frames.iter() {
                restore_frame(registry, *window, record, &known)?;
            }
        }

        for record in &document.dock_widgets {
            let Some(&id) = known.get(record.name.as_str()) else {
                tracing::debug!(name = %record.name, "skipping unknown dock widget");
                continue;
            };
            let position = record.last_position.as_ref().and_then(|saved| {
                let window = *restored_mains.get(saved.window.as_str())?;
                let leaf = registry.windows.get(&window)?.layout.item(saved.item)?.is_leaf();
                leaf.then_some(Position {
                    window,
                    item: saved.item,
                })
            });
            let widget = registry.dock_widget_mut(id)?;
            widget.last_floating_geometry = record.last_floating_geometry;
            widget.min_size = record.min_size;
            widget.affinities = record.affinities.clone();
            widget.last_position = position;
        }
        // A widget shown in a main window remembers the slot it is shown in.
        let shown: Vec<(DockWidgetId, Position)> = registry
            .frames
            .values()
            .filter(|frame| restored_mains.values().any(|id| *id == frame.window))
            .flat_map(|frame| {
                let position = Position {
                    window: frame.window,
                    item: frame.item,
                };
                frame.dock_widgets.iter().map(move |id| (*id, position))
            })
            .collect();
        for (id, position) in shown {
            registry.dock_widget_mut(id)?.last_position = Some(position);
        }

        for (window, _) in &restored {
            rebuild_ref_counts(registry, *window)?;
        }
        for (window, _) in &restored {
            registry.settle(*window);
        }
        tracing::debug!(
            main_windows = restored_mains.len(),
            floating_windows = document.floating_windows.len(),
            dock_widgets = known.len(),
            "layout restored"
        );
        Ok(())
    }
}

fn frame_records(registry: &DockRegistry, window: WindowId) -> Vec<FrameRecord> {
    registry
        .frames_in(window)
        .into_iter()
        .filter_map(|id| registry.frames.get(&id))
        .map(|frame| FrameRecord {
            guest: frame.id.into(),
            options: frame.options.bits(),
            dock_widgets: frame
                .dock_widgets
                .iter()
                .filter_map(|id| registry.dock_widgets.get(id))
                .map(|widget| widget.name.clone())
                .collect(),
            current: frame.current,
        })
        .collect()
}

fn invalid(reason: String) -> SaverError {
    SaverError::InvalidDocument { reason }
}

/// Rebuild a saved layout and check that its frames and visible leaves
/// match one to one.
fn prepare_layout(
    snapshot: &LayoutSnapshot,
    frames: &[FrameRecord],
    config: SplitterConfig,
) -> Result<MultiSplitter, SaverError> {
    let mut layout = MultiSplitter::with_config(snapshot.size, config);
    layout.restore(snapshot)?;
    let _ = layout.take_reaped();

    let mut framed = BTreeSet::new();
    for frame in frames {
        if layout.item_for_guest(frame.guest).is_none() {
            return Err(invalid(format!(
                "frame record {} has no visible item",
                frame.guest
            )));
        }
        if !framed.insert(frame.guest) {
            return Err(invalid(format!("frame record {} appears twice", frame.guest)));
        }
    }
    for id in layout.items() {
        if let Some(guest) = layout.item(id).and_then(|item| item.guest()) {
            if !framed.contains(&guest) {
                return Err(invalid(format!("item {id} hosts guest {guest} with no frame")));
            }
        }
    }
    Ok(layout)
}

/// Dock widgets named anywhere in the document that the registry has.
fn known_dock_widgets<'a>(
    registry: &DockRegistry,
    document: &'a LayoutDocument,
) -> BTreeMap<&'a str, DockWidgetId> {
    let framed = document
        .main_windows
        .iter()
        .flat_map(|record| &record.frames)
        .chain(document.floating_windows.iter().flat_map(|record| &record.frames))
        .flat_map(|frame| frame.dock_widgets.iter());
    document
        .dock_widgets
        .iter()
        .map(|record| &record.name)
        .chain(framed)
        .filter_map(|name| {
            registry
                .dock_widget_by_name(name)
                .map(|id| (name.as_str(), id))
        })
        .collect()
}

fn restore_frame(
    registry: &mut DockRegistry,
    window: WindowId,
    record: &FrameRecord,
    known: &BTreeMap<&str, DockWidgetId>,
) -> Result<(), SaverError> {
    let entry = registry.window_ref(window)?;
    let item = entry
        .layout
        .item_for_guest(record.guest)
        .ok_or_else(|| invalid(format!("frame record {} has no visible item", record.guest)))?;
    let mut options = FrameOptions::from_bits_truncate(record.options);
    if !entry.is_main() || entry.central_frame.is_some() {
        options.remove(FrameOptions::IS_CENTRAL);
    }

    let mut dock_widgets: Vec<DockWidgetId> = Vec::new();
    for name in &record.dock_widgets {
        let Some(&id) = known.get(name.as_str()) else {
            tracing::debug!(name = %name, "skipping unknown dock widget");
            continue;
        };
        let free = registry
            .dock_widgets
            .get(&id)
            .is_some_and(|widget| widget.frame.is_none());
        if free && !dock_widgets.contains(&id) {
            dock_widgets.push(id);
        }
    }

    if dock_widgets.is_empty() && !options.contains(FrameOptions::IS_CENTRAL) {
        // Hide the slot; the reference fix-up decides whether it stays.
        let layout = &mut registry.window_mut(window)?.layout;
        layout.ref_item(item)?;
        layout.turn_into_placeholder(item)?;
        return Ok(());
    }

    let id = registry.allocate_frame_id()?;
    registry
        .window_mut(window)?
        .layout
        .replace_guest(item, id.into())?;
    let mut frame = Frame::new(id, window, item, options);
    for dock_widget in &dock_widgets {
        frame.add_tab(*dock_widget);
        registry.dock_widget_mut(*dock_widget)?.frame = Some(id);
    }
    frame.current = 0;
    if let Some(current) = record
        .dock_widgets
        .get(record.current)
        .and_then(|name| known.get(name.as_str()))
    {
        frame.set_current(*current);
    }
    let central = frame.is_central();
    registry.frames.insert(id, frame);
    if central {
        registry.window_mut(window)?.central_frame = Some(id);
    }
    Ok(())
}

/// Make every leaf's reference count match the frames and positions that
/// hold it. Leaves nobody holds are removed.
fn rebuild_ref_counts(registry: &mut DockRegistry, window: WindowId) -> Result<(), SaverError> {
    let mut expected: BTreeMap<ItemId, u32> = BTreeMap::new();
    for frame in registry.frames.values().filter(|frame| frame.window == window) {
        *expected.entry(frame.item).or_default() += 1;
    }
    for widget in registry.dock_widgets.values() {
        if let Some(position) = widget.last_position.filter(|p| p.window == window) {
            *expected.entry(position.item).or_default() += 1;
        }
    }
    let layout = &mut registry.window_mut(window)?.layout;
    for item in layout.items() {
        let Some(have) = layout.item(item).map(|entry| entry.ref_count()) else {
            continue;
        };
        let want = expected.get(&item).copied().unwrap_or(0);
        for _ in want..have {
            layout.unref_item(item)?;
        }
        for _ in have..want {
            layout.ref_item(item)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dock_ops::AddingOption;
    use crate::window::MainWindowOptions;
    use splitdock_layout::Location;

    fn populated() -> (DockRegistry, WindowId) {
        let mut registry = DockRegistry::new();
        let main = registry
            .create_main_window("main", Size::new(800, 500), MainWindowOptions::empty())
            .unwrap();
        let a = registry.create_dock_widget("a").unwrap();
        let b = registry.create_dock_widget("b").unwrap();
        registry
            .add_dock_widget(main, a, Location::OnLeft, None, AddingOption::None)
            .unwrap();
        registry
            .add_dock_widget(main, b, Location::OnRight, None, AddingOption::StartHidden)
            .unwrap();
        (registry, main)
    }

    #[test]
    fn document_names_windows_and_positions() {
        let (registry, _) = populated();
        let document = LayoutSaver::new().document(&registry);
        assert_eq!(document.schema_version, SAVER_SCHEMA_VERSION);
        assert_eq!(document.main_windows.len(), 1);
        assert_eq!(document.main_windows[0].name, "main");
        assert_eq!(document.main_windows[0].frames.len(), 1);
        assert_eq!(document.main_windows[0].frames[0].dock_widgets, vec!["a"]);
        let b = document
            .dock_widgets
            .iter()
            .find(|record| record.name == "b")
            .unwrap();
        assert_eq!(b.last_position.as_ref().unwrap().window, "main");
    }

    #[test]
    fn unsupported_version_changes_nothing() {
        let (mut registry, _) = populated();
        let mut document = LayoutSaver::new().document(&registry);
        document.schema_version = 99;
        let before = format!("{registry:?}");
        assert!(matches!(
            LayoutSaver::new().restore_document(&mut registry, &document),
            Err(SaverError::UnsupportedVersion { version: 99 })
        ));
        assert_eq!(format!("{registry:?}"), before);
    }

    #[test]
    fn frame_without_a_leaf_is_invalid() {
        let (mut registry, _) = populated();
        let mut document = LayoutSaver::new().document(&registry);
        document.main_windows[0].frames[0].guest = GuestId::new(999);
        let before = format!("{registry:?}");
        assert!(matches!(
            LayoutSaver::new().restore_document(&mut registry, &document),
            Err(SaverError::InvalidDocument { .. })
        ));
        assert_eq!(format!("{registry:?}"), before);
    }

    #[test]
    fn garbage_json_is_a_json_error() {
        let (mut registry, _) = populated();
        assert!(matches!(
            LayoutSaver::new().restore_layout(&mut registry, "{"),
            Err(SaverError::Json(_))
        ));
    }
}
