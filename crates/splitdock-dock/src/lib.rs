#![forbid(unsafe_code)]

//! Docking on top of the multi-splitter layout engine.
//!
//! # Role in splitdock
//! `splitdock-dock` is where dock widgets meet layouts. A single
//! [`DockRegistry`], created by the host and passed to whatever needs it,
//! owns every dock widget, frame and window, and keeps layout reference
//! counts in step with what holds each item.
//!
//! # Primary responsibilities
//! - **Dock widgets**: show, close, float, dock, tab, and remember where
//!   they were so they can go back.
//! - **Windows**: main windows (named, optionally with a central frame) and
//!   floating windows, each owning one [`MultiSplitter`].
//! - **Drops**: affinity-checked drops of floating windows, whole-layout
//!   merges and drop previews.
//! - **Persistence**: [`LayoutSaver`] documents that restore by name.
//! - **Sanity**: a registry-wide check layered over each layout's own.
//!
//! # How it fits in the system
//! The view layer implements [`GuestView`]; frames are the guests, so
//! `FrameId` converts into [`GuestId`] and geometry arrives per frame via
//! [`DockRegistry::sync_views`].
//!
//! [`MultiSplitter`]: splitdock_layout::MultiSplitter

pub mod config;
pub mod dock_ops;
pub mod dock_widget;
pub mod drop_area;
pub mod error;
pub mod frame;
pub mod ids;
pub mod registry;
pub mod saver;
mod sanity;
pub mod window;
mod window_ops;

pub use config::{DockConfig, DockConfigError};
pub use dock_ops::AddingOption;
pub use dock_widget::{DockWidget, Position, affinities_compatible};
pub use drop_area::DropLocation;
pub use error::DockError;
pub use frame::{Frame, FrameOptions};
pub use ids::{DockWidgetId, FrameId, WindowId};
pub use registry::DockRegistry;
pub use saver::{
    DockWidgetRecord, FloatingWindowRecord, FrameRecord, LayoutDocument, LayoutSaver,
    MainWindowRecord, PositionRecord, SAVER_SCHEMA_VERSION, SaverError,
};
pub use window::{MainWindowOptions, Window, WindowKind, WindowState};

pub use splitdock_core::logging;
pub use splitdock_layout::{
    GuestId, GuestView, ItemId, Location, Orientation, Point, Rect, SeparatorId, SeparatorMove,
    Size,
};
