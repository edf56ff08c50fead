#![forbid(unsafe_code)]

//! Multi-splitter layout engine.
//!
//! # Role in splitdock
//! `splitdock-layout` owns the geometry of one window: a tree of
//! [`Item`]s where leaves host frames (or hold a placeholder slot for a
//! hidden one) and containers split their length between children, with a
//! [`Separator`] between every pair of visible siblings.
//!
//! # Primary responsibilities
//! - **MultiSplitter**: insert, hide, show, remove and merge items while
//!   keeping every invariant after each call.
//! - **Sizing**: proportional, monotone length apportionment honouring
//!   minimum sizes.
//! - **Sanity**: a pure invariant report usable at any point.
//! - **Snapshots**: serde-serializable trees that restore to identical
//!   geometry.

pub mod error;
pub mod item;
pub mod merge;
pub mod ops;
pub mod sanity;
pub mod separator;
mod sizing;
pub mod snapshot;
pub mod splitter;
pub mod view;

pub use error::LayoutError;
pub use item::{GuestId, Item, ItemId, MAX_SIZE_HINT};
pub use ops::{GuestRelease, InsertOptions, LengthMode};
pub use sanity::{InvariantCode, InvariantIssue, InvariantReport, InvariantViolation};
pub use separator::{Separator, SeparatorId, SeparatorMove};
pub use snapshot::{
    ItemRecord, ItemRecordKind, LAYOUT_SCHEMA_VERSION, LayoutSnapshot, MAX_SNAPSHOT_DEPTH,
};
pub use splitdock_core::geometry::{Location, Orientation, Point, Rect, Size};
pub use splitter::{DEFAULT_MIN_SIZE, DEFAULT_SEPARATOR_THICKNESS, MultiSplitter, SplitterConfig};
pub use view::GuestView;
