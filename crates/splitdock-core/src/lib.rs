#![forbid(unsafe_code)]

//! Core: geometry primitives and the logging facade shared by the splitdock
//! crates.
//!
//! # Role in splitdock
//! `splitdock-core` has no knowledge of layout trees or dock widgets. It
//! defines the integer geometry the layout engine computes with
//! ([`Rect`](geometry::Rect), [`Size`](geometry::Size),
//! [`Orientation`](geometry::Orientation), [`Location`](geometry::Location))
//! and re-exports the `tracing` macros every crate logs through.

pub mod geometry;
pub mod logging;

pub use geometry::{Location, Orientation, Point, Rect, Size};

// Re-export tracing macros at crate root for ergonomic use.
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
