#![forbid(unsafe_code)]

//! Handles for registry-owned objects.
//!
//! All three follow the same rules as layout item IDs: non-zero, allocated
//! from a monotonically increasing counter, never reused.

use std::fmt;

use serde::{Deserialize, Serialize};
use splitdock_layout::GuestId;

use crate::error::DockError;

macro_rules! registry_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const MIN: Self = Self(1);

            /// Create a new ID, rejecting 0.
            pub fn new(raw: u64) -> Result<Self, DockError> {
                if raw == 0 {
                    return Err(DockError::ZeroId { kind: $kind });
                }
                Ok(Self(raw))
            }

            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Return the next ID, or an error on overflow.
            pub fn checked_next(self) -> Result<Self, DockError> {
                let Some(next) = self.0.checked_add(1) else {
                    return Err(DockError::IdOverflow { kind: $kind });
                };
                Self::new(next)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

registry_id!(
    /// A dock widget.
    DockWidgetId,
    "dock widget"
);
registry_id!(
    /// A frame: the tab group hosted by one layout leaf.
    FrameId,
    "frame"
);
registry_id!(
    /// A main or floating window.
    WindowId,
    "window"
);

/// Frames are the guests of layout leaves.
impl From<FrameId> for GuestId {
    fn from(frame: FrameId) -> Self {
        GuestId::new(frame.get())
    }
}

impl FrameId {
    /// The frame a layout guest stands for.
    pub fn from_guest(guest: GuestId) -> Result<Self, DockError> {
        Self::new(guest.get())
    }
}
