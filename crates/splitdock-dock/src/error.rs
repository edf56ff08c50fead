#![forbid(unsafe_code)]

use std::fmt;

use splitdock_layout::{ItemId, LayoutError};

use crate::ids::{DockWidgetId, FrameId, WindowId};

/// Errors from registry operations.
///
/// Policy outcomes such as an affinity mismatch are not errors; those calls
/// return `Ok(false)`. Everything here is a precondition failure detected
/// before anything changes, a failure of the layout underneath, or a
/// consistency problem found by the registry sanity check.
#[derive(Debug, Clone, PartialEq)]
pub enum DockError {
    ZeroId {
        kind: &'static str,
    },
    IdOverflow {
        kind: &'static str,
    },
    UnknownDockWidget {
        dock_widget: DockWidgetId,
    },
    UnknownWindow {
        window: WindowId,
    },
    UnknownFrame {
        frame: FrameId,
    },
    /// Dock widget and main window names are unique.
    DuplicateName {
        name: String,
    },
    NotAMainWindow {
        window: WindowId,
    },
    NotAFloatingWindow {
        window: WindowId,
    },
    MissingCentralFrame {
        window: WindowId,
    },
    /// The operation needs the dock widget to be in a frame.
    NotShown {
        dock_widget: DockWidgetId,
    },
    /// The dock widget has no item in the given window to anchor to.
    NotInWindow {
        dock_widget: DockWidgetId,
        window: WindowId,
    },
    FrameNotInWindow {
        frame: FrameId,
        window: WindowId,
    },
    /// A dock widget cannot be placed relative to itself.
    SelfRelative {
        dock_widget: DockWidgetId,
    },
    /// A window cannot be merged or dropped into itself.
    SameWindow {
        window: WindowId,
    },
    /// The registry and the layouts disagree.
    Inconsistent {
        window: Option<WindowId>,
        item: Option<ItemId>,
        reason: String,
    },
    Layout(LayoutError),
}

impl fmt::Display for DockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroId { kind } => write!(f, "{kind} id 0 is invalid"),
            Self::IdOverflow { kind } => write!(f, "{kind} id space exhausted"),
            Self::UnknownDockWidget { dock_widget } => {
                write!(f, "unknown dock widget {dock_widget}")
            }
            Self::UnknownWindow { window } => write!(f, "unknown window {window}"),
            Self::UnknownFrame { frame } => write!(f, "unknown frame {frame}"),
            Self::DuplicateName { name } => write!(f, "name {name:?} is already taken"),
            Self::NotAMainWindow { window } => write!(f, "window {window} is not a main window"),
            Self::NotAFloatingWindow { window } => {
                write!(f, "window {window} is not a floating window")
            }
            Self::MissingCentralFrame { window } => {
                write!(f, "main window {window} has no central frame")
            }
            Self::NotShown { dock_widget } => {
                write!(f, "dock widget {dock_widget} is not in a frame")
            }
            Self::NotInWindow {
                dock_widget,
                window,
            } => write!(f, "dock widget {dock_widget} has no item in window {window}"),
            Self::FrameNotInWindow { frame, window } => {
                write!(f, "frame {frame} is not in window {window}")
            }
            Self::SelfRelative { dock_widget } => {
                write!(f, "dock widget {dock_widget} cannot be placed relative to itself")
            }
            Self::SameWindow { window } => {
                write!(f, "window {window} cannot be merged into itself")
            }
            Self::Inconsistent {
                window,
                item,
                reason,
            } => {
                write!(f, "registry inconsistent")?;
                if let Some(window) = window {
                    write!(f, " in window {window}")?;
                }
                if let Some(item) = item {
                    write!(f, " at item {item}")?;
                }
                write!(f, ": {reason}")
            }
            Self::Layout(err) => write!(f, "layout error: {err}"),
        }
    }
}

impl std::error::Error for DockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LayoutError> for DockError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_the_subject() {
        let window = WindowId::new(2).unwrap();
        assert_eq!(
            DockError::MissingCentralFrame { window }.to_string(),
            "main window 2 has no central frame"
        );
        let err = DockError::Inconsistent {
            window: Some(window),
            item: None,
            reason: "frame 3 has no dock widgets".into(),
        };
        assert_eq!(
            err.to_string(),
            "registry inconsistent in window 2: frame 3 has no dock widgets"
        );
    }

    #[test]
    fn layout_errors_are_the_source() {
        use std::error::Error;
        let item = ItemId::new(7).unwrap();
        let err = DockError::from(LayoutError::UnknownItem { item });
        assert!(err.source().is_some());
        assert!(err.to_string().contains("item 7"));
    }
}
