#![forbid(unsafe_code)]

//! Tab groups hosted by layout leaves.

use bitflags::bitflags;
use splitdock_layout::ItemId;

use crate::ids::{DockWidgetId, FrameId, WindowId};

bitflags! {
    /// Frame behaviour flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameOptions: u8 {
        /// The persistent central frame of a main window. It survives losing
        /// its last dock widget.
        const IS_CENTRAL        = 0b0001;
        /// Show the tab bar even with a single dock widget.
        const ALWAYS_SHOWS_TABS = 0b0010;
    }
}

/// One leaf's worth of dock widgets, shown as tabs.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub(crate) id: FrameId,
    pub(crate) window: WindowId,
    pub(crate) item: ItemId,
    pub(crate) dock_widgets: Vec<DockWidgetId>,
    pub(crate) current: usize,
    pub(crate) options: FrameOptions,
}

impl Frame {
    pub(crate) fn new(id: FrameId, window: WindowId, item: ItemId, options: FrameOptions) -> Self {
        Self {
            id,
            window,
            item,
            dock_widgets: Vec::new(),
            current: 0,
            options,
        }
    }

    #[must_use]
    pub const fn id(&self) -> FrameId {
        self.id
    }

    #[must_use]
    pub const fn window(&self) -> WindowId {
        self.window
    }

    /// The layout leaf hosting this frame.
    #[must_use]
    pub const fn item(&self) -> ItemId {
        self.item
    }

    /// Tabs in order.
    #[must_use]
    pub fn dock_widgets(&self) -> &[DockWidgetId] {
        &self.dock_widgets
    }

    #[must_use]
    pub const fn options(&self) -> FrameOptions {
        self.options
    }

    #[must_use]
    pub const fn is_central(&self) -> bool {
        self.options.contains(FrameOptions::IS_CENTRAL)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dock_widgets.is_empty()
    }

    #[must_use]
    pub fn contains(&self, dock_widget: DockWidgetId) -> bool {
        self.dock_widgets.contains(&dock_widget)
    }

    /// The tab currently shown.
    #[must_use]
    pub fn current_dock_widget(&self) -> Option<DockWidgetId> {
        self.dock_widgets.get(self.current).copied()
    }

    /// Append a tab and make it current.
    pub(crate) fn add_tab(&mut self, dock_widget: DockWidgetId) {
        if !self.contains(dock_widget) {
            self.dock_widgets.push(dock_widget);
        }
        self.set_current(dock_widget);
    }

    /// Remove a tab. The current tab stays current unless it is the one
    /// removed, in which case its left neighbour takes over.
    pub(crate) fn remove_tab(&mut self, dock_widget: DockWidgetId) -> bool {
        let Some(index) = self.dock_widgets.iter().position(|d| *d == dock_widget) else {
            return false;
        };
        self.dock_widgets.remove(index);
        if index < self.current || (index == self.current && self.current > 0) {
            self.current -= 1;
        }
        if self.current >= self.dock_widgets.len() {
            self.current = self.dock_widgets.len().saturating_sub(1);
        }
        true
    }

    pub(crate) fn set_current(&mut self, dock_widget: DockWidgetId) -> bool {
        match self.dock_widgets.iter().position(|d| *d == dock_widget) {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dw(raw: u64) -> DockWidgetId {
        DockWidgetId::new(raw).unwrap()
    }

    fn frame() -> Frame {
        Frame::new(
            FrameId::MIN,
            WindowId::MIN,
            ItemId::new(2).unwrap(),
            FrameOptions::empty(),
        )
    }

    #[test]
    fn newest_tab_is_current() {
        let mut frame = frame();
        frame.add_tab(dw(1));
        frame.add_tab(dw(2));
        assert_eq!(frame.current_dock_widget(), Some(dw(2)));
        assert!(frame.set_current(dw(1)));
        assert_eq!(frame.current_dock_widget(), Some(dw(1)));
        assert!(!frame.set_current(dw(9)));
    }

    #[test]
    fn removing_tabs_keeps_current_in_range() {
        let mut frame = frame();
        for raw in 1..=3 {
            frame.add_tab(dw(raw));
        }
        frame.set_current(dw(3));
        assert!(frame.remove_tab(dw(1)));
        assert_eq!(frame.current_dock_widget(), Some(dw(3)));
        assert!(frame.remove_tab(dw(3)));
        assert_eq!(frame.current_dock_widget(), Some(dw(2)));
        assert!(frame.remove_tab(dw(2)));
        assert!(frame.is_empty());
        assert_eq!(frame.current_dock_widget(), None);
        assert!(!frame.remove_tab(dw(2)));
    }

    #[test]
    fn central_flag() {
        let mut frame = frame();
        assert!(!frame.is_central());
        frame.options = FrameOptions::IS_CENTRAL | FrameOptions::ALWAYS_SHOWS_TABS;
        assert!(frame.is_central());
        assert_eq!(frame.options().bits(), 0b11);
    }
}
