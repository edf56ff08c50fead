#![forbid(unsafe_code)]

//! Window-level operations: resizing, maximizing, separator drags and
//! wholesale removal.

use splitdock_layout::{ItemId, Point, Rect, SeparatorId, SeparatorMove, Size};

use crate::error::DockError;
use crate::ids::WindowId;
use crate::registry::DockRegistry;
use crate::window::WindowState;

impl DockRegistry {
    /// Resize a window's content. The layout never shrinks below its
    /// minimum; the size actually applied is returned.
    pub fn resize_window(&mut self, window: WindowId, size: Size) -> Result<Size, DockError> {
        let entry = self.window_mut(window)?;
        let applied = entry.layout.set_size(size);
        entry.sync_size();
        tracing::debug!(
            window = %window,
            width = applied.width,
            height = applied.height,
            "window resized"
        );
        self.after_mutation();
        Ok(applied)
    }

    /// Maximize a window to the configured screen size, remembering the
    /// normal geometry.
    pub fn show_maximized(&mut self, window: WindowId) -> Result<(), DockError> {
        let screen = self.config.screen_size;
        let entry = self.window_mut(window)?;
        if entry.state == WindowState::Maximized {
            return Ok(());
        }
        entry.normal_geometry = entry.geometry;
        entry.state = WindowState::Maximized;
        let applied = entry.layout.set_size(screen);
        entry.geometry = Rect::from_origin_size(Point::new(0, 0), applied);
        tracing::debug!(window = %window, "window maximized");
        self.after_mutation();
        Ok(())
    }

    /// Leave the maximized state, returning to the remembered geometry.
    pub fn show_normal(&mut self, window: WindowId) -> Result<(), DockError> {
        let entry = self.window_mut(window)?;
        if entry.state == WindowState::Normal {
            return Ok(());
        }
        entry.state = WindowState::Normal;
        let normal = entry.normal_geometry;
        let applied = entry.layout.set_size(normal.size());
        entry.geometry = Rect::from_origin_size(normal.origin(), applied);
        entry.normal_geometry = entry.geometry;
        tracing::debug!(window = %window, "window restored to normal");
        self.after_mutation();
        Ok(())
    }

    /// Drag a separator of a window's layout. Returns the position applied.
    pub fn move_separator(
        &mut self,
        window: WindowId,
        separator: SeparatorId,
        position: i32,
        mode: SeparatorMove,
    ) -> Result<i32, DockError> {
        let applied = self
            .window_mut(window)?
            .layout
            .move_separator(separator, position, mode)?;
        self.after_mutation();
        Ok(applied)
    }

    /// Empty a window's layout. Every frame goes, the central one included;
    /// their dock widgets become hidden and lose their positions there.
    pub fn clear_layout(&mut self, window: WindowId) -> Result<(), DockError> {
        let entry = self.window_mut(window)?;
        let before = entry.layout.count();
        entry.layout.clear()?;
        tracing::debug!(window = %window, items = before, "layout cleared");
        self.settle(window);
        self.after_mutation();
        Ok(())
    }

    /// Remove an item regardless of who holds it. A frame it hosted is
    /// destroyed and positions pointing at it are dropped.
    pub fn remove_item(&mut self, window: WindowId, item: ItemId) -> Result<(), DockError> {
        self.window_mut(window)?.layout.remove_item(item)?;
        self.settle(window);
        self.after_mutation();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dock_ops::AddingOption;
    use crate::window::MainWindowOptions;
    use splitdock_layout::Location;

    fn setup() -> (DockRegistry, WindowId) {
        let mut registry = DockRegistry::new();
        let main = registry
            .create_main_window(
                "main",
                Size::new(800, 500),
                MainWindowOptions::HAS_CENTRAL_FRAME,
            )
            .unwrap();
        (registry, main)
    }

    #[test]
    fn resize_is_clamped_to_the_minimum() {
        let (mut registry, main) = setup();
        let applied = registry.resize_window(main, Size::new(10, 10)).unwrap();
        assert_eq!(applied, Size::new(80, 90));
        assert_eq!(registry.window(main).unwrap().geometry().size(), applied);
    }

    #[test]
    fn maximize_and_back_restores_normal_geometry() {
        let (mut registry, main) = setup();
        let dw = registry.create_dock_widget("dw").unwrap();
        registry
            .add_dock_widget(main, dw, Location::OnLeft, None, AddingOption::None)
            .unwrap();
        let before = registry.layout(main).unwrap().to_snapshot();

        registry.show_maximized(main).unwrap();
        let window = registry.window(main).unwrap();
        assert_eq!(window.state(), WindowState::Maximized);
        assert_eq!(window.geometry(), Rect::new(0, 0, 1920, 1080));
        assert_eq!(window.normal_geometry(), Rect::new(0, 0, 800, 500));

        registry.show_normal(main).unwrap();
        let window = registry.window(main).unwrap();
        assert_eq!(window.state(), WindowState::Normal);
        assert_eq!(window.geometry(), Rect::new(0, 0, 800, 500));
        assert_eq!(registry.layout(main).unwrap().to_snapshot(), before);
    }

    #[test]
    fn clear_layout_hides_everything() {
        let (mut registry, main) = setup();
        let dw = registry.create_dock_widget("dw").unwrap();
        registry
            .add_dock_widget(main, dw, Location::OnLeft, None, AddingOption::None)
            .unwrap();
        registry.clear_layout(main).unwrap();
        assert_eq!(registry.layout(main).unwrap().count(), 0);
        assert!(registry.window(main).unwrap().central_frame().is_none());
        assert!(registry.frames().next().is_none());
        let widget = registry.dock_widget(dw).unwrap();
        assert!(!widget.is_open());
        assert!(widget.last_position().is_none());
        registry.check_sanity().unwrap();
    }

    #[test]
    fn removing_a_visible_item_hides_its_dock_widgets() {
        let (mut registry, main) = setup();
        let dw = registry.create_dock_widget("dw").unwrap();
        registry
            .add_dock_widget(main, dw, Location::OnLeft, None, AddingOption::None)
            .unwrap();
        let item = registry.dock_widget(dw).unwrap().last_position().unwrap().item;
        registry.remove_item(main, item).unwrap();
        assert!(!registry.dock_widget(dw).unwrap().is_open());
        assert_eq!(registry.layout(main).unwrap().count(), 1);
        registry.check_sanity().unwrap();
    }

    #[test]
    fn separator_drag_goes_through_the_window() {
        let (mut registry, main) = setup();
        let dw = registry.create_dock_widget("dw").unwrap();
        registry
            .add_dock_widget(main, dw, Location::OnLeft, None, AddingOption::None)
            .unwrap();
        let separator = registry.layout(main).unwrap().separators()[0].id();
        let applied = registry
            .move_separator(main, separator, 300, SeparatorMove::Clamp)
            .unwrap();
        assert_eq!(applied, 300);
        assert_eq!(registry.dock_widget_geometry(dw).unwrap().width, 300);
        registry.check_sanity().unwrap();
    }
}
