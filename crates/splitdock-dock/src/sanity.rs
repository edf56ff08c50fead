#![forbid(unsafe_code)]

//! Cross-window consistency check.
//!
//! Each layout checks its own tree; this pass checks what ties them to the
//! registry: frames and their leaves, dock widgets and their frames, and
//! reference counts against the holders that actually exist.

use std::collections::BTreeMap;

use splitdock_layout::ItemId;

use crate::error::DockError;
use crate::ids::{FrameId, WindowId};
use crate::registry::DockRegistry;

impl DockRegistry {
    /// Validate the whole registry. Pure; the first problem found is logged
    /// at `error` and returned.
    pub fn check_sanity(&self) -> Result<(), DockError> {
        let result = self.find_inconsistency();
        if let Err(err) = &result {
            tracing::error!(error = %err, "registry sanity check failed");
        }
        result
    }

    fn find_inconsistency(&self) -> Result<(), DockError> {
        for window in self.windows.values() {
            window.layout.check_sanity().map_err(|violation| {
                inconsistent(Some(window.id), violation.issue.item, violation.to_string())
            })?;
            if !window.is_main() && window.layout.visible_count() == 0 {
                return Err(inconsistent(
                    Some(window.id),
                    None,
                    "floating window shows nothing".into(),
                ));
            }
            if let Some(central) = window.central_frame {
                let ok = self
                    .frames
                    .get(&central)
                    .is_some_and(|frame| frame.window == window.id && frame.is_central());
                if !ok {
                    return Err(inconsistent(
                        Some(window.id),
                        None,
                        format!("central frame {central} is not a central frame of this window"),
                    ));
                }
            }
        }

        for frame in self.frames.values() {
            self.check_frame(frame.id)?;
        }

        let mut holders: BTreeMap<(WindowId, ItemId), u32> = BTreeMap::new();
        for frame in self.frames.values() {
            *holders.entry((frame.window, frame.item)).or_default() += 1;
        }
        for widget in self.dock_widgets.values() {
            if let Some(frame) = widget.frame {
                let hosts = self
                    .frames
                    .get(&frame)
                    .is_some_and(|entry| entry.contains(widget.id));
                if !hosts {
                    return Err(inconsistent(
                        None,
                        None,
                        format!("dock widget {} is not a tab of frame {frame}", widget.id),
                    ));
                }
            }
            if let Some(position) = widget.last_position {
                let valid = self.windows.get(&position.window).is_some_and(|window| {
                    window.is_main()
                        && window
                            .layout
                            .item(position.item)
                            .is_some_and(|item| item.is_leaf())
                });
                if !valid {
                    return Err(inconsistent(
                        Some(position.window),
                        Some(position.item),
                        format!("dock widget {} remembers a dead position", widget.id),
                    ));
                }
                *holders.entry((position.window, position.item)).or_default() += 1;
            }
        }

        for window in self.windows.values() {
            for id in window.layout.items() {
                let Some(item) = window.layout.item(id) else {
                    continue;
                };
                let expected = holders.get(&(window.id, id)).copied().unwrap_or(0);
                if item.ref_count() != expected {
                    return Err(inconsistent(
                        Some(window.id),
                        Some(id),
                        format!(
                            "ref count {} but {expected} holders",
                            item.ref_count()
                        ),
                    ));
                }
                if let Some(guest) = item.guest() {
                    let hosted = FrameId::from_guest(guest)
                        .ok()
                        .and_then(|frame| self.frames.get(&frame))
                        .is_some_and(|frame| frame.window == window.id && frame.item == id);
                    if !hosted {
                        return Err(inconsistent(
                            Some(window.id),
                            Some(id),
                            format!("guest {guest} has no frame"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_frame(&self, id: FrameId) -> Result<(), DockError> {
        let Some(frame) = self.frames.get(&id) else {
            return Ok(());
        };
        let Some(window) = self.windows.get(&frame.window) else {
            return Err(inconsistent(
                None,
                Some(frame.item),
                format!("frame {id} belongs to unknown window {}", frame.window),
            ));
        };
        let hosted = window
            .layout
            .item(frame.item)
            .is_some_and(|item| item.is_leaf() && item.guest() == Some(id.into()));
        if !hosted {
            return Err(inconsistent(
                Some(window.id),
                Some(frame.item),
                format!("frame {id} is not the guest of its item"),
            ));
        }
        if frame.is_central() {
            if window.central_frame != Some(id) {
                return Err(inconsistent(
                    Some(window.id),
                    Some(frame.item),
                    format!("central frame {id} is not registered with its window"),
                ));
            }
        } else if frame.is_empty() {
            return Err(inconsistent(
                Some(window.id),
                Some(frame.item),
                format!("frame {id} has no dock widgets"),
            ));
        }
        if !frame.is_empty() && frame.current >= frame.dock_widgets.len() {
            return Err(inconsistent(
                Some(window.id),
                Some(frame.item),
                format!("frame {id} current tab out of range"),
            ));
        }
        for dock_widget in &frame.dock_widgets {
            let back = self
                .dock_widgets
                .get(dock_widget)
                .is_some_and(|widget| widget.frame == Some(id));
            if !back {
                return Err(inconsistent(
                    Some(window.id),
                    Some(frame.item),
                    format!("dock widget {dock_widget} in frame {id} points elsewhere"),
                ));
            }
        }
        Ok(())
    }
}

fn inconsistent(window: Option<WindowId>, item: Option<ItemId>, reason: String) -> DockError {
    DockError::Inconsistent {
        window,
        item,
        reason,
    }
}
