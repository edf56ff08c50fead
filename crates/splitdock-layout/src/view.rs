#![forbid(unsafe_code)]

//! The seam between the layout engine and a toolkit's view layer.
//!
//! The engine never touches widgets. After a mutation the host pushes the
//! results through [`GuestView`], which the toolkit implements for whatever
//! it draws frames with.

use splitdock_core::geometry::Rect;

use crate::item::GuestId;
use crate::sanity::InvariantReport;
use crate::splitter::MultiSplitter;

/// Receives geometry updates for the guests of one layout.
pub trait GuestView {
    /// Place `guest` at `rect`, in window coordinates.
    fn apply_geometry(&mut self, guest: GuestId, rect: Rect);

    /// Called with the result of an explicit invariant check.
    fn on_invariant_check_requested(&mut self, _report: &InvariantReport) {}
}

impl MultiSplitter {
    /// Push the geometry of every visible leaf to `view`, in depth-first order.
    pub fn sync_views<V: GuestView + ?Sized>(&self, view: &mut V) {
        for id in self.items() {
            let Some(item) = self.item(id) else {
                continue;
            };
            if let Some(guest) = item.guest() {
                view.apply_geometry(guest, item.geometry());
            }
        }
    }

    /// Run the invariant report and hand it to `view`. Returns whether the
    /// tree is clean.
    pub fn request_invariant_check<V: GuestView + ?Sized>(&self, view: &mut V) -> bool {
        let report = self.invariant_report();
        view.on_invariant_check_requested(&report);
        report.is_clean()
    }
}
