//! Brush library: named preset groups, selection, and change propagation.
//!
//! - `registry`: group mapping, active groups, selection, preset pool
//! - `observer`: per-channel change notification
//! - `transfer`: drag-and-drop moves and copies between groups
//! - `index`: persisted group order and library loading
//! - `export`: group archives
//! - `panel`: list-of-groups view model kept in sync through the hub

mod export;
mod index;
mod observer;
mod panel;
mod registry;
mod transfer;

pub use export::ORDER_FILE_NAME;
pub use index::{LibraryIndex, INDEX_FILE_NAME, LOST_AND_FOUND};
pub use observer::{ObserverHub, SubscriptionId};
pub use panel::{GroupPanel, PresetListModel};
pub use registry::Registry;
pub use transfer::{DragSource, TransferMode, TransferOutcome};

/// Handle to a preset registered with a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PresetId(u64);

impl PresetId {
    pub fn raw(self) -> u64 {
        self.0
    }
}
