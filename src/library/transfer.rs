//! Drag-and-drop transfers between preset lists and group labels.
//!
//! Two drop targets exist. An ordered preset list accepts a drop at an index
//! and either reorders, moves or copies. A group label accepts a drop with no
//! position; redropping onto a group that already holds the preset takes it
//! out of the list it was dragged from instead.

use indexmap::IndexMap;

use super::registry::{Notification, Registry};
use super::PresetId;
use crate::error::{LibraryError, Result};

/// Where a drag started, as reported by the drag-and-drop substrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    /// A preset list showing the named group
    PresetList { group: String },
    /// Anything this library did not originate
    Unrecognized,
}

impl DragSource {
    pub fn preset_list(group: impl Into<String>) -> Self {
        DragSource::PresetList {
            group: group.into(),
        }
    }

    fn group(&self) -> Result<&str> {
        match self {
            DragSource::PresetList { group } => Ok(group.as_str()),
            DragSource::Unrecognized => Err(LibraryError::InvalidSource),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Move,
    /// Requested with the copy modifier held
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Reordered,
    Moved,
    Copied,
    /// Target already held the preset; only the source lost it
    RemovedFromSource,
    /// Copy onto a list that already holds the preset
    Unchanged,
    /// Appended to a group through its label
    Appended,
    /// Dropped where no group label is
    Declined,
}

impl Registry {
    /// Drops `preset_name`, dragged out of `source`, onto the list of
    /// `target_group` at `target_index`. Indexes past the end append.
    pub fn transfer_to_list(
        &self,
        source: &DragSource,
        preset_name: &str,
        target_group: &str,
        target_index: usize,
        mode: TransferMode,
    ) -> Result<TransferOutcome> {
        let source_group = source.group()?;

        let (outcome, notifications) = {
            let mut state = self.state.write();
            if !state.groups.contains_key(target_group) {
                return Err(LibraryError::NotFound(format!("group {}", target_group)));
            }
            let id = state.member_named(source_group, preset_name)?;

            if source_group == target_group {
                let members = state
                    .groups
                    .get_mut(target_group)
                    .ok_or_else(|| LibraryError::NotFound(format!("group {}", target_group)))?;
                members.retain(|member| *member != id);
                let index = target_index.min(members.len());
                members.insert(index, id);
                state.dirty = true;
                (
                    TransferOutcome::Reordered,
                    vec![Notification::Collection(target_group.to_string())],
                )
            } else {
                let already_there = state
                    .groups
                    .get(target_group)
                    .is_some_and(|members| members.contains(&id));

                match (mode, already_there) {
                    (TransferMode::Copy, true) => (TransferOutcome::Unchanged, Vec::new()),
                    (TransferMode::Copy, false) => {
                        insert_at(&mut state.groups, target_group, target_index, id);
                        state.dirty = true;
                        (
                            TransferOutcome::Copied,
                            vec![Notification::Collection(target_group.to_string())],
                        )
                    }
                    (TransferMode::Move, true) => {
                        remove_member(&mut state.groups, source_group, id);
                        state.dirty = true;
                        (
                            TransferOutcome::RemovedFromSource,
                            vec![Notification::Collection(source_group.to_string())],
                        )
                    }
                    (TransferMode::Move, false) => {
                        remove_member(&mut state.groups, source_group, id);
                        insert_at(&mut state.groups, target_group, target_index, id);
                        state.dirty = true;
                        (
                            TransferOutcome::Moved,
                            vec![
                                Notification::Collection(source_group.to_string()),
                                Notification::Collection(target_group.to_string()),
                            ],
                        )
                    }
                }
            }
        };

        tracing::debug!(
            "Transfer of {} from {} to {}: {:?}",
            preset_name,
            source_group,
            target_group,
            outcome
        );
        self.dispatch(notifications);
        Ok(outcome)
    }

    /// Drops `preset_name`, dragged out of `source`, onto a group label.
    ///
    /// `target_group` is `None` when the pointer was over no label.
    pub fn transfer_to_group(
        &self,
        source: &DragSource,
        preset_name: &str,
        target_group: Option<&str>,
    ) -> Result<TransferOutcome> {
        let origin = source.group()?;
        let Some(target_group) = target_group else {
            return Ok(TransferOutcome::Declined);
        };

        let (outcome, notifications) = {
            let mut state = self.state.write();
            if !state.groups.contains_key(target_group) {
                return Err(LibraryError::NotFound(format!("group {}", target_group)));
            }
            let id = state.member_named(origin, preset_name)?;

            let already_there = state
                .groups
                .get(target_group)
                .is_some_and(|members| members.contains(&id));
            if already_there {
                remove_member(&mut state.groups, origin, id);
                state.dirty = true;
                let mut notifications = vec![Notification::Collection(origin.to_string())];
                notifications.extend(state.reconcile_selection());
                (TransferOutcome::RemovedFromSource, notifications)
            } else {
                if let Some(members) = state.groups.get_mut(target_group) {
                    members.push(id);
                }
                state.dirty = true;
                (
                    TransferOutcome::Appended,
                    vec![Notification::Collection(target_group.to_string())],
                )
            }
        };

        tracing::debug!(
            "Label drop of {} from {} onto {}: {:?}",
            preset_name,
            origin,
            target_group,
            outcome
        );
        self.dispatch(notifications);
        Ok(outcome)
    }
}

fn insert_at(
    groups: &mut IndexMap<String, Vec<PresetId>>,
    group: &str,
    index: usize,
    id: PresetId,
) {
    if let Some(members) = groups.get_mut(group) {
        let index = index.min(members.len());
        members.insert(index, id);
    }
}

fn remove_member(
    groups: &mut IndexMap<String, Vec<PresetId>>,
    group: &str,
    id: PresetId,
) {
    if let Some(members) = groups.get_mut(group) {
        members.retain(|member| *member != id);
    }
}
