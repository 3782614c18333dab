//! Group registry: the only owner of shared library state.
//!
//! Every mutation updates state under the lock, releases it, and only then
//! fans out notifications, so observers (and anything they trigger) always
//! see the final state of the operation that notified them.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::observer::ObserverHub;
use super::PresetId;
use crate::brush::{Preset, PresetStore};
use crate::error::{LibraryError, Result};

#[derive(Debug, Default)]
pub(super) struct RegistryState {
    /// Every registered preset, whether or not a group references it
    pub(super) presets: HashMap<PresetId, Preset>,
    /// Group name -> ordered, duplicate-free members
    pub(super) groups: IndexMap<String, Vec<PresetId>>,
    pub(super) active_groups: Vec<String>,
    pub(super) selected: Option<PresetId>,
    next_id: u64,
    /// Group index differs from what is on disk
    pub(super) dirty: bool,
}

impl RegistryState {
    pub(super) fn allocate_id(&mut self) -> PresetId {
        self.next_id += 1;
        PresetId(self.next_id)
    }

    pub(super) fn find_by_name(&self, name: &str) -> Option<PresetId> {
        self.presets
            .iter()
            .find(|(_, preset)| preset.name() == name)
            .map(|(id, _)| *id)
    }

    /// Resolves a drag payload name among the members of `group`.
    pub(super) fn member_named(&self, group: &str, name: &str) -> Result<PresetId> {
        let members = self
            .groups
            .get(group)
            .ok_or_else(|| LibraryError::NotFound(format!("group {}", group)))?;
        members
            .iter()
            .copied()
            .find(|id| self.presets.get(id).is_some_and(|p| p.name() == name))
            .ok_or_else(|| LibraryError::NotFound(format!("preset {} in group {}", name, group)))
    }

    pub(super) fn groups_containing(&self, id: PresetId) -> Vec<String> {
        self.groups
            .iter()
            .filter(|(_, members)| members.contains(&id))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Clears the selection once the selected preset belongs to no group.
    pub(super) fn reconcile_selection(&mut self) -> Option<Notification> {
        match self.selected {
            Some(id) if !self.groups.values().any(|members| members.contains(&id)) => {
                self.selected = None;
                Some(Notification::Selection(None))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Notification {
    Collection(String),
    GroupSet,
    Selection(Option<PresetId>),
}

pub struct Registry {
    pub(super) state: RwLock<RegistryState>,
    hub: Arc<ObserverHub>,
    store: PresetStore,
}

impl Registry {
    /// An empty registry over `store`, publishing through `hub`.
    pub fn new(store: PresetStore, hub: Arc<ObserverHub>) -> Self {
        Self::from_state(store, hub, RegistryState::default())
    }

    pub(super) fn from_state(store: PresetStore, hub: Arc<ObserverHub>, state: RegistryState) -> Self {
        Self {
            state: RwLock::new(state),
            hub,
            store,
        }
    }

    pub fn hub(&self) -> &Arc<ObserverHub> {
        &self.hub
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }

    pub(super) fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::Collection(group) => self.hub.notify_collection_changed(&group),
                Notification::GroupSet => self.hub.notify_group_set_changed(),
                Notification::Selection(preset) => self.hub.notify_selection_changed(preset),
            }
        }
    }

    // === Queries ===

    /// Group names in insertion order.
    pub fn group_names(&self) -> Vec<String> {
        self.state.read().groups.keys().cloned().collect()
    }

    pub fn sorted_group_names(&self) -> Vec<String> {
        let mut names = self.group_names();
        names.sort();
        names
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.state.read().groups.contains_key(name)
    }

    pub fn group_members(&self, name: &str) -> Result<Vec<PresetId>> {
        self.state
            .read()
            .groups
            .get(name)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(format!("group {}", name)))
    }

    pub fn group_member_names(&self, name: &str) -> Result<Vec<String>> {
        let state = self.state.read();
        let members = state
            .groups
            .get(name)
            .ok_or_else(|| LibraryError::NotFound(format!("group {}", name)))?;
        Ok(members
            .iter()
            .filter_map(|id| state.presets.get(id))
            .map(|preset| preset.name().to_string())
            .collect())
    }

    pub fn contains(&self, group: &str, id: PresetId) -> bool {
        self.state
            .read()
            .groups
            .get(group)
            .is_some_and(|members| members.contains(&id))
    }

    pub fn groups_containing(&self, id: PresetId) -> Vec<String> {
        self.state.read().groups_containing(id)
    }

    pub fn active_groups(&self) -> Vec<String> {
        self.state.read().active_groups.clone()
    }

    pub fn is_active(&self, group: &str) -> bool {
        self.state.read().active_groups.iter().any(|g| g == group)
    }

    pub fn selected_preset(&self) -> Option<PresetId> {
        self.state.read().selected
    }

    pub fn preset_by_name(&self, name: &str) -> Option<PresetId> {
        self.state.read().find_by_name(name)
    }

    pub fn preset_count(&self) -> usize {
        self.state.read().presets.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.read().dirty
    }

    /// Runs `f` against a registered preset under the read lock.
    pub fn with_preset<T>(&self, id: PresetId, f: impl FnOnce(&Preset) -> T) -> Option<T> {
        self.state.read().presets.get(&id).map(f)
    }

    /// Runs `f` against a registered preset under the write lock.
    ///
    /// `f` must not call back into the registry.
    pub fn with_preset_mut<T>(&self, id: PresetId, f: impl FnOnce(&mut Preset) -> T) -> Option<T> {
        self.state.write().presets.get_mut(&id).map(f)
    }

    // === Group set ===

    pub fn create_group(&self, name: &str) -> Result<()> {
        let name = normalize_group_name(name)?;
        {
            let mut state = self.state.write();
            if state.groups.contains_key(&name) {
                return Err(LibraryError::AlreadyExists(format!("group {}", name)));
            }
            state.groups.insert(name.clone(), Vec::new());
            state.dirty = true;
        }

        tracing::info!("Created brush group {}", name);
        self.dispatch(vec![Notification::GroupSet]);
        Ok(())
    }

    /// Re-keys a group, keeping its members, its position and its visibility.
    pub fn rename_group(&self, old_name: &str, new_name: &str) -> Result<()> {
        let new_name = normalize_group_name(new_name)?;
        {
            let mut state = self.state.write();
            if !state.groups.contains_key(old_name) {
                return Err(LibraryError::NotFound(format!("group {}", old_name)));
            }
            if state.groups.contains_key(&new_name) {
                return Err(LibraryError::AlreadyExists(format!("group {}", new_name)));
            }

            let (index, _, members) = state
                .groups
                .shift_remove_full(old_name)
                .ok_or_else(|| LibraryError::NotFound(format!("group {}", old_name)))?;
            state.groups.shift_insert(index, new_name.clone(), members);

            for active in state.active_groups.iter_mut() {
                if active == old_name {
                    *active = new_name.clone();
                }
            }
            state.dirty = true;
        }

        tracing::info!("Renamed brush group {} to {}", old_name, new_name);
        self.dispatch(vec![Notification::GroupSet]);
        Ok(())
    }

    /// Deletes an empty group. Non-empty groups are left untouched.
    pub fn delete_group(&self, name: &str) -> Result<()> {
        {
            let mut state = self.state.write();
            let members = state
                .groups
                .get(name)
                .ok_or_else(|| LibraryError::NotFound(format!("group {}", name)))?;
            if !members.is_empty() {
                return Err(LibraryError::NotEmpty(name.to_string()));
            }

            state.groups.shift_remove(name);
            state.active_groups.retain(|g| g != name);
            state.dirty = true;
        }

        tracing::info!("Deleted brush group {}", name);
        self.dispatch(vec![Notification::GroupSet]);
        Ok(())
    }

    /// Replaces the visible groups. Unknown names and repeats are dropped.
    pub fn set_active_groups(&self, groups: Vec<String>) -> Result<()> {
        {
            let mut state = self.state.write();
            let mut active: Vec<String> = Vec::with_capacity(groups.len());
            for group in groups {
                if !state.groups.contains_key(&group) {
                    tracing::warn!("Ignoring unknown group {} in active groups", group);
                    continue;
                }
                if !active.contains(&group) {
                    active.push(group);
                }
            }
            state.active_groups = active;
            state.dirty = true;
        }

        self.dispatch(vec![Notification::GroupSet]);
        Ok(())
    }

    // === Selection ===

    /// Sets the selected preset. Never touches any color.
    ///
    /// Only presets that belong to at least one group can be selected.
    pub fn select_preset(&self, preset: Option<PresetId>) -> Result<()> {
        {
            let mut state = self.state.write();
            if let Some(id) = preset {
                if !state.presets.contains_key(&id) {
                    return Err(LibraryError::NotFound(format!("preset {:?}", id)));
                }
                if state.groups_containing(id).is_empty() {
                    return Err(LibraryError::NotFound(format!(
                        "preset {:?} in any group",
                        id
                    )));
                }
            }
            state.selected = preset;
        }

        self.dispatch(vec![Notification::Selection(preset)]);
        Ok(())
    }

    /// Selects `id` from a preset list and loads it into the working `tool`.
    ///
    /// The preset is reread first if its file changed on disk. The tool's
    /// color is kept: color is working state, not part of the selection.
    pub fn pick_preset(&self, id: PresetId, tool: &mut Preset) -> Result<()> {
        let color = tool.color();

        let reloaded_in = {
            let mut state = self.state.write();
            let preset = state
                .presets
                .get_mut(&id)
                .ok_or_else(|| LibraryError::NotFound(format!("preset {:?}", id)))?;
            if self.store.reload_if_changed(preset)? {
                state.groups_containing(id)
            } else {
                Vec::new()
            }
        };
        self.dispatch(reloaded_in.into_iter().map(Notification::Collection).collect());

        self.select_preset(Some(id))?;
        self.with_preset(id, |preset| tool.copy_settings_from(preset))
            .ok_or_else(|| LibraryError::NotFound(format!("preset {:?}", id)))?;
        tool.set_color(color.r, color.g, color.b);
        Ok(())
    }

    // === Preset lifecycle ===

    /// Registers `preset` and appends it to `group`.
    ///
    /// An unnamed preset gets the first `b%03d` name free both on disk and
    /// in the registry.
    pub fn add_preset(&self, mut preset: Preset, group: &str) -> Result<PresetId> {
        let id = {
            let mut state = self.state.write();
            if !state.groups.contains_key(group) {
                return Err(LibraryError::NotFound(format!("group {}", group)));
            }

            if preset.name().is_empty() {
                let name = self.store.free_name(|n| state.find_by_name(n).is_some());
                preset.set_name(name);
            } else if state.find_by_name(preset.name()).is_some() {
                return Err(LibraryError::AlreadyExists(format!(
                    "preset {}",
                    preset.name()
                )));
            }

            let id = state.allocate_id();
            state.presets.insert(id, preset);
            if let Some(members) = state.groups.get_mut(group) {
                members.push(id);
            }
            state.dirty = true;
            id
        };

        self.dispatch(vec![Notification::Collection(group.to_string())]);
        Ok(id)
    }

    /// Persists a preset; views of every group holding it are refreshed.
    pub fn save_preset(&self, id: PresetId) -> Result<()> {
        let groups = {
            let mut state = self.state.write();
            let preset = state
                .presets
                .get_mut(&id)
                .ok_or_else(|| LibraryError::NotFound(format!("preset {:?}", id)))?;
            self.store.save(preset)?;
            state.groups_containing(id)
        };

        self.dispatch(groups.into_iter().map(Notification::Collection).collect());
        Ok(())
    }

    /// Drops one membership. The preset itself stays registered.
    pub fn remove_from_group(&self, group: &str, id: PresetId) -> Result<()> {
        let notifications = {
            let mut state = self.state.write();
            let members = state
                .groups
                .get_mut(group)
                .ok_or_else(|| LibraryError::NotFound(format!("group {}", group)))?;
            let position = members
                .iter()
                .position(|member| *member == id)
                .ok_or_else(|| LibraryError::NotFound(format!("preset {:?} in group {}", id, group)))?;
            members.remove(position);
            state.dirty = true;

            let mut notifications = vec![Notification::Collection(group.to_string())];
            notifications.extend(state.reconcile_selection());
            notifications
        };

        self.dispatch(notifications);
        Ok(())
    }

    /// Deletes the preset's files, then removes it from every group.
    pub fn delete_preset(&self, id: PresetId) -> Result<()> {
        let notifications = {
            let mut state = self.state.write();
            let preset = state
                .presets
                .get(&id)
                .ok_or_else(|| LibraryError::NotFound(format!("preset {:?}", id)))?;
            self.store.delete(preset)?;
            state.presets.remove(&id);

            let mut notifications = Vec::new();
            for (name, members) in state.groups.iter_mut() {
                if let Some(position) = members.iter().position(|member| *member == id) {
                    members.remove(position);
                    notifications.push(Notification::Collection(name.clone()));
                }
            }
            state.dirty = true;
            notifications.extend(state.reconcile_selection());
            notifications
        };

        self.dispatch(notifications);
        Ok(())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Registry")
            .field("root", &self.store.root())
            .field("presets", &state.presets.len())
            .field("groups", &state.groups.len())
            .field("active_groups", &state.active_groups)
            .field("selected", &state.selected)
            .finish()
    }
}

fn normalize_group_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}
