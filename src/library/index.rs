//! Persisted group index and library loading.

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use super::observer::ObserverHub;
use super::registry::{Registry, RegistryState};
use super::PresetId;
use crate::brush::Preset;
use crate::config::LibraryConfig;
use crate::error::Result;

pub const INDEX_FILE_NAME: &str = "index.json";

/// Group receiving stored presets that no group references.
pub const LOST_AND_FOUND: &str = "lost&found";

/// On-disk shape of the group mapping, keyed by preset name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryIndex {
    pub groups: IndexMap<String, Vec<String>>,
    pub active_groups: Vec<String>,
}

impl LibraryIndex {
    /// Reads `index.json` under `root`; an unreadable index is treated as empty.
    pub fn load(root: &Path) -> Self {
        let index_path = root.join(INDEX_FILE_NAME);
        if !index_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&index_path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|err| {
                tracing::warn!("Malformed brush library index: {}", err);
                Self::default()
            }),
            Err(err) => {
                tracing::warn!("Failed to load brush library index: {}", err);
                Self::default()
            }
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        std::fs::create_dir_all(root)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(root.join(INDEX_FILE_NAME), json)?;
        Ok(())
    }
}

impl Registry {
    /// Loads the library under `config.storage_root`.
    ///
    /// All preset I/O finishes before the registry exists, so nothing is
    /// notified while loading. References to presets that fail to load are
    /// dropped; stored presets no group references land in [`LOST_AND_FOUND`].
    pub fn open(config: &LibraryConfig, hub: Arc<ObserverHub>) -> Result<Self> {
        let store = config.store();
        let index = LibraryIndex::load(store.root());
        let stored = store.stored_names()?;

        let mut wanted: IndexSet<String> = index.groups.values().flatten().cloned().collect();
        wanted.extend(stored.iter().cloned());
        let wanted: Vec<String> = wanted.into_iter().collect();

        let loaded: Vec<(String, Result<Preset>)> = wanted
            .par_iter()
            .map(|name| (name.clone(), store.load(name)))
            .collect();

        let mut state = RegistryState::default();
        let mut ids: HashMap<String, PresetId> = HashMap::with_capacity(loaded.len());
        for (name, result) in loaded {
            match result {
                Ok(preset) => {
                    let id = state.allocate_id();
                    state.presets.insert(id, preset);
                    ids.insert(name, id);
                }
                Err(err) => tracing::warn!("Failed to load brush preset {}: {}", name, err),
            }
        }

        let mut placed: HashSet<PresetId> = HashSet::new();
        for (group, members) in index.groups {
            if group.trim().is_empty() {
                tracing::warn!("Skipping unnamed group in brush library index");
                state.dirty = true;
                continue;
            }

            let mut resolved: Vec<PresetId> = Vec::with_capacity(members.len());
            for name in members {
                match ids.get(&name) {
                    Some(id) if !resolved.contains(id) => {
                        resolved.push(*id);
                        placed.insert(*id);
                    }
                    Some(_) => state.dirty = true,
                    None => {
                        tracing::warn!("Group {} references missing preset {}", group, name);
                        state.dirty = true;
                    }
                }
            }
            state.groups.insert(group, resolved);
        }

        let orphans: Vec<PresetId> = stored
            .iter()
            .filter_map(|name| ids.get(name).copied())
            .filter(|id| !placed.contains(id))
            .collect();
        if !orphans.is_empty() {
            tracing::info!("Placing {} unreferenced presets in {}", orphans.len(), LOST_AND_FOUND);
            let lost = state.groups.entry(LOST_AND_FOUND.to_string()).or_default();
            for id in orphans {
                if !lost.contains(&id) {
                    lost.push(id);
                }
            }
            state.dirty = true;
        }

        for group in index.active_groups {
            if state.groups.contains_key(&group) && !state.active_groups.contains(&group) {
                state.active_groups.push(group);
            } else {
                state.dirty = true;
            }
        }

        tracing::info!(
            "Loaded brush library: {} presets, {} groups",
            state.presets.len(),
            state.groups.len()
        );

        Ok(Registry::from_state(store, hub, state))
    }

    /// Current group mapping in its persisted form.
    pub fn snapshot_index(&self) -> LibraryIndex {
        let state = self.state.read();
        let name_of = |id: &PresetId| state.presets.get(id).map(|p| p.name().to_string());

        LibraryIndex {
            groups: state
                .groups
                .iter()
                .map(|(group, members)| {
                    (group.clone(), members.iter().filter_map(|id| name_of(id)).collect())
                })
                .collect(),
            active_groups: state.active_groups.clone(),
        }
    }

    /// Writes `index.json` if anything changed since the last write.
    pub fn save_index(&self) -> Result<()> {
        if !self.is_dirty() {
            return Ok(());
        }

        let index = self.snapshot_index();
        index.save(self.store().root())?;
        self.state.write().dirty = false;

        tracing::info!("Saved brush library index: {} groups", index.groups.len());
        Ok(())
    }
}
