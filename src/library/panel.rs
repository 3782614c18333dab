//! View model for the panel of preset lists, one list per active group.

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use super::observer::{ObserverHub, SubscriptionId};
use super::registry::Registry;
use super::PresetId;

/// Ordered contents of one group as shown in a preset list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetListModel {
    group: String,
    presets: Vec<PresetId>,
    highlighted: Option<PresetId>,
}

impl PresetListModel {
    fn new(group: &str) -> Self {
        Self {
            group: group.to_string(),
            presets: Vec::new(),
            highlighted: None,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn presets(&self) -> &[PresetId] {
        &self.presets
    }

    /// The selected preset, if this list shows it.
    pub fn highlighted(&self) -> Option<PresetId> {
        self.highlighted
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    fn refresh(&mut self, presets: Vec<PresetId>, selected: Option<PresetId>) {
        self.presets = presets;
        self.highlight(selected);
    }

    fn highlight(&mut self, selected: Option<PresetId>) {
        self.highlighted = selected.filter(|id| self.presets.contains(id));
    }
}

#[derive(Debug, Default)]
struct PanelState {
    /// Every list model built so far, including hidden groups
    models: IndexMap<String, PresetListModel>,
    /// Active groups in display order
    visible: Vec<String>,
}

impl PanelState {
    fn rebuild(&mut self, registry: &Registry) {
        let selected = registry.selected_preset();
        self.models.retain(|group, _| registry.has_group(group));
        self.visible = registry.active_groups();

        for group in &self.visible {
            let presets = registry.group_members(group).unwrap_or_default();
            self.models
                .entry(group.clone())
                .or_insert_with(|| PresetListModel::new(group))
                .refresh(presets, selected);
        }
    }

    fn refresh_group(&mut self, registry: &Registry, group: &str) {
        let Some(model) = self.models.get_mut(group) else {
            return;
        };
        match registry.group_members(group) {
            Ok(presets) => model.refresh(presets, registry.selected_preset()),
            Err(_) => {
                self.models.shift_remove(group);
            }
        }
    }

    fn highlight(&mut self, selected: Option<PresetId>) {
        for model in self.models.values_mut() {
            model.highlight(selected);
        }
    }
}

/// Keeps one [`PresetListModel`] per active group in sync with a registry.
///
/// Subscriptions are dropped with the panel.
pub struct GroupPanel {
    hub: Arc<ObserverHub>,
    state: Arc<Mutex<PanelState>>,
    subscriptions: Vec<SubscriptionId>,
}

impl GroupPanel {
    pub fn attach(registry: &Arc<Registry>) -> Self {
        let hub = Arc::clone(registry.hub());
        let state = Arc::new(Mutex::new(PanelState::default()));
        state.lock().rebuild(registry);

        let mut subscriptions = Vec::with_capacity(3);

        let (weak, panel) = (Arc::downgrade(registry), Arc::clone(&state));
        subscriptions.push(hub.on_group_set_changed(move || {
            if let Some(registry) = Weak::upgrade(&weak) {
                panel.lock().rebuild(&registry);
            }
        }));

        let (weak, panel) = (Arc::downgrade(registry), Arc::clone(&state));
        subscriptions.push(hub.on_collection_changed(move |group| {
            if let Some(registry) = Weak::upgrade(&weak) {
                panel.lock().refresh_group(&registry, group);
            }
        }));

        let panel = Arc::clone(&state);
        subscriptions.push(hub.on_selection_changed(move |selected| {
            panel.lock().highlight(selected);
        }));

        Self {
            hub,
            state,
            subscriptions,
        }
    }

    /// Lists for the active groups, in display order.
    pub fn visible_lists(&self) -> Vec<PresetListModel> {
        let state = self.state.lock();
        state
            .visible
            .iter()
            .filter_map(|group| state.models.get(group).cloned())
            .collect()
    }

    pub fn list(&self, group: &str) -> Option<PresetListModel> {
        self.state.lock().models.get(group).cloned()
    }

    pub fn cached_model_count(&self) -> usize {
        self.state.lock().models.len()
    }
}

impl Drop for GroupPanel {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.hub.unsubscribe(id);
        }
    }
}
