//! Interactive group label strip: hover, click, context menu and drops.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::layout::{LabelState, LabelStripLayout, LayoutInput, Palette};
use super::text::TextLayoutEngine;
use crate::error::{LibraryError, Result};
use crate::library::{DragSource, Registry, SubscriptionId, TransferOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    NewGroup,
    RenameGroup,
    ExportGroup,
    DeleteGroup,
}

impl MenuEntry {
    pub fn label(self) -> &'static str {
        match self {
            MenuEntry::NewGroup => "New group...",
            MenuEntry::RenameGroup => "Rename group...",
            MenuEntry::ExportGroup => "Export group...",
            MenuEntry::DeleteGroup => "Delete group...",
        }
    }

    /// Entries of the context menu opened over `group`, or over no label.
    pub fn for_target(group: Option<&str>) -> Vec<MenuEntry> {
        match group {
            Some(_) => vec![
                MenuEntry::NewGroup,
                MenuEntry::RenameGroup,
                MenuEntry::ExportGroup,
                MenuEntry::DeleteGroup,
            ],
            None => vec![MenuEntry::NewGroup],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    /// Primary or middle press over no label
    Ignored,
    ActiveGroupsChanged(Vec<String>),
    ContextMenu {
        group: Option<String>,
        entries: Vec<MenuEntry>,
    },
}

/// Dialog collaborator. Returning `None`, an empty name or `false` cancels.
pub trait Prompter {
    fn ask_for_name(&mut self, title: &str, initial: &str) -> Option<String>;
    fn confirm(&mut self, question: &str) -> bool;
    fn ask_export_path(&mut self, group: &str) -> Option<PathBuf>;
}

pub struct LabelStrip<E: TextLayoutEngine> {
    registry: Arc<Registry>,
    engine: E,
    palette: Palette,
    padding: bool,
    width: u32,
    layout: LabelStripLayout,
    /// Set by the group-set subscription and by width changes
    stale: Arc<AtomicBool>,
    hovered: Option<String>,
    menu_group: Option<String>,
    redraw: bool,
    subscription: SubscriptionId,
}

impl<E: TextLayoutEngine> LabelStrip<E> {
    pub fn new(registry: Arc<Registry>, engine: E, padding: bool, width: u32) -> Self {
        let stale = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&stale);
        let subscription = registry
            .hub()
            .on_group_set_changed(move || flag.store(true, Ordering::Release));

        let mut strip = Self {
            registry,
            engine,
            palette: Palette::default(),
            padding,
            width,
            layout: LabelStripLayout::default(),
            stale,
            hovered: None,
            menu_group: None,
            redraw: true,
            subscription,
        };
        strip.rebuild();
        strip
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self.rebuild();
        self
    }

    pub fn layout(&self) -> &LabelStripLayout {
        &self.layout
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn set_width(&mut self, width: u32) {
        if width != self.width {
            self.width = width;
            self.stale.store(true, Ordering::Release);
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Returns whether the strip needs repainting, clearing the request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    /// Lays out every group again from current registry state.
    pub fn rebuild(&mut self) {
        self.stale.store(false, Ordering::Release);

        let groups = self.registry.group_names();
        let active_groups = self.registry.active_groups();
        let input = LayoutInput {
            groups: &groups,
            active_groups: &active_groups,
            hovered: self.hovered.as_deref(),
            menu_group: self.menu_group.as_deref(),
            padding: self.padding,
            width: self.width,
        };
        self.layout = LabelStripLayout::build(&mut self.engine, &input, &self.palette);
        self.redraw = true;
    }

    pub fn requested_height(&self) -> u32 {
        self.layout.requested_height()
    }

    /// Group under a pointer position. Fails while the layout is stale.
    pub fn hit_test(&self, x: i32, y: i32) -> Result<Option<String>> {
        if self.is_stale() {
            return Err(LibraryError::StaleLayout);
        }
        Ok(self.layout.hit_test(&self.engine, x, y).map(str::to_string))
    }

    pub fn label_state(&self, group: &str) -> Option<LabelState> {
        self.layout.span_for(group).map(|span| span.state)
    }

    /// Center of the first character of a group's label, in widget space.
    pub fn anchor_point(&self, group: &str) -> Option<(i32, i32)> {
        let span = self.layout.span_for(group)?;
        let rect = self.engine.offset_rect(span.start)?;
        Some((
            rect.x + rect.width as i32 / 2,
            rect.y + self.layout.vmargin() as i32 + rect.height as i32 / 2,
        ))
    }

    /// Tracks the hovered label. Returns whether a redraw is needed.
    pub fn pointer_moved(&mut self, x: i32, y: i32) -> Result<bool> {
        let group = self.hit_test(x, y)?;
        Ok(self.set_hovered(group))
    }

    pub fn pointer_left(&mut self) -> bool {
        self.set_hovered(None)
    }

    /// Hover feedback while a preset is dragged over the strip.
    pub fn drag_motion(&mut self, x: i32, y: i32) -> Result<bool> {
        self.pointer_moved(x, y)
    }

    fn set_hovered(&mut self, group: Option<String>) -> bool {
        if group == self.hovered {
            return false;
        }
        self.hovered = group;
        self.rebuild();
        true
    }

    /// Primary solos a group; ctrl, shift or middle toggles it; secondary
    /// opens the context menu.
    pub fn press(
        &mut self,
        x: i32,
        y: i32,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Result<PressOutcome> {
        let group = self.hit_test(x, y)?;

        match button {
            PointerButton::Primary | PointerButton::Middle => {
                let Some(group) = group else {
                    return Ok(PressOutcome::Ignored);
                };

                let toggle =
                    modifiers.ctrl || modifiers.shift || button == PointerButton::Middle;
                let active_groups = if toggle {
                    let mut active_groups = self.registry.active_groups();
                    match active_groups.iter().position(|g| *g == group) {
                        Some(index) => {
                            active_groups.remove(index);
                        }
                        None => active_groups.push(group),
                    }
                    active_groups
                } else {
                    vec![group]
                };

                self.registry.set_active_groups(active_groups)?;
                self.rebuild();
                Ok(PressOutcome::ActiveGroupsChanged(
                    self.registry.active_groups(),
                ))
            }
            PointerButton::Secondary => {
                self.menu_group = group.clone();
                self.rebuild();
                let entries = MenuEntry::for_target(group.as_deref());
                Ok(PressOutcome::ContextMenu { group, entries })
            }
        }
    }

    /// Context menu closed, whether or not an entry ran.
    pub fn menu_finished(&mut self) {
        if self.menu_group.take().is_some() {
            self.rebuild();
        }
    }

    /// Runs a context-menu entry. Returns `false` when the prompt was declined.
    pub fn run_menu_entry<P: Prompter>(
        &mut self,
        entry: MenuEntry,
        group: Option<&str>,
        prompter: &mut P,
    ) -> Result<bool> {
        let changed = match (entry, group) {
            (MenuEntry::NewGroup, _) => match non_empty(prompter.ask_for_name("Create group", "")) {
                Some(name) => {
                    self.registry.create_group(&name)?;
                    true
                }
                None => false,
            },
            (MenuEntry::RenameGroup, Some(old)) => {
                match non_empty(prompter.ask_for_name("Rename group", old)) {
                    Some(name) => {
                        self.registry.rename_group(old, &name)?;
                        true
                    }
                    None => false,
                }
            }
            (MenuEntry::ExportGroup, Some(group)) => match prompter.ask_export_path(group) {
                Some(path) => {
                    self.registry.export_group(group, &path)?;
                    true
                }
                None => false,
            },
            (MenuEntry::DeleteGroup, Some(group)) => {
                if prompter.confirm(&format!("Really delete group {}?", group)) {
                    self.registry.delete_group(group)?;
                    true
                } else {
                    false
                }
            }
            (_, None) => false,
        };

        if self.is_stale() {
            self.rebuild();
        }
        Ok(changed)
    }

    /// Drops a dragged preset on whatever label is under the pointer.
    pub fn drop_preset(
        &mut self,
        x: i32,
        y: i32,
        source: &DragSource,
        preset_name: &str,
    ) -> Result<TransferOutcome> {
        let group = self.hit_test(x, y)?;
        self.registry
            .transfer_to_group(source, preset_name, group.as_deref())
    }
}

impl<E: TextLayoutEngine> Drop for LabelStrip<E> {
    fn drop(&mut self) {
        self.registry.hub().unsubscribe(self.subscription);
    }
}

fn non_empty(name: Option<String>) -> Option<String> {
    name.filter(|n| !n.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::brush::{Preset, PresetStore};
    use crate::library::ObserverHub;
    use crate::selector::layout::StateLevel;
    use crate::selector::text::MonospaceLayout;
    use tempfile::TempDir;

    fn make_registry() -> (TempDir, Arc<Registry>) {
        let dir = TempDir::new().unwrap();
        let store = PresetStore::new(dir.path().join("brushes"));
        (dir, Arc::new(Registry::new(store, Arc::new(ObserverHub::new()))))
    }

    fn make_preset(name: &str) -> Preset {
        let mut preset = Preset::new();
        preset.set_name(name);
        preset
    }

    #[derive(Default)]
    struct ScriptedPrompter {
        names: Vec<Option<String>>,
        confirm: bool,
        export_path: Option<PathBuf>,
        asked: Vec<String>,
    }

    impl Prompter for ScriptedPrompter {
        fn ask_for_name(&mut self, title: &str, initial: &str) -> Option<String> {
            self.asked.push(format!("{title}:{initial}"));
            self.names.pop().flatten()
        }

        fn confirm(&mut self, question: &str) -> bool {
            self.asked.push(question.to_string());
            self.confirm
        }

        fn ask_export_path(&mut self, group: &str) -> Option<PathBuf> {
            self.asked.push(format!("export:{group}"));
            self.export_path.clone()
        }
    }

    type Fixture = (TempDir, Arc<Registry>, LabelStrip<MonospaceLayout>);

    fn strip_with(groups: &[&str]) -> Fixture {
        let (dir, registry) = make_registry();
        for group in groups {
            registry.create_group(group).unwrap();
        }
        let engine = MonospaceLayout::new(8, 18);
        let strip = LabelStrip::new(Arc::clone(&registry), engine, true, 400);
        (dir, registry, strip)
    }

    fn click(
        strip: &mut LabelStrip<MonospaceLayout>,
        group: &str,
        modifiers: Modifiers,
    ) -> PressOutcome {
        let (x, y) = strip.anchor_point(group).unwrap();
        strip.press(x, y, PointerButton::Primary, modifiers).unwrap()
    }

    #[test]
    fn group_set_change_marks_layout_stale() {
        let (_dir, registry, mut strip) = strip_with(&["ink"]);
        assert!(!strip.is_stale());

        registry.create_group("charcoal").unwrap();
        assert!(strip.is_stale());
        assert!(matches!(strip.hit_test(0, 0), Err(LibraryError::StaleLayout)));

        strip.rebuild();
        assert!(strip.hit_test(0, 0).is_ok());

        strip.set_width(200);
        assert!(strip.is_stale());
        strip.set_width(200);
        strip.rebuild();
        assert!(!strip.is_stale());
    }

    #[test]
    fn plain_click_solos_and_ctrl_click_toggles() {
        let (_dir, registry, mut strip) = strip_with(&["ink", "charcoal", "pencil"]);

        let outcome = click(&mut strip, "ink", Modifiers::NONE);
        assert_eq!(outcome, PressOutcome::ActiveGroupsChanged(vec!["ink".to_string()]));

        click(&mut strip, "pencil", Modifiers::CTRL);
        assert_eq!(registry.active_groups(), vec!["ink", "pencil"]);

        let (x, y) = strip.anchor_point("ink").unwrap();
        strip.press(x, y, PointerButton::Middle, Modifiers::NONE).unwrap();
        assert_eq!(registry.active_groups(), vec!["pencil"]);

        let shift = Modifiers {
            ctrl: false,
            shift: true,
        };
        click(&mut strip, "charcoal", shift);
        assert_eq!(registry.active_groups(), vec!["pencil", "charcoal"]);
        assert!(!strip.is_stale());
    }

    #[test]
    fn press_over_separator_is_ignored() {
        let (_dir, registry, mut strip) = strip_with(&["ink"]);
        let outcome = strip
            .press(1000, 5, PointerButton::Primary, Modifiers::NONE)
            .unwrap();
        assert_eq!(outcome, PressOutcome::Ignored);
        assert!(registry.active_groups().is_empty());
    }

    #[test]
    fn hover_changes_background_only_for_hidden_groups() {
        let (_dir, registry, mut strip) = strip_with(&["ink", "charcoal"]);
        registry.set_active_groups(vec!["charcoal".to_string()]).unwrap();
        strip.rebuild();
        strip.take_redraw();

        let (x, y) = strip.anchor_point("ink").unwrap();
        assert!(strip.pointer_moved(x, y).unwrap());
        assert!(!strip.pointer_moved(x, y).unwrap());
        assert!(strip.take_redraw());
        assert_eq!(strip.label_state("ink").unwrap().background, StateLevel::Prelight);

        let (x, y) = strip.anchor_point("charcoal").unwrap();
        strip.pointer_moved(x, y).unwrap();
        let state = strip.label_state("charcoal").unwrap();
        assert_eq!(state.background, StateLevel::Selected);
        assert_eq!(state.foreground, StateLevel::Selected);
        assert_eq!(strip.label_state("ink").unwrap().background, StateLevel::Normal);

        assert!(strip.pointer_left());
        assert!(!strip.pointer_left());
    }

    #[test]
    fn context_menu_marks_group_until_finished() {
        let (_dir, registry, mut strip) = strip_with(&["ink"]);
        registry.set_active_groups(vec!["ink".to_string()]).unwrap();
        strip.rebuild();

        let (x, y) = strip.anchor_point("ink").unwrap();
        let outcome = strip
            .press(x, y, PointerButton::Secondary, Modifiers::NONE)
            .unwrap();
        assert_eq!(
            outcome,
            PressOutcome::ContextMenu {
                group: Some("ink".to_string()),
                entries: MenuEntry::for_target(Some("ink")),
            }
        );
        let state = strip.label_state("ink").unwrap();
        assert_eq!(state.background, StateLevel::Active);
        assert_eq!(state.foreground, StateLevel::Selected);

        strip.menu_finished();
        assert_eq!(strip.label_state("ink").unwrap().background, StateLevel::Selected);

        let outcome = strip
            .press(1000, 5, PointerButton::Secondary, Modifiers::NONE)
            .unwrap();
        assert_eq!(
            outcome,
            PressOutcome::ContextMenu {
                group: None,
                entries: vec![MenuEntry::NewGroup],
            }
        );
    }

    #[test]
    fn menu_entries_go_through_prompter() {
        let (dir, registry, mut strip) = strip_with(&["ink"]);
        let mut prompter = ScriptedPrompter {
            names: vec![Some("pens".to_string()), Some("sketch".to_string())],
            confirm: false,
            export_path: Some(dir.path().join("ink.zip")),
            ..Default::default()
        };

        assert!(strip.run_menu_entry(MenuEntry::NewGroup, None, &mut prompter).unwrap());
        assert!(registry.has_group("sketch"));
        assert!(!strip.is_stale());

        assert!(strip
            .run_menu_entry(MenuEntry::RenameGroup, Some("ink"), &mut prompter)
            .unwrap());
        assert_eq!(registry.sorted_group_names(), vec!["pens", "sketch"]);

        assert!(!strip
            .run_menu_entry(MenuEntry::DeleteGroup, Some("pens"), &mut prompter)
            .unwrap());
        assert!(registry.has_group("pens"));

        assert!(strip
            .run_menu_entry(MenuEntry::ExportGroup, Some("pens"), &mut prompter)
            .unwrap());
        assert!(dir.path().join("ink.zip").is_file());

        assert_eq!(
            prompter.asked,
            vec![
                "Create group:",
                "Rename group:ink",
                "Really delete group pens?",
                "export:pens",
            ]
        );
    }

    #[test]
    fn declined_or_empty_prompts_change_nothing() {
        let (_dir, registry, mut strip) = strip_with(&["ink"]);
        let mut prompter = ScriptedPrompter {
            names: vec![None, Some("   ".to_string())],
            ..Default::default()
        };

        assert!(!strip.run_menu_entry(MenuEntry::NewGroup, None, &mut prompter).unwrap());
        assert!(!strip
            .run_menu_entry(MenuEntry::RenameGroup, Some("ink"), &mut prompter)
            .unwrap());
        assert!(!strip
            .run_menu_entry(MenuEntry::ExportGroup, Some("ink"), &mut prompter)
            .unwrap());
        assert_eq!(registry.group_names(), vec!["ink"]);
    }

    #[test]
    fn failing_menu_entries_surface_errors() {
        let (_dir, registry, mut strip) = strip_with(&["ink", "charcoal"]);
        registry.add_preset(make_preset("pen"), "ink").unwrap();
        let mut prompter = ScriptedPrompter {
            names: vec![Some("charcoal".to_string())],
            confirm: true,
            ..Default::default()
        };

        let err = strip
            .run_menu_entry(MenuEntry::RenameGroup, Some("ink"), &mut prompter)
            .unwrap_err();
        assert!(matches!(err, LibraryError::AlreadyExists(_)));

        let err = strip
            .run_menu_entry(MenuEntry::DeleteGroup, Some("ink"), &mut prompter)
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotEmpty(_)));
        assert_eq!(registry.group_member_names("ink").unwrap(), vec!["pen"]);
    }

    #[test]
    fn drop_on_label_appends_and_redrop_toggles_out() {
        let (_dir, registry, mut strip) = strip_with(&["ink", "charcoal"]);
        registry.add_preset(make_preset("pen"), "ink").unwrap();
        let source = DragSource::preset_list("ink");

        let (x, y) = strip.anchor_point("charcoal").unwrap();
        assert!(strip.drag_motion(x, y).unwrap());
        assert_eq!(
            strip.drop_preset(x, y, &source, "pen").unwrap(),
            TransferOutcome::Appended
        );
        assert_eq!(
            strip.drop_preset(x, y, &source, "pen").unwrap(),
            TransferOutcome::RemovedFromSource
        );
        assert!(registry.group_member_names("ink").unwrap().is_empty());

        assert_eq!(
            strip.drop_preset(1000, 5, &source, "pen").unwrap(),
            TransferOutcome::Declined
        );
    }

    #[test]
    fn drop_unsubscribes() {
        let (_dir, registry, strip) = strip_with(&["ink"]);
        let before = registry.hub().subscriber_count();
        drop(strip);
        assert_eq!(registry.hub().subscriber_count(), before - 1);
    }
}
