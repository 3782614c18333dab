//! End-to-end walk through the library: groups, presets, transfers, the
//! label strip and persistence.

#![allow(clippy::unwrap_used)]

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;

use brushdeck_lib::brush::Setting;
use brushdeck_lib::library::{
    DragSource, GroupPanel, ObserverHub, Registry, TransferMode, TransferOutcome, LOST_AND_FOUND,
};
use brushdeck_lib::selector::{
    LabelStrip, Modifiers, MonospaceLayout, PointerButton, PressOutcome, StateLevel,
    TextLayoutEngine,
};
use brushdeck_lib::{LibraryConfig, LibraryError};

fn open_in(dir: &TempDir) -> (LibraryConfig, Arc<Registry>) {
    brushdeck_lib::init_logging();
    let config = LibraryConfig {
        storage_root: dir.path().join("brushes"),
        ..LibraryConfig::default()
    };
    let registry = Arc::new(Registry::open(&config, Arc::new(ObserverHub::new())).unwrap());
    (config, registry)
}

#[test]
fn group_strip_scenario() {
    let dir = TempDir::new().unwrap();
    let (_config, registry) = open_in(&dir);

    registry.create_group("ink").unwrap();
    registry.create_group("charcoal").unwrap();
    registry
        .set_active_groups(vec!["charcoal".to_string()])
        .unwrap();

    let mut strip = LabelStrip::new(
        Arc::clone(&registry),
        MonospaceLayout::default(),
        true,
        320,
    );
    strip.rebuild();

    assert_eq!(
        strip.label_state("charcoal").unwrap().foreground,
        StateLevel::Selected
    );
    assert_ne!(
        strip.label_state("ink").unwrap().foreground,
        StateLevel::Selected
    );

    // Inside charcoal's span, then on the separator right after it
    let (x, y) = strip.anchor_point("charcoal").unwrap();
    assert_eq!(strip.hit_test(x, y).unwrap().as_deref(), Some("charcoal"));
    let span = strip.layout().span_for("charcoal").unwrap().clone();
    let rect = strip.engine().offset_rect(span.end).unwrap();
    let separator_x = rect.x + rect.width as i32 / 2;
    assert_eq!(strip.hit_test(separator_x, y).unwrap(), None);

    let (x, y) = strip.anchor_point("ink").unwrap();
    let outcome = strip
        .press(x, y, PointerButton::Primary, Modifiers::CTRL)
        .unwrap();
    assert_eq!(
        outcome,
        PressOutcome::ActiveGroupsChanged(vec!["charcoal".to_string(), "ink".to_string()])
    );
    assert_eq!(
        strip.label_state("ink").unwrap().foreground,
        StateLevel::Selected
    );
}

#[test]
fn presets_survive_a_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let (config, registry) = open_in(&dir);
    registry.create_group("ink").unwrap();
    registry.create_group("charcoal").unwrap();

    let mut preset = registry.store().create();
    preset.set_name("pen");
    preset.set_setting(Setting::HARDNESS, 0.42);
    preset.update_preview(RgbaImage::from_pixel(80, 40, Rgba([10, 20, 30, 255])));
    let pen = registry.add_preset(preset, "ink").unwrap();
    registry.save_preset(pen).unwrap();

    registry
        .transfer_to_list(
            &DragSource::preset_list("ink"),
            "pen",
            "charcoal",
            0,
            TransferMode::Copy,
        )
        .unwrap();
    registry
        .set_active_groups(vec!["ink".to_string(), "charcoal".to_string()])
        .unwrap();
    registry.save_index().unwrap();

    // A stray preset on disk that no group knows about
    let mut stray = registry.store().create();
    stray.set_name("stray");
    stray.update_preview(RgbaImage::new(8, 8));
    registry.store().save(&mut stray).unwrap();
    drop(registry);

    let reopened = Registry::open(&config, Arc::new(ObserverHub::new())).unwrap();
    assert_eq!(
        reopened.group_names(),
        vec!["ink", "charcoal", LOST_AND_FOUND]
    );
    assert_eq!(reopened.group_member_names("charcoal").unwrap(), vec!["pen"]);
    assert_eq!(
        reopened.group_member_names(LOST_AND_FOUND).unwrap(),
        vec!["stray"]
    );
    assert_eq!(reopened.active_groups(), vec!["ink", "charcoal"]);

    let pen = reopened.preset_by_name("pen").unwrap();
    let hardness = reopened
        .with_preset(pen, |p| p.setting(Setting::HARDNESS))
        .unwrap();
    assert!((hardness - 0.42).abs() < 1e-5);
    let thumb = reopened
        .with_preset(pen, |p| p.thumbnail().map(|t| t.dimensions()))
        .unwrap();
    assert_eq!(thumb, Some((64, 64)));
}

#[test]
fn group_lifecycle_errors_leave_state_alone() {
    let dir = TempDir::new().unwrap();
    let (_config, registry) = open_in(&dir);
    registry.create_group("x").unwrap();

    let err = registry.create_group("x").unwrap_err();
    assert!(matches!(err, LibraryError::AlreadyExists(_)));

    let mut preset = registry.store().create();
    preset.update_preview(RgbaImage::new(4, 4));
    let id = registry.add_preset(preset, "x").unwrap();
    registry.set_active_groups(vec!["x".to_string()]).unwrap();

    let err = registry.delete_group("x").unwrap_err();
    assert!(matches!(err, LibraryError::NotEmpty(_)));
    assert_eq!(registry.group_members("x").unwrap(), vec![id]);

    registry.remove_from_group("x", id).unwrap();
    registry.delete_group("x").unwrap();
    assert!(registry.active_groups().is_empty());
}

#[test]
fn panel_follows_drag_and_drop_with_reentrant_selection() {
    let dir = TempDir::new().unwrap();
    let (_config, registry) = open_in(&dir);
    registry.create_group("a").unwrap();
    registry.create_group("b").unwrap();
    registry
        .set_active_groups(vec!["a".to_string(), "b".to_string()])
        .unwrap();
    let panel = GroupPanel::attach(&registry);

    let mut preset = registry.store().create();
    preset.set_name("x");
    let x = registry.add_preset(preset, "a").unwrap();

    // Select whatever lands in "b", from inside the notification
    let weak = Arc::downgrade(&registry);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    registry.hub().on_collection_changed(move |group| {
        let Some(registry) = weak.upgrade() else { return };
        if group == "b" {
            let members = registry.group_members("b").unwrap();
            s.lock().push(members.clone());
            if let Some(first) = members.first() {
                registry.select_preset(Some(*first)).unwrap();
            }
        }
    });

    let source = DragSource::preset_list("a");
    let outcome = registry
        .transfer_to_list(&source, "x", "b", 5, TransferMode::Move)
        .unwrap();
    assert_eq!(outcome, TransferOutcome::Moved);
    assert_eq!(*seen.lock(), vec![vec![x]]);
    assert_eq!(registry.selected_preset(), Some(x));

    let lists = panel.visible_lists();
    assert!(lists[0].is_empty());
    assert_eq!(lists[1].presets(), &[x]);
    assert_eq!(lists[1].highlighted(), Some(x));

    let err = registry
        .transfer_to_list(&DragSource::Unrecognized, "x", "a", 0, TransferMode::Move)
        .unwrap_err();
    assert!(matches!(err, LibraryError::InvalidSource));
}
