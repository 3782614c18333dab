//! The closed set of brush settings and the fixed-size parameter vector.

use crate::error::{LibraryError, Result};

/// Static description of one brush setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingInfo {
    /// Canonical name used in preset files
    pub cname: &'static str,
    /// Display name
    pub name: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

const fn info(cname: &'static str, name: &'static str, default: f32, min: f32, max: f32) -> SettingInfo {
    SettingInfo {
        cname,
        name,
        default,
        min,
        max,
    }
}

pub const SETTING_COUNT: usize = 38;

pub const SETTINGS: [SettingInfo; SETTING_COUNT] = [
    info("opaque", "Opacity", 1.0, 0.0, 1.0),
    info("opaque_multiply", "Opacity multiply", 0.0, 0.0, 1.0),
    info("opaque_linearize", "Opacity linearize", 0.9, 0.0, 2.0),
    info("radius_logarithmic", "Radius", 2.0, -2.0, 5.0),
    info("hardness", "Hardness", 0.8, 0.0, 1.0),
    info("dabs_per_basic_radius", "Dabs per basic radius", 0.0, 0.0, 6.0),
    info("dabs_per_actual_radius", "Dabs per actual radius", 2.0, 0.0, 6.0),
    info("dabs_per_second", "Dabs per second", 0.0, 0.0, 80.0),
    info("radius_by_random", "Radius by random", 0.0, 0.0, 1.5),
    info("speed1_slowness", "Fine speed filter", 0.04, 0.0, 0.2),
    info("speed2_slowness", "Gross speed filter", 0.8, 0.0, 3.0),
    info("speed1_gamma", "Fine speed gamma", 4.0, -8.0, 8.0),
    info("speed2_gamma", "Gross speed gamma", 4.0, -8.0, 8.0),
    info("offset_by_random", "Jitter", 0.0, 0.0, 1.5),
    info("offset_by_speed", "Offset by speed", 0.0, -3.0, 3.0),
    info("offset_by_speed_slowness", "Offset by speed filter", 1.0, 0.0, 15.0),
    info("slow_tracking", "Slow position tracking", 0.0, 0.0, 10.0),
    info("slow_tracking_per_dab", "Slow tracking per dab", 0.0, 0.0, 10.0),
    info("tracking_noise", "Tracking noise", 0.0, 0.0, 12.0),
    info("color_h", "Color hue", 0.0, 0.0, 1.0),
    info("color_s", "Color saturation", 0.0, 0.0, 1.0),
    info("color_v", "Color value", 0.0, 0.0, 1.0),
    info("change_color_h", "Change color hue", 0.0, -2.0, 2.0),
    info("change_color_l", "Change color lightness (HSL)", 0.0, -2.0, 2.0),
    info("change_color_hsl_s", "Change color satur. (HSL)", 0.0, -2.0, 2.0),
    info("change_color_v", "Change color value (HSV)", 0.0, -2.0, 2.0),
    info("change_color_hsv_s", "Change color satur. (HSV)", 0.0, -2.0, 2.0),
    info("smudge", "Smudge", 0.0, 0.0, 1.0),
    info("smudge_length", "Smudge length", 0.5, 0.0, 1.0),
    info("eraser", "Eraser", 0.0, 0.0, 1.0),
    info("stroke_threshold", "Stroke threshold", 0.0, 0.0, 0.5),
    info("stroke_duration_logarithmic", "Stroke duration", 4.0, -1.0, 7.0),
    info("stroke_holdtime", "Stroke hold time", 0.0, 0.0, 10.0),
    info("custom_input", "Custom input", 0.0, -5.0, 5.0),
    info("custom_input_slowness", "Custom input filter", 0.0, 0.0, 10.0),
    info("elliptical_dab_ratio", "Elliptical dab: ratio", 1.0, 1.0, 10.0),
    info("elliptical_dab_angle", "Elliptical dab: angle", 90.0, 0.0, 180.0),
    info("direction_filter", "Direction filter", 2.0, 0.0, 10.0),
];

/// Index of a known setting. Only constructible for valid indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Setting(usize);

impl Setting {
    pub const OPAQUE: Setting = Setting(0);
    pub const RADIUS_LOGARITHMIC: Setting = Setting(3);
    pub const HARDNESS: Setting = Setting(4);
    pub const SMUDGE: Setting = Setting(27);
    pub const ERASER: Setting = Setting(29);

    pub fn all() -> impl Iterator<Item = Setting> {
        (0..SETTING_COUNT).map(Setting)
    }

    pub fn from_index(index: usize) -> Option<Setting> {
        (index < SETTING_COUNT).then_some(Setting(index))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn info(self) -> &'static SettingInfo {
        &SETTINGS[self.0]
    }

    pub fn cname(self) -> &'static str {
        self.info().cname
    }
}

/// Resolves a canonical setting name.
///
/// `Ok(None)` means the name is unknown. A name that matches more than one
/// table entry means the table itself is malformed.
pub fn find_setting(cname: &str) -> Result<Option<Setting>> {
    find_in(&SETTINGS, cname)
}

fn find_in(table: &[SettingInfo], cname: &str) -> Result<Option<Setting>> {
    let mut found = None;
    for (index, entry) in table.iter().enumerate() {
        if entry.cname != cname {
            continue;
        }
        if found.is_some() {
            return Err(LibraryError::InvariantViolation(format!(
                "setting name {:?} matches more than one known setting",
                cname
            )));
        }
        found = Some(Setting(index));
    }
    Ok(found)
}

/// One value per known setting, always complete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters([f32; SETTING_COUNT]);

impl Parameters {
    pub fn get(&self, setting: Setting) -> f32 {
        self.0[setting.0]
    }

    pub fn set(&mut self, setting: Setting, value: f32) {
        self.0[setting.0] = value;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Setting, f32)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(index, value)| (Setting(index), *value))
    }
}

impl Default for Parameters {
    fn default() -> Self {
        let mut values = [0.0; SETTING_COUNT];
        for (value, entry) in values.iter_mut().zip(SETTINGS.iter()) {
            *value = entry.default;
        }
        Self(values)
    }
}
