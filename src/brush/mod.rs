//! Brush presets: a complete parameter vector, a color and preview imagery.

mod settings;
mod store;
mod thumbnail;

pub use settings::{find_setting, Parameters, Setting, SettingInfo, SETTINGS, SETTING_COUNT};
pub use store::{PresetStore, FORMAT_MARKER, PARAMETER_FILE_EXT, PREVIEW_SUFFIX};
pub use thumbnail::scale_nostretch_centered;

use image::RgbaImage;

pub const DEFAULT_THUMBNAIL_SIZE: (u32, u32) = (64, 64);

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel `255 - c`; applying it twice is the identity.
    pub fn inverted(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }
}

/// A named, persistable brush preset.
#[derive(Debug, Clone)]
pub struct Preset {
    name: String,
    parameters: Parameters,
    color: Rgb,
    preview: Option<RgbaImage>,
    thumbnail: Option<RgbaImage>,
    thumbnail_size: (u32, u32),
    /// Digest of the parameter file as last read or written
    disk_digest: Option<String>,
}

impl Preset {
    /// Default parameters, black, no preview and no name.
    pub fn new() -> Self {
        Self::with_thumbnail_size(DEFAULT_THUMBNAIL_SIZE.0, DEFAULT_THUMBNAIL_SIZE.1)
    }

    pub fn with_thumbnail_size(width: u32, height: u32) -> Self {
        Self {
            name: String::new(),
            parameters: Parameters::default(),
            color: Rgb::BLACK,
            preview: None,
            thumbnail: None,
            thumbnail_size: (width, height),
            disk_digest: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    pub fn setting(&self, setting: Setting) -> f32 {
        self.parameters.get(setting)
    }

    pub fn set_setting(&mut self, setting: Setting, value: f32) {
        self.parameters.set(setting, value);
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.color = Rgb::new(r, g, b);
    }

    pub fn invert_color(&mut self) {
        self.color = self.color.inverted();
    }

    /// Copies every setting and the color. Name and imagery stay untouched.
    pub fn copy_settings_from(&mut self, other: &Preset) {
        for (setting, value) in other.parameters.iter() {
            self.parameters.set(setting, value);
        }
        self.color = other.color;
    }

    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    pub fn thumbnail(&self) -> Option<&RgbaImage> {
        self.thumbnail.as_ref()
    }

    pub fn thumbnail_size(&self) -> (u32, u32) {
        self.thumbnail_size
    }

    /// Replaces the preview and rederives the thumbnail from it.
    pub fn update_preview(&mut self, preview: RgbaImage) {
        let (width, height) = self.thumbnail_size;
        self.thumbnail = Some(scale_nostretch_centered(&preview, width, height));
        self.preview = Some(preview);
    }

    pub(crate) fn disk_digest(&self) -> Option<&str> {
        self.disk_digest.as_deref()
    }

    pub(crate) fn set_disk_digest(&mut self, digest: Option<String>) {
        self.disk_digest = digest;
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::new()
    }
}
