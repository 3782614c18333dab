//! On-disk persistence for single presets.
//!
//! Each preset is two files sharing a name prefix under the storage root:
//! - `<name>.myb`: a marker comment, then `<cname> <value>` per setting
//! - `<name>_prev.png`: the full-size preview image

use image::{ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::{find_setting, Parameters};
use super::{Preset, DEFAULT_THUMBNAIL_SIZE};
use crate::error::{LibraryError, Result};

pub const FORMAT_MARKER: &str = "# brushdeck brush file";
pub const PARAMETER_FILE_EXT: &str = "myb";
pub const PREVIEW_SUFFIX: &str = "_prev.png";

/// Reads and writes presets under one storage directory.
#[derive(Debug, Clone)]
pub struct PresetStore {
    root: PathBuf,
    thumbnail_size: (u32, u32),
}

impl PresetStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
        }
    }

    pub fn with_thumbnail_size(mut self, width: u32, height: u32) -> Self {
        self.thumbnail_size = (width, height);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn parameter_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, PARAMETER_FILE_EXT))
    }

    pub fn preview_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}{}", name, PREVIEW_SUFFIX))
    }

    /// A fresh preset using this store's thumbnail size.
    pub fn create(&self) -> Preset {
        Preset::with_thumbnail_size(self.thumbnail_size.0, self.thumbnail_size.1)
    }

    /// First `b%03d` name with no parameter file on disk and not rejected by `taken`.
    pub fn free_name<F>(&self, taken: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        let mut index: usize = 0;
        loop {
            let candidate = format!("b{:03}", index);
            if !taken(&candidate) && !self.parameter_path(&candidate).is_file() {
                return candidate;
            }
            index += 1;
        }
    }

    /// Ensures the root exists and the preset has a name, assigning one if needed.
    pub fn resolve_name(&self, preset: &mut Preset) -> Result<String> {
        fs::create_dir_all(&self.root)?;
        if preset.name().is_empty() {
            let name = self.free_name(|_| false);
            preset.set_name(name);
        }
        Ok(preset.name().to_string())
    }

    pub fn save(&self, preset: &mut Preset) -> Result<()> {
        let name = self.resolve_name(preset)?;

        let preview_path = self.preview_path(&name);
        match preset.preview() {
            Some(preview) => preview.save_with_format(&preview_path, ImageFormat::Png)?,
            None => {
                let (width, height) = self.thumbnail_size;
                RgbaImage::new(width.max(1), height.max(1))
                    .save_with_format(&preview_path, ImageFormat::Png)?
            }
        }

        let contents = render_parameter_file(preset.parameters());
        fs::write(self.parameter_path(&name), &contents)?;
        preset.set_disk_digest(Some(digest(contents.as_bytes())));

        tracing::debug!("Saved brush preset {} to {:?}", name, self.root);
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<Preset> {
        let mut preset = self.create();
        preset.set_name(name);
        self.read_into(&mut preset)?;
        tracing::debug!("Loaded brush preset {}", name);
        Ok(preset)
    }

    /// Removes both artifacts. A failure of either removal is reported.
    pub fn delete(&self, preset: &Preset) -> Result<()> {
        if preset.name().is_empty() {
            return Err(LibraryError::NotFound(
                "preset has never been saved".to_string(),
            ));
        }

        let preview_path = self.preview_path(preset.name());
        let parameter_path = self.parameter_path(preset.name());
        let preview_result = fs::remove_file(&preview_path);
        let parameter_result = fs::remove_file(&parameter_path);

        preview_result.map_err(|e| LibraryError::from_io_at(e, &preview_path))?;
        parameter_result.map_err(|e| LibraryError::from_io_at(e, &parameter_path))?;

        tracing::debug!("Deleted brush preset {}", preset.name());
        Ok(())
    }

    /// Rereads the preset if its parameter file differs from what was last
    /// read or written. Presets that were never persisted are left alone.
    pub fn reload_if_changed(&self, preset: &mut Preset) -> Result<bool> {
        let Some(known) = preset.disk_digest().map(str::to_string) else {
            return Ok(false);
        };

        let parameter_path = self.parameter_path(preset.name());
        let contents = fs::read_to_string(&parameter_path)
            .map_err(|e| LibraryError::from_io_at(e, &parameter_path))?;
        if digest(contents.as_bytes()) == known {
            return Ok(false);
        }

        tracing::info!("Brush preset {} changed on disk, reloading", preset.name());
        self.read_into(preset)?;
        Ok(true)
    }

    /// Names of every preset that has a parameter file, sorted.
    pub fn stored_names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PARAMETER_FILE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_into(&self, preset: &mut Preset) -> Result<()> {
        let name = preset.name().to_string();
        let preview_path = self.preview_path(&name);
        let parameter_path = self.parameter_path(&name);
        if !preview_path.is_file() {
            return Err(LibraryError::NotFound(preview_path.display().to_string()));
        }

        let preview = image::open(&preview_path)?.to_rgba8();
        let contents = fs::read_to_string(&parameter_path)
            .map_err(|e| LibraryError::from_io_at(e, &parameter_path))?;

        let parameters = preset.parameters_mut();
        parameters.reset();
        apply_parameter_file(&contents, parameters, &name)?;

        preset.update_preview(preview);
        preset.set_disk_digest(Some(digest(contents.as_bytes())));
        Ok(())
    }
}

pub(crate) fn render_parameter_file(parameters: &Parameters) -> String {
    let mut out = String::new();
    out.push_str(FORMAT_MARKER);
    out.push('\n');
    for (setting, value) in parameters.iter() {
        let _ = writeln!(out, "{} {:.6}", setting.cname(), value);
    }
    out
}

/// Applies every recognizable line and returns how many were applied.
///
/// Malformed lines and unknown names are skipped with a warning; only a
/// malformed settings table is an error.
pub(crate) fn apply_parameter_file(
    contents: &str,
    parameters: &mut Parameters,
    source: &str,
) -> Result<usize> {
    let mut applied = 0usize;

    for (line_no, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let (Some(cname), Some(raw_value), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            tracing::warn!("{}:{}: ignored a malformed line", source, line_no + 1);
            continue;
        };
        let Ok(value) = raw_value.parse::<f32>() else {
            tracing::warn!(
                "{}:{}: ignored a line with unparsable value {:?}",
                source,
                line_no + 1,
                raw_value
            );
            continue;
        };

        match find_setting(cname)? {
            Some(setting) => {
                parameters.set(setting, value);
                applied += 1;
            }
            None => tracing::warn!("{}:{}: unknown setting {:?}", source, line_no + 1, cname),
        }
    }

    if applied == 0 {
        tracing::warn!("{}: only garbage in this file, using defaults", source);
    }
    Ok(applied)
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::brush::{Setting, SETTING_COUNT};
    use image::Rgba;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> PresetStore {
        PresetStore::new(dir.path().join("brushes"))
    }

    fn preset_with_preview(store: &PresetStore) -> Preset {
        let mut preset = store.create();
        preset.update_preview(RgbaImage::from_pixel(40, 20, Rgba([9, 8, 7, 255])));
        preset
    }

    #[test]
    fn save_assigns_first_free_name() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut first = preset_with_preview(&store);
        store.save(&mut first).unwrap();
        assert_eq!(first.name(), "b000");

        let mut second = preset_with_preview(&store);
        store.save(&mut second).unwrap();
        assert_eq!(second.name(), "b001");

        assert!(store.parameter_path("b000").is_file());
        assert!(store.preview_path("b001").is_file());
        assert_eq!(store.stored_names().unwrap(), vec!["b000", "b001"]);
    }

    #[test]
    fn free_name_skips_names_taken_in_memory() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.free_name(|name| name == "b000"), "b001");
    }

    #[test]
    fn parameter_file_layout() {
        let text = render_parameter_file(&Parameters::default());
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(FORMAT_MARKER));
        assert_eq!(lines.next(), Some("opaque 1.000000"));
        assert_eq!(text.lines().count(), SETTING_COUNT + 1);
    }

    #[test]
    fn load_round_trips_and_derives_thumbnail() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).with_thumbnail_size(16, 16);

        let mut preset = preset_with_preview(&store);
        preset.set_setting(Setting::HARDNESS, 0.33);
        preset.set_setting(Setting::RADIUS_LOGARITHMIC, -1.25);
        store.save(&mut preset).unwrap();

        let loaded = store.load(preset.name()).unwrap();
        assert_eq!(loaded.name(), preset.name());
        assert!((loaded.setting(Setting::HARDNESS) - 0.33).abs() < 1e-5);
        assert!((loaded.setting(Setting::RADIUS_LOGARITHMIC) + 1.25).abs() < 1e-5);
        assert_eq!(loaded.preview().map(|p| p.dimensions()), Some((40, 20)));
        assert_eq!(loaded.thumbnail().map(|t| t.dimensions()), Some((16, 16)));
    }

    #[test]
    fn garbage_lines_do_not_disturb_recognized_values() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut preset = preset_with_preview(&store);
        preset.set_setting(Setting::SMUDGE, 0.75);
        store.save(&mut preset).unwrap();

        let path = store.parameter_path(preset.name());
        let mut text = fs::read_to_string(&path).unwrap();
        text.push_str("not_a_setting 3.0\n");
        text.push_str("smudge\n");
        text.push_str("eraser 1.0 extra\n");
        text.push_str("hardness abc\n");
        text.push('\n');
        fs::write(&path, text).unwrap();

        let loaded = store.load(preset.name()).unwrap();
        assert!((loaded.setting(Setting::SMUDGE) - 0.75).abs() < 1e-6);
        assert_eq!(loaded.setting(Setting::ERASER), 0.0);
        assert!((loaded.setting(Setting::HARDNESS) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn file_of_only_garbage_loads_defaults() {
        let mut params = Parameters::default();
        params.set(Setting::HARDNESS, 0.1);
        params.reset();
        let applied =
            apply_parameter_file("# header\nfoo\nbar 1 2\n", &mut params, "test").unwrap();
        assert_eq!(applied, 0);
        assert_eq!(params, Parameters::default());
    }

    #[test]
    fn load_without_preview_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let err = store.load("missing").unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[test]
    fn delete_removes_both_files_and_reports_missing_ones() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut preset = preset_with_preview(&store);
        store.save(&mut preset).unwrap();
        store.delete(&preset).unwrap();
        assert!(!store.parameter_path(preset.name()).exists());
        assert!(!store.preview_path(preset.name()).exists());

        let err = store.delete(&preset).unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[test]
    fn save_under_a_regular_file_is_an_io_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let store = PresetStore::new(blocker.join("brushes"));

        let mut preset = preset_with_preview(&store);
        preset.set_name("pen");
        let err = store.save(&mut preset).unwrap_err();
        assert!(err.is_io_failure(), "{err:?}");
        assert_eq!(preset.disk_digest(), None);
    }

    #[test]
    fn delete_that_cannot_remove_is_an_io_failure() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut preset = preset_with_preview(&store);
        preset.set_name("pen");
        store.save(&mut preset).unwrap();

        // A directory where the preview should be cannot be removed as a file
        let preview_path = store.preview_path("pen");
        fs::remove_file(&preview_path).unwrap();
        fs::create_dir(&preview_path).unwrap();

        let err = store.delete(&preset).unwrap_err();
        assert!(err.is_io_failure(), "{err:?}");
        assert!(!store.parameter_path("pen").exists());
    }

    #[test]
    fn reload_if_changed_picks_up_external_edits() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut preset = preset_with_preview(&store);
        store.save(&mut preset).unwrap();
        assert!(!store.reload_if_changed(&mut preset).unwrap());

        let path = store.parameter_path(preset.name());
        fs::write(&path, format!("{}\nhardness 0.125\n", FORMAT_MARKER)).unwrap();

        assert!(store.reload_if_changed(&mut preset).unwrap());
        assert!((preset.setting(Setting::HARDNESS) - 0.125).abs() < 1e-6);
        assert_eq!(preset.setting(Setting::OPAQUE), 1.0);
        assert!(!store.reload_if_changed(&mut preset).unwrap());
    }

    #[test]
    fn unsaved_preset_is_never_reloaded() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut preset = store.create();
        assert!(!store.reload_if_changed(&mut preset).unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn parameter_text_round_trips(values in prop::collection::vec(-10.0f32..10.0f32, SETTING_COUNT)) {
            let mut original = Parameters::default();
            for (setting, value) in Setting::all().zip(values.iter()) {
                original.set(setting, *value);
            }

            let text = render_parameter_file(&original);
            let mut parsed = Parameters::default();
            let applied = apply_parameter_file(&text, &mut parsed, "roundtrip").unwrap();
            prop_assert_eq!(applied, SETTING_COUNT);
            for (setting, value) in original.iter() {
                prop_assert!((parsed.get(setting) - value).abs() < 1e-5);
            }
        }
    }
}
