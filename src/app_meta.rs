//! Application naming constants shared by storage and config paths.

pub const APP_CONFIG_DIR_NAME: &str = "brushdeck";
/// Log target prefix; matches the library crate name.
pub const APP_LOG_TARGET: &str = "brushdeck_lib";

/// Overrides the default brush storage directory when set and non-empty.
pub const LIBRARY_DIR_ENV: &str = "BRUSHDECK_LIBRARY_DIR";
