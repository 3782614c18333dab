//! Brushdeck - brush preset library with named groups
//!
//! Presets are persisted one file pair each, grouped into named ordered
//! collections, and shown through a group label strip and per-group lists.

pub mod app_meta;
pub mod brush;
pub mod config;
pub mod error;
pub mod library;
pub mod selector;

pub use config::LibraryConfig;
pub use error::{LibraryError, Result};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber. Later calls are no-ops.
pub fn init_logging() {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", app_meta::APP_LOG_TARGET).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Brushdeck logging initialized");
    }
}
