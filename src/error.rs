//! Error types shared by the preset store, registry and label strip.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Group is not empty: {0}")]
    NotEmpty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Index error: {0}")]
    Index(#[from] serde_json::Error),

    #[error("Drag source is not a preset list")]
    InvalidSource,

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Label layout is stale and must be rebuilt")]
    StaleLayout,
}

impl LibraryError {
    /// True for failures of the underlying storage or codec layers.
    pub fn is_io_failure(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Image(_) | Self::Archive(_))
    }

    /// Maps a missing file to `NotFound`, keeping every other error as IO.
    pub(crate) fn from_io_at(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.display().to_string())
        } else {
            Self::Io(err)
        }
    }
}

impl From<LibraryError> for String {
    fn from(err: LibraryError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
