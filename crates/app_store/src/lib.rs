//! MemeFolder Persistence Layer
//!
//! Provides:
//! - Per-folder JSON tag sidecar (`.meme-tags.json`) with rename tracking
//! - Favorites list in the user's home directory

mod tags;
mod favorites;

pub use tags::{TagFile, TagsData, ImageTagInfo, TAGS_FILE_NAME};
pub use favorites::{Favorite, FavoritesFile, FAVORITES_FILE_NAME};

use std::path::PathBuf;
use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid tag: {0:?}")]
    InvalidTag(String),

    #[error("No home directory available")]
    NoHomeDir,
}

impl StoreError {
    /// Whether the error was caused by a missing file
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

fn io_err(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
