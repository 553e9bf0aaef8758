//! MemeFolder File System Layer
//!
//! Host-side file system access consumed by the core through its ports:
//! - Media classification and size limits
//! - Directory listing of folders and media files
//! - Asset reading and data URL encoding
//! - Folder watching

mod media;
mod browser;
mod watcher;

pub use media::{classify, mime_type, MediaKind, MediaLimits, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
pub use browser::{data_url, home_dir, list_directory, read_asset, EntryKind, FileEntry};
pub use watcher::{FolderWatcher, FsEvent};

use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("File too large: {path} ({size} bytes, limit {limit})")]
    TooLarge { path: String, size: u64, limit: u64 },

    #[error("Unsupported media type: {0}")]
    Unsupported(String),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl FsError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().display().to_string();
        if source.kind() == std::io::ErrorKind::NotFound {
            FsError::NotFound(path)
        } else {
            FsError::Io { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
