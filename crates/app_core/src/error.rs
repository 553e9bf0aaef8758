//! Application error types

use thiserror::Error;

/// User-facing error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Listing or fetch failure; the folder view falls back to empty
    Io,
    /// Asset vanished between listing and fetch; the slot shows a placeholder
    NotFound,
    /// Tag/favorite/settings write failure; optimistic local state is kept
    Persist,
}

/// Main application error type
///
/// Cloneable so a single failure can be delivered to every waiter of a shared fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to save {what}: {message}")]
    Persist { what: String, message: String },

    #[error("Cannot decode media: {0}")]
    Decode(String),

    #[error("File too large: {path} ({size} bytes, limit {limit})")]
    TooLarge { path: String, size: u64, limit: u64 },

    #[error("Request dropped before it started: {0}")]
    Dropped(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn io(path: impl Into<String>, message: impl ToString) -> Self {
        AppError::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn persist(what: impl Into<String>, message: impl ToString) -> Self {
        AppError::Persist {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// Category used when surfacing the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Persist { .. } | AppError::Config(_) => ErrorKind::Persist,
            AppError::Io { .. } | AppError::Decode(_) | AppError::TooLarge { .. } | AppError::Dropped(_) => {
                ErrorKind::Io
            }
        }
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Io { path, .. } => format!("Failed to read {}", path),
            AppError::NotFound(path) => format!("File not found: {}", path),
            AppError::Persist { what, .. } => format!("Could not save {}. Try again.", what),
            AppError::Decode(_) => "Cannot preview this file".to_string(),
            AppError::TooLarge { path, .. } => format!("File too large to preview: {}", path),
            _ => self.to_string(),
        }
    }
}

impl From<app_fs::FsError> for AppError {
    fn from(e: app_fs::FsError) -> Self {
        match e {
            app_fs::FsError::NotFound(p) => AppError::NotFound(p),
            app_fs::FsError::TooLarge { path, size, limit } => AppError::TooLarge { path, size, limit },
            app_fs::FsError::Unsupported(p) => AppError::Decode(format!("unsupported media type: {}", p)),
            app_fs::FsError::Io { path, source } => AppError::io(path, source),
            app_fs::FsError::NotADirectory(p) => AppError::io(p, "not a directory"),
            app_fs::FsError::Watch(e) => AppError::io("<watcher>", e),
        }
    }
}

impl From<app_store::StoreError> for AppError {
    fn from(e: app_store::StoreError) -> Self {
        if e.is_not_found() {
            if let app_store::StoreError::Io { path, .. } = &e {
                return AppError::NotFound(path.display().to_string());
            }
        }
        match e {
            app_store::StoreError::Io { path, source } => AppError::persist(path.display().to_string(), source),
            app_store::StoreError::Json { path, source } => AppError::persist(path.display().to_string(), source),
            app_store::StoreError::InvalidTag(tag) => AppError::persist("tag", format!("invalid tag {:?}", tag)),
            app_store::StoreError::NoHomeDir => AppError::Config("no home directory".to_string()),
        }
    }
}
