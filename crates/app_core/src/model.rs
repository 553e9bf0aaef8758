//! Core data model: listed entries and asset payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of a folder child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    Image,
    Video,
}

/// Immutable snapshot of one child of a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique within the parent folder
    pub name: String,
    pub kind: EntryKind,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size_bytes: 0,
            modified_at: DateTime::<Utc>::from(std::time::UNIX_EPOCH),
        }
    }

    /// Images and videos are assets; folders are not
    pub fn is_asset(&self) -> bool {
        matches!(self.kind, EntryKind::Image | EntryKind::Video)
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

impl From<app_fs::FileEntry> for Entry {
    fn from(e: app_fs::FileEntry) -> Self {
        let kind = match e.kind {
            app_fs::EntryKind::Folder => EntryKind::Folder,
            app_fs::EntryKind::Image => EntryKind::Image,
            app_fs::EntryKind::Video => EntryKind::Video,
        };
        Self {
            name: e.name,
            kind,
            size_bytes: e.size,
            modified_at: e.modified,
        }
    }
}

/// Fetched asset bytes, cheap to clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPayload {
    pub mime: String,
    pub data: Arc<[u8]>,
}

impl AssetPayload {
    pub fn new(mime: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `data:<mime>;base64,...` URL for presentation layers
    pub fn to_data_url(&self) -> String {
        app_fs::data_url(&self.mime, &self.data)
    }
}
