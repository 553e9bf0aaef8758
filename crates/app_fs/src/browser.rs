//! Directory browsing and asset reading

use crate::{classify, mime_type, FsError, MediaKind, MediaLimits, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Kind of a listed child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Folder,
    Image,
    Video,
}

impl From<MediaKind> for EntryKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => EntryKind::Image,
            MediaKind::Video => EntryKind::Video,
        }
    }
}

/// One listed child of a folder
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes (0 for folders)
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl FileEntry {
    /// Build an entry from a directory child, or `None` if it is neither a folder nor media
    fn from_dir_entry(entry: &fs::DirEntry) -> Option<Self> {
        let metadata = entry.metadata().ok()?;
        let name = entry.file_name().to_string_lossy().to_string();

        let modified = metadata
            .modified()
            .unwrap_or(std::time::UNIX_EPOCH);
        let modified = DateTime::<Utc>::from(modified);

        if metadata.is_dir() {
            return Some(Self {
                name,
                kind: EntryKind::Folder,
                size: 0,
                modified,
            });
        }

        let kind = classify(&name)?;
        Some(Self {
            name,
            kind: kind.into(),
            size: metadata.len(),
            modified,
        })
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// List folders and media files in `path`
///
/// Non-media files, unreadable children, and media above its size limit are omitted.
/// Folders come first, then natural name order.
pub fn list_directory<P: AsRef<Path>>(path: P, limits: &MediaLimits) -> Result<Vec<FileEntry>> {
    let path = path.as_ref();

    let metadata = fs::metadata(path).map_err(|e| FsError::io(path, e))?;
    if !metadata.is_dir() {
        return Err(FsError::NotADirectory(path.display().to_string()));
    }

    let mut entries = Vec::new();

    for entry in fs::read_dir(path).map_err(|e| FsError::io(path, e))? {
        let Ok(entry) = entry else {
            continue;
        };
        let Some(file_entry) = FileEntry::from_dir_entry(&entry) else {
            continue;
        };

        let within_limit = match file_entry.kind {
            EntryKind::Folder => true,
            EntryKind::Image => limits.allows(MediaKind::Image, file_entry.size),
            EntryKind::Video => limits.allows(MediaKind::Video, file_entry.size),
        };
        if !within_limit {
            tracing::debug!("Skipping oversized media: {}", file_entry.name);
            continue;
        }

        entries.push(file_entry);
    }

    sort_entries(&mut entries);

    tracing::debug!("Listed {} entries in {}", entries.len(), path.display());
    Ok(entries)
}

fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| natural_sort_key(&a.name).cmp(&natural_sort_key(&b.name)))
    });
}

/// Generate a natural sort key (handles numbers correctly)
/// "image2.jpg" < "image10.jpg"
fn natural_sort_key(s: &str) -> Vec<NaturalSortPart> {
    let mut parts = Vec::new();
    let mut current_num = String::new();
    let mut current_str = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            if !current_str.is_empty() {
                parts.push(NaturalSortPart::Str(current_str.to_lowercase()));
                current_str.clear();
            }
            current_num.push(c);
        } else {
            if !current_num.is_empty() {
                parts.push(NaturalSortPart::num(&current_num));
                current_num.clear();
            }
            current_str.push(c);
        }
    }

    if !current_num.is_empty() {
        parts.push(NaturalSortPart::num(&current_num));
    }
    if !current_str.is_empty() {
        parts.push(NaturalSortPart::Str(current_str.to_lowercase()));
    }

    parts
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalSortPart {
    Num(u64),
    Str(String),
}

impl NaturalSortPart {
    fn num(digits: &str) -> Self {
        // Digit runs too long for u64 still sort, just lexically
        digits
            .parse::<u64>()
            .map(NaturalSortPart::Num)
            .unwrap_or_else(|_| NaturalSortPart::Str(digits.to_string()))
    }
}

/// Read a media file, enforcing the per-kind size limit
///
/// Returns the bytes and their MIME type.
pub fn read_asset<P: AsRef<Path>>(path: P, limits: &MediaLimits) -> Result<(Vec<u8>, &'static str)> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let metadata = fs::metadata(path).map_err(|e| FsError::io(path, e))?;
    if metadata.is_dir() {
        return Err(FsError::NotFound(display));
    }

    let kind = classify(path).ok_or_else(|| FsError::Unsupported(display.clone()))?;
    let limit = limits.limit_bytes(kind);
    if metadata.len() > limit {
        return Err(FsError::TooLarge {
            path: display,
            size: metadata.len(),
            limit,
        });
    }

    let data = fs::read(path).map_err(|e| FsError::io(path, e))?;
    Ok((data, mime_type(path)))
}

/// Encode bytes as a `data:` URL
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// The user's home directory, used as the default start folder
pub fn home_dir() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
