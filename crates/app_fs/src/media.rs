//! Media classification by file extension

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "jfif", "gif", "webp", "bmp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "avi", "mov", "wmv", "flv", "m4v"];

const MIB: u64 = 1024 * 1024;

/// Kind of previewable media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

/// Classify a file name by its (case-insensitive) extension
pub fn classify<P: AsRef<Path>>(name: P) -> Option<MediaKind> {
    let ext = extension_of(name.as_ref())?;
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// MIME type for a media file; unknown images fall back to `image/png`
pub fn mime_type<P: AsRef<Path>>(name: P) -> &'static str {
    let ext = extension_of(name.as_ref()).unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        _ => "image/png",
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Per-kind file size ceilings, in MiB
///
/// Media above its ceiling is neither listed nor served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaLimits {
    pub video_limit_mb: u64,
    pub image_limit_mb: u64,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            video_limit_mb: 10,
            image_limit_mb: 20,
        }
    }
}

impl MediaLimits {
    pub const VIDEO_RANGE: (u64, u64) = (1, 50);
    pub const IMAGE_RANGE: (u64, u64) = (1, 100);

    /// Clamp both ceilings into their allowed ranges
    pub fn clamped(self) -> Self {
        Self {
            video_limit_mb: self.video_limit_mb.clamp(Self::VIDEO_RANGE.0, Self::VIDEO_RANGE.1),
            image_limit_mb: self.image_limit_mb.clamp(Self::IMAGE_RANGE.0, Self::IMAGE_RANGE.1),
        }
    }

    /// Size ceiling in bytes for the given kind
    pub fn limit_bytes(&self, kind: MediaKind) -> u64 {
        let limits = self.clamped();
        match kind {
            MediaKind::Image => limits.image_limit_mb * MIB,
            MediaKind::Video => limits.video_limit_mb * MIB,
        }
    }

    pub fn allows(&self, kind: MediaKind, size: u64) -> bool {
        size <= self.limit_bytes(kind)
    }
}
