//! Per-folder tag sidecar file

use crate::{io_err, Result, StoreError};
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Sidecar file name, stored inside each tagged folder
pub const TAGS_FILE_NAME: &str = ".meme-tags.json";

/// Tag information for a single image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTagInfo {
    /// Content hash, used to follow renames
    #[serde(default)]
    pub hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// Contents of a sidecar file: image name -> tag info
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: BTreeMap<String, ImageTagInfo>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TagsData {
    /// Find an entry by content hash
    fn find_by_hash(&self, hash: &str) -> Option<String> {
        self.images
            .iter()
            .find(|(_, info)| !info.hash.is_empty() && info.hash == hash)
            .map(|(name, _)| name.clone())
    }
}

/// Reads and writes tag sidecars
///
/// Read-modify-write cycles are serialized so concurrent changes in one
/// process do not overwrite each other.
#[derive(Default)]
pub struct TagFile {
    write_lock: Mutex<()>,
}

impl TagFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sidecar path for a folder
    pub fn path_for(folder: &Path) -> PathBuf {
        folder.join(TAGS_FILE_NAME)
    }

    /// Load the sidecar; a missing file yields empty data
    pub fn load(&self, folder: &Path) -> Result<TagsData> {
        let path = Self::path_for(folder);

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TagsData::default()),
            Err(e) => return Err(io_err(&path)(e)),
        };

        serde_json::from_slice(&content).map_err(|source| StoreError::Json { path, source })
    }

    fn save(&self, folder: &Path, data: &TagsData) -> Result<()> {
        let path = Self::path_for(folder);
        let json = serde_json::to_vec_pretty(data).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(io_err(&path))?;
        tracing::debug!("Saved tags to {:?}", path);
        Ok(())
    }

    /// All tags in a folder, keyed by image name
    pub fn all_tags(&self, folder: &Path) -> Result<BTreeMap<String, Vec<String>>> {
        let data = self.load(folder)?;
        Ok(data
            .images
            .into_iter()
            .map(|(name, info)| (name, info.tags))
            .collect())
    }

    /// Tags of a single image (empty when untagged)
    pub fn image_tags(&self, folder: &Path, image: &str) -> Result<Vec<String>> {
        let mut data = self.load(folder)?;
        Ok(data.images.remove(image).map(|info| info.tags).unwrap_or_default())
    }

    /// Add a tag; returns `false` if the image already had it
    pub fn add_tag(&self, folder: &Path, image: &str, tag: &str) -> Result<bool> {
        let tag = validate_tag(tag)?;
        let _guard = self.write_lock.lock();

        let mut data = self.load(folder)?;
        let info = entry_for(folder, image, &mut data)?;

        if info.tags.iter().any(|t| t == tag) {
            return Ok(false);
        }
        info.tags.push(tag.to_string());

        self.save(folder, &data)?;
        Ok(true)
    }

    /// Remove a tag; the image entry is dropped once its last tag is gone
    pub fn remove_tag(&self, folder: &Path, image: &str, tag: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();

        let mut data = self.load(folder)?;
        let Some(info) = data.images.get_mut(image) else {
            return Ok(false);
        };

        let before = info.tags.len();
        info.tags.retain(|t| t != tag);
        if info.tags.len() == before {
            return Ok(false);
        }
        if info.tags.is_empty() {
            data.images.remove(image);
        }

        self.save(folder, &data)?;
        Ok(true)
    }

    /// Replace all tags of an image
    pub fn set_tags(&self, folder: &Path, image: &str, tags: &[String]) -> Result<()> {
        let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag = validate_tag(tag)?;
            if !cleaned.iter().any(|t| t == tag) {
                cleaned.push(tag.to_string());
            }
        }

        let _guard = self.write_lock.lock();
        let mut data = self.load(folder)?;

        if cleaned.is_empty() {
            data.images.remove(image);
        } else {
            entry_for(folder, image, &mut data)?.tags = cleaned;
        }

        self.save(folder, &data)
    }
}

fn validate_tag(tag: &str) -> Result<&str> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidTag(tag.to_string()));
    }
    Ok(trimmed)
}

/// Get the entry for `image`, following a rename or creating it
fn entry_for<'a>(folder: &Path, image: &str, data: &'a mut TagsData) -> Result<&'a mut ImageTagInfo> {
    if !data.images.contains_key(image) {
        let hash = content_hash(&folder.join(image))?;

        let info = match data.find_by_hash(&hash) {
            Some(old_name) => {
                tracing::info!("Tag entry follows rename: {} -> {}", old_name, image);
                data.images.remove(&old_name).unwrap_or_default()
            }
            None => ImageTagInfo {
                hash,
                tags: Vec::new(),
            },
        };
        data.images.insert(image.to_string(), info);
    }

    data.images
        .get_mut(image)
        .ok_or_else(|| StoreError::InvalidTag(image.to_string()))
}

fn content_hash(path: &Path) -> Result<String> {
    let data = fs::read(path).map_err(io_err(path))?;
    Ok(format!("{:016x}", xxh3_64(&data)))
}
