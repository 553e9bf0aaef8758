//! File-system backed collaborators
//!
//! Blocking I/O runs on the tokio blocking pool so the control thread never waits on disk.

use crate::config::{AppConfig, UiState, UiStatePatch};
use crate::error::AppError;
use crate::model::{AssetPayload, Entry};
use crate::ports::{AssetFetcher, DirectoryLister, FavoritesStore, TagOp, TagStore, UiStateStore};
use app_fs::MediaLimits;
use app_store::{Favorite, FavoritesFile, TagFile};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Local disk implementation of every port
pub struct LocalHost {
    limits: MediaLimits,
    tags: Arc<TagFile>,
    favorites: Arc<FavoritesFile>,
    config_path: PathBuf,
    config_lock: Arc<Mutex<()>>,
}

impl LocalHost {
    pub fn new(limits: MediaLimits, favorites: FavoritesFile, config_path: PathBuf) -> Self {
        Self {
            limits: limits.clamped(),
            tags: Arc::new(TagFile::new()),
            favorites: Arc::new(favorites),
            config_path,
            config_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Host using the favorites file in the home directory
    pub fn from_config(config: &AppConfig, config_path: PathBuf) -> Result<Self, AppError> {
        let favorites = FavoritesFile::in_home()?;
        Ok(Self::new(config.limits, favorites, config_path))
    }

    pub fn limits(&self) -> MediaLimits {
        self.limits
    }
}

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::io("<blocking task>", e))?
}

#[async_trait]
impl DirectoryLister for LocalHost {
    async fn list_directory(&self, path: &str) -> Result<Vec<Entry>, AppError> {
        let path = PathBuf::from(path);
        let limits = self.limits;
        blocking(move || {
            let entries = app_fs::list_directory(&path, &limits).map_err(|e| match AppError::from(e) {
                // A folder that is gone is a listing failure, not a vanished asset
                AppError::NotFound(p) => AppError::io(p, "folder not found"),
                other => other,
            })?;
            Ok(entries.into_iter().map(Entry::from).collect())
        })
        .await
    }
}

#[async_trait]
impl AssetFetcher for LocalHost {
    async fn fetch_asset_bytes(&self, path: &str) -> Result<AssetPayload, AppError> {
        let path = PathBuf::from(path);
        let limits = self.limits;
        blocking(move || {
            let (data, mime) = app_fs::read_asset(&path, &limits)?;
            Ok(AssetPayload::new(mime, data))
        })
        .await
    }
}

#[async_trait]
impl TagStore for LocalHost {
    async fn load_tags(&self, folder: &str) -> Result<HashMap<String, Vec<String>>, AppError> {
        let folder = PathBuf::from(folder);
        let tags = Arc::clone(&self.tags);
        blocking(move || Ok(tags.all_tags(&folder)?.into_iter().collect())).await
    }

    async fn persist_tag_change(&self, folder: &str, asset: &str, tag: &str, op: TagOp) -> Result<(), AppError> {
        let folder = PathBuf::from(folder);
        let asset = asset.to_string();
        let tag = tag.to_string();
        let tags = Arc::clone(&self.tags);
        blocking(move || {
            let changed = match op {
                TagOp::Add => tags.add_tag(&folder, &asset, &tag),
                TagOp::Remove => tags.remove_tag(&folder, &asset, &tag),
            }
            .map_err(|e| AppError::persist(format!("tags of {}", asset), e))?;

            if !changed {
                tracing::debug!("Tag change was a no-op: {:?} {} on {}", op, tag, asset);
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl FavoritesStore for LocalHost {
    async fn load_favorites(&self) -> Result<Vec<Favorite>, AppError> {
        let favorites = Arc::clone(&self.favorites);
        blocking(move || Ok(favorites.list()?)).await
    }

    async fn save_favorite(&self, path: &str) -> Result<(), AppError> {
        let favorites = Arc::clone(&self.favorites);
        let path = path.to_string();
        blocking(move || {
            favorites
                .add(&path)
                .map(|_| ())
                .map_err(|e| AppError::persist("favorites", e))
        })
        .await
    }

    async fn remove_favorite(&self, path: &str) -> Result<(), AppError> {
        let favorites = Arc::clone(&self.favorites);
        let path = path.to_string();
        blocking(move || {
            favorites
                .remove(&path)
                .map(|_| ())
                .map_err(|e| AppError::persist("favorites", e))
        })
        .await
    }
}

#[async_trait]
impl UiStateStore for LocalHost {
    async fn load_ui_state(&self) -> Result<UiState, AppError> {
        let path = self.config_path.clone();
        blocking(move || {
            AppConfig::load_from(&path)
                .map(|config| config.ui)
                .map_err(|e| AppError::Config(format!("{:#}", e)))
        })
        .await
    }

    async fn save_ui_state(&self, patch: UiStatePatch) -> Result<UiState, AppError> {
        let path = self.config_path.clone();
        let lock = Arc::clone(&self.config_lock);
        blocking(move || {
            let _guard = lock.lock();
            let mut config = AppConfig::load_from(&path).map_err(|e| AppError::persist("settings", format!("{:#}", e)))?;
            config.ui.apply(patch);
            config
                .save_to(&path)
                .map_err(|e| AppError::persist("settings", format!("{:#}", e)))?;
            Ok(config.ui)
        })
        .await
    }
}
