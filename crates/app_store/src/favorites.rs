//! Favorite folders, persisted as JSON in the home directory

use crate::{io_err, Result, StoreError};
use chrono::{DateTime, Utc};
use directories::UserDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const FAVORITES_FILE_NAME: &str = "meme-folder-config.json";

/// A favorited folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub path: String,
    pub name: String,
    pub added_at: DateTime<Utc>,
}

impl Favorite {
    /// Create a favorite named after the last segment of `path`
    pub fn new(path: &str, added_at: DateTime<Utc>) -> Self {
        let name = path
            .trim_end_matches(['\\', '/'])
            .rsplit(['\\', '/'])
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or(path)
            .to_string();

        Self {
            path: path.to_string(),
            name,
            added_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FavoritesConfig {
    #[serde(default)]
    favorites: Vec<Favorite>,
}

/// Favorites file operations
pub struct FavoritesFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FavoritesFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Favorites file in the user's home directory
    pub fn in_home() -> Result<Self> {
        let home = UserDirs::new().ok_or(StoreError::NoHomeDir)?;
        Ok(Self::new(home.home_dir().join(FAVORITES_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config; a missing file is empty, an empty or corrupt file is reset
    fn load(&self) -> Result<FavoritesConfig> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FavoritesConfig::default()),
            Err(e) => return Err(io_err(&self.path)(e)),
        };

        match serde_json::from_slice::<FavoritesConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Resetting unreadable favorites file {:?}: {}", self.path, e);
                let config = FavoritesConfig::default();
                if let Err(e) = self.save(&config) {
                    tracing::warn!("Failed to reset favorites file: {}", e);
                }
                Ok(config)
            }
        }
    }

    fn save(&self, config: &FavoritesConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let json = serde_json::to_vec_pretty(config).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_err(&self.path))
    }

    pub fn list(&self) -> Result<Vec<Favorite>> {
        Ok(self.load()?.favorites)
    }

    pub fn contains(&self, path: &str) -> Result<bool> {
        Ok(self.load()?.favorites.iter().any(|f| f.path == path))
    }

    /// Add a favorite; returns `false` if it was already present
    pub fn add(&self, path: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let mut config = self.load()?;

        if config.favorites.iter().any(|f| f.path == path) {
            return Ok(false);
        }
        config.favorites.push(Favorite::new(path, Utc::now()));

        self.save(&config)?;
        tracing::info!("Added favorite: {}", path);
        Ok(true)
    }

    /// Remove a favorite; returns `false` if it was not present
    pub fn remove(&self, path: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let mut config = self.load()?;

        let before = config.favorites.len();
        config.favorites.retain(|f| f.path != path);
        if config.favorites.len() == before {
            return Ok(false);
        }

        self.save(&config)?;
        tracing::info!("Removed favorite: {}", path);
        Ok(true)
    }
}
