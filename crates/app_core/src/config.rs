//! Application configuration

use app_fs::MediaLimits;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ui: UiState,
    pub limits: MediaLimits,
    pub cache: CacheConfig,
    pub viewer: ViewerConfig,
    pub logging: LoggingConfig,
}

/// Persisted UI state, injected into the browser as a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
    pub last_path: String,
    pub folders_collapsed: bool,
    pub show_tags: bool,
    pub show_only_untagged: bool,
    pub sidebar_open: bool,
    pub hide_inactive_tags: bool,
    /// Intersect (all selected tags) when true, union (any) when false
    pub tag_filter_intersect: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            last_path: String::new(),
            folders_collapsed: false,
            show_tags: true,
            show_only_untagged: false,
            sidebar_open: true,
            hide_inactive_tags: false,
            tag_filter_intersect: true,
        }
    }
}

/// Partial update of [`UiState`]; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiStatePatch {
    pub last_path: Option<String>,
    pub folders_collapsed: Option<bool>,
    pub show_tags: Option<bool>,
    pub show_only_untagged: Option<bool>,
    pub sidebar_open: Option<bool>,
    pub hide_inactive_tags: Option<bool>,
    pub tag_filter_intersect: Option<bool>,
}

impl UiStatePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl UiState {
    pub fn apply(&mut self, patch: UiStatePatch) {
        if let Some(v) = patch.last_path {
            self.last_path = v;
        }
        if let Some(v) = patch.folders_collapsed {
            self.folders_collapsed = v;
        }
        if let Some(v) = patch.show_tags {
            self.show_tags = v;
        }
        if let Some(v) = patch.show_only_untagged {
            self.show_only_untagged = v;
        }
        if let Some(v) = patch.sidebar_open {
            self.sidebar_open = v;
        }
        if let Some(v) = patch.hide_inactive_tags {
            self.hide_inactive_tags = v;
        }
        if let Some(v) = patch.tag_filter_intersect {
            self.tag_filter_intersect = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Admission ceiling for concurrent asset fetches
    pub max_concurrent: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_concurrent: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Longest edge of captured video stills, in pixels
    pub thumbnail_max_edge: u32,
    /// JPEG quality of captured stills (1-100)
    pub jpeg_quality: u8,
    /// Wait after video metadata loads before capturing a frame
    pub settle_delay_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            thumbnail_max_edge: 200,
            jpeg_quality: 50,
            settle_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub retain_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            retain_days: 7,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, using defaults when the file is missing
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", path);
            Ok(config.normalized())
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "MemeFolder", "MemeFolder")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// Clamp values into their supported ranges
    pub fn normalized(mut self) -> Self {
        self.limits = self.limits.clamped();
        self.cache.max_concurrent = self.cache.max_concurrent.max(1);
        self.viewer.thumbnail_max_edge = self.viewer.thumbnail_max_edge.max(1);
        self.viewer.jpeg_quality = self.viewer.jpeg_quality.clamp(1, 100);
        self
    }
}
