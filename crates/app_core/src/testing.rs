//! In-memory collaborators for tests

use crate::config::{UiState, UiStatePatch};
use crate::error::AppError;
use crate::model::{AssetPayload, Entry};
use crate::ports::{AssetFetcher, DirectoryLister, FavoritesStore, Host, TagOp, TagStore, UiStateStore};
use crate::visibility::{SlotId, VideoMetadata, VideoSurface};
use app_store::Favorite;
use async_trait::async_trait;
use chrono::Utc;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type PersistRecord = (String, String, String, TagOp);

/// Fake host implementing every port, with failure and latency injection
#[derive(Default)]
pub struct FakeHost {
    folders: Mutex<HashMap<String, Vec<Entry>>>,
    assets: Mutex<HashMap<String, AssetPayload>>,
    tags: Mutex<HashMap<String, HashMap<String, Vec<String>>>>,
    favorites: Mutex<Vec<Favorite>>,
    ui: Mutex<UiState>,
    failing: Mutex<HashSet<String>>,
    fail_persist: AtomicBool,
    delays: Mutex<HashMap<String, Duration>>,
    fetch_delay: Mutex<Duration>,
    fetch_log: Mutex<Vec<String>>,
    list_log: Mutex<Vec<String>>,
    persist_log: Mutex<Vec<PersistRecord>>,
    active_fetches: AtomicUsize,
    max_active_fetches: AtomicUsize,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(self: &Arc<Self>) -> Host {
        Host::from_shared(Arc::clone(self))
    }

    pub fn add_folder(&self, path: &str, entries: Vec<Entry>) {
        self.folders.lock().insert(path.to_string(), entries);
    }

    pub fn add_asset(&self, path: &str, payload: AssetPayload) {
        self.assets.lock().insert(path.to_string(), payload);
    }

    pub fn remove_asset(&self, path: &str) {
        self.assets.lock().remove(path);
    }

    pub fn add_tags(&self, folder: &str, tags: &[(&str, &[&str])]) {
        let mut all = self.tags.lock();
        let folder_tags = all.entry(folder.to_string()).or_default();
        for (asset, asset_tags) in tags {
            folder_tags.insert(asset.to_string(), asset_tags.iter().map(|t| t.to_string()).collect());
        }
    }

    pub fn set_ui_state(&self, state: UiState) {
        *self.ui.lock() = state;
    }

    /// Make every operation on `path` fail with an I/O error
    pub fn fail(&self, path: &str) {
        self.failing.lock().insert(path.to_string());
    }

    pub fn heal(&self, path: &str) {
        self.failing.lock().remove(path);
    }

    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    /// Latency of listing and tag loads for `path`
    pub fn set_delay(&self, path: &str, delay: Duration) {
        self.delays.lock().insert(path.to_string(), delay);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = delay;
    }

    pub fn fetch_log(&self) -> Vec<String> {
        self.fetch_log.lock().clone()
    }

    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetch_log.lock().iter().filter(|p| *p == path).count()
    }

    pub fn list_log(&self) -> Vec<String> {
        self.list_log.lock().clone()
    }

    /// Successful tag persists, in order
    pub fn persist_log(&self) -> Vec<PersistRecord> {
        self.persist_log.lock().clone()
    }

    pub fn max_active_fetches(&self) -> usize {
        self.max_active_fetches.load(Ordering::SeqCst)
    }

    pub fn ui_state(&self) -> UiState {
        self.ui.lock().clone()
    }

    pub fn favorite_paths(&self) -> Vec<String> {
        self.favorites.lock().iter().map(|f| f.path.clone()).collect()
    }

    fn check(&self, path: &str) -> Result<(), AppError> {
        if self.failing.lock().contains(path) {
            return Err(AppError::io(path, "injected failure"));
        }
        Ok(())
    }

    async fn wait_for(&self, path: &str) {
        let delay = self.delays.lock().get(path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DirectoryLister for FakeHost {
    async fn list_directory(&self, path: &str) -> Result<Vec<Entry>, AppError> {
        self.list_log.lock().push(path.to_string());
        self.wait_for(path).await;
        self.check(path)?;
        self.folders
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::io(path, "no such folder"))
    }
}

#[async_trait]
impl AssetFetcher for FakeHost {
    async fn fetch_asset_bytes(&self, path: &str) -> Result<AssetPayload, AppError> {
        self.fetch_log.lock().push(path.to_string());
        let active = self.active_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_fetches.fetch_max(active, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.active_fetches.fetch_sub(1, Ordering::SeqCst);

        self.check(path)?;
        self.assets
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::NotFound(path.to_string()))
    }
}

#[async_trait]
impl TagStore for FakeHost {
    async fn load_tags(&self, folder: &str) -> Result<HashMap<String, Vec<String>>, AppError> {
        // Snapshot before the latency; writes landing meanwhile are not seen
        let snapshot = self.tags.lock().get(folder).cloned().unwrap_or_default();
        self.wait_for(folder).await;
        self.check(folder)?;
        Ok(snapshot)
    }

    async fn persist_tag_change(&self, folder: &str, asset: &str, tag: &str, op: TagOp) -> Result<(), AppError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(AppError::io(folder, "disk full"));
        }

        {
            let mut all = self.tags.lock();
            let tags = all.entry(folder.to_string()).or_default().entry(asset.to_string()).or_default();
            match op {
                TagOp::Add => tags.push(tag.to_string()),
                TagOp::Remove => tags.retain(|t| t != tag),
            }
        }
        self.persist_log
            .lock()
            .push((folder.to_string(), asset.to_string(), tag.to_string(), op));
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for FakeHost {
    async fn load_favorites(&self) -> Result<Vec<Favorite>, AppError> {
        Ok(self.favorites.lock().clone())
    }

    async fn save_favorite(&self, path: &str) -> Result<(), AppError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(AppError::persist("favorites", "disk full"));
        }
        let mut favorites = self.favorites.lock();
        if !favorites.iter().any(|f| f.path == path) {
            favorites.push(Favorite::new(path, Utc::now()));
        }
        Ok(())
    }

    async fn remove_favorite(&self, path: &str) -> Result<(), AppError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(AppError::persist("favorites", "disk full"));
        }
        self.favorites.lock().retain(|f| f.path != path);
        Ok(())
    }
}

#[async_trait]
impl UiStateStore for FakeHost {
    async fn load_ui_state(&self) -> Result<UiState, AppError> {
        Ok(self.ui.lock().clone())
    }

    async fn save_ui_state(&self, patch: UiStatePatch) -> Result<UiState, AppError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(AppError::persist("settings", "disk full"));
        }
        let mut ui = self.ui.lock();
        ui.apply(patch);
        Ok(ui.clone())
    }
}

/// Video surface producing solid frames of a fixed size; `None` fails metadata loads
pub struct FakeSurface {
    frame_size: Option<(u32, u32)>,
    metadata_delay: Mutex<Duration>,
    detached: Mutex<Vec<SlotId>>,
    metadata_loaded: Mutex<Option<Instant>>,
    frame_captured: Mutex<Option<Instant>>,
}

impl FakeSurface {
    pub fn new(frame_size: Option<(u32, u32)>) -> Self {
        Self {
            frame_size,
            metadata_delay: Mutex::new(Duration::ZERO),
            detached: Mutex::new(Vec::new()),
            metadata_loaded: Mutex::new(None),
            frame_captured: Mutex::new(None),
        }
    }

    pub fn set_metadata_delay(&self, delay: Duration) {
        *self.metadata_delay.lock() = delay;
    }

    pub fn detached(&self) -> Vec<SlotId> {
        self.detached.lock().clone()
    }

    /// Time from the last metadata load returning to the last frame capture
    pub fn capture_lag(&self) -> Option<Duration> {
        let loaded = (*self.metadata_loaded.lock())?;
        let captured = (*self.frame_captured.lock())?;
        captured.checked_duration_since(loaded)
    }
}

#[async_trait]
impl VideoSurface for FakeSurface {
    async fn load_metadata(&self, _slot: SlotId, _source: &AssetPayload) -> Result<VideoMetadata, AppError> {
        let delay = *self.metadata_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let (width, height) = self
            .frame_size
            .ok_or_else(|| AppError::Decode("unsupported codec".to_string()))?;
        *self.metadata_loaded.lock() = Some(Instant::now());
        Ok(VideoMetadata { width, height })
    }

    async fn capture_frame(&self, _slot: SlotId) -> Result<RgbaImage, AppError> {
        *self.frame_captured.lock() = Some(Instant::now());
        let (width, height) = self
            .frame_size
            .ok_or_else(|| AppError::Decode("no frame".to_string()))?;
        Ok(RgbaImage::from_pixel(width, height, Rgba([40, 120, 200, 255])))
    }

    fn detach(&self, slot: SlotId) {
        self.detached.lock().push(slot);
    }
}
