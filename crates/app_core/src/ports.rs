//! Collaborator contracts consumed by the core
//!
//! Hosts implement these over their own storage; see [`crate::host::LocalHost`]
//! for the file-system backed implementation.

use crate::config::{UiState, UiStatePatch};
use crate::error::AppError;
use crate::model::{AssetPayload, Entry};
use app_store::Favorite;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Tag mutation sent to the tag store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOp {
    Add,
    Remove,
}

#[async_trait]
pub trait DirectoryLister: Send + Sync {
    /// Ordered children of `path`; fails with `Io`/`NotFound`
    async fn list_directory(&self, path: &str) -> Result<Vec<Entry>, AppError>;
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch_asset_bytes(&self, path: &str) -> Result<AssetPayload, AppError>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    /// Asset name -> tags for every tagged asset in `folder`
    async fn load_tags(&self, folder: &str) -> Result<HashMap<String, Vec<String>>, AppError>;

    async fn persist_tag_change(&self, folder: &str, asset: &str, tag: &str, op: TagOp) -> Result<(), AppError>;
}

#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn load_favorites(&self) -> Result<Vec<Favorite>, AppError>;
    async fn save_favorite(&self, path: &str) -> Result<(), AppError>;
    async fn remove_favorite(&self, path: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait UiStateStore: Send + Sync {
    async fn load_ui_state(&self) -> Result<UiState, AppError>;

    /// Merge `patch` into the stored state and return the result
    async fn save_ui_state(&self, patch: UiStatePatch) -> Result<UiState, AppError>;
}

/// One implementation of every collaborator
#[derive(Clone)]
pub struct Host {
    pub lister: Arc<dyn DirectoryLister>,
    pub fetcher: Arc<dyn AssetFetcher>,
    pub tags: Arc<dyn TagStore>,
    pub favorites: Arc<dyn FavoritesStore>,
    pub ui: Arc<dyn UiStateStore>,
}

impl Host {
    /// Bundle a single value implementing every port
    pub fn from_shared<T>(host: Arc<T>) -> Self
    where
        T: DirectoryLister + AssetFetcher + TagStore + FavoritesStore + UiStateStore + 'static,
    {
        Self {
            lister: host.clone(),
            fetcher: host.clone(),
            tags: host.clone(),
            favorites: host.clone(),
            ui: host,
        }
    }
}
