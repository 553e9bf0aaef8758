//! MemeFolder Core Domain Logic
//!
//! This crate contains:
//! - Path navigation
//! - Bounded-concurrency asset cache
//! - Tag index and filter engine
//! - Viewport-gated preview loading
//! - Browser orchestration and viewer cursor
//! - Collaborator ports and the local host
//! - Configuration
//! - Error types

pub mod asset_cache;
pub mod browser;
pub mod config;
pub mod error;
pub mod filter;
pub mod host;
pub mod model;
pub mod navigation;
pub mod path;
pub mod ports;
pub mod tags;
pub mod thumbnail;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use asset_cache::{AssetCache, AssetFuture, CacheStats};
pub use browser::{BrowserController, BrowserEvent, NavigationOutcome};
pub use config::{AppConfig, CacheConfig, LoggingConfig, UiState, UiStatePatch, ViewerConfig};
pub use error::{AppError, ErrorKind};
pub use filter::{filtered_assets, FilterMode, FilterState, TagSet};
pub use host::LocalHost;
pub use model::{AssetPayload, Entry, EntryKind};
pub use navigation::NavigationCursor;
pub use path::{PathResolver, PathStyle};
pub use ports::{AssetFetcher, DirectoryLister, FavoritesStore, Host, TagOp, TagStore, UiStateStore};
pub use tags::{PendingTags, TagChip, TagIndex, TagLoad};
pub use thumbnail::StillEncoder;
pub use visibility::{
    Preview, SlotEvent, SlotId, SlotState, VideoMetadata, VideoSurface, ViewportSink, VisibilityController,
};
