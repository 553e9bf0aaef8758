//! Folder browser orchestration
//!
//! Owns the active folder, its listing, the tag index, the filter and the
//! viewer cursor. Results of superseded navigations are dropped.

use crate::asset_cache::AssetCache;
use crate::config::{UiState, UiStatePatch};
use crate::error::AppError;
use crate::filter::{FilterMode, FilterState};
use crate::model::Entry;
use crate::navigation::NavigationCursor;
use crate::path::PathResolver;
use crate::ports::Host;
use crate::tags::{TagIndex, TagLoad};
use app_store::Favorite;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    FolderLoaded { path: String, entries: usize },
    /// Listing failed; the view falls back to empty
    FolderFailed { path: String, error: AppError },
    /// Filtered view changed (filter, tags or listing)
    ViewChanged { visible: usize },
    TagsChanged { asset: String },
    FavoritesChanged,
    /// Non-blocking failure, e.g. a persist error; local state was kept
    Error(AppError),
}

/// Result of a navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Loaded,
    Failed(AppError),
    /// A newer navigation started before this one finished
    Superseded,
    /// Nothing to do, e.g. going up from a volume root
    Unchanged,
}

#[derive(Default)]
struct BrowserState {
    path: String,
    entries: Vec<Entry>,
    filter: FilterState,
    cursor: NavigationCursor,
    generation: u64,
    favorites: Vec<Favorite>,
    error: Option<AppError>,
}

pub struct BrowserController {
    resolver: PathResolver,
    host: Host,
    tags: TagIndex,
    cache: AssetCache,
    ui: Mutex<UiState>,
    state: Mutex<BrowserState>,
    events: mpsc::UnboundedSender<BrowserEvent>,
}

impl BrowserController {
    /// Create a browser over `host`; `ui` is the persisted UI snapshot
    pub fn new(
        host: Host,
        cache: AssetCache,
        resolver: PathResolver,
        ui: UiState,
    ) -> (Self, mpsc::UnboundedReceiver<BrowserEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = BrowserState {
            filter: FilterState::from_ui(&ui),
            ..Default::default()
        };
        let browser = Self {
            resolver,
            tags: TagIndex::new(host.tags.clone()),
            host,
            cache,
            ui: Mutex::new(ui),
            state: Mutex::new(state),
            events: tx,
        };
        (browser, rx)
    }

    fn emit(&self, event: BrowserEvent) {
        let _ = self.events.send(event);
    }

    fn surface(&self, error: &AppError) {
        tracing::warn!("{}", error);
        self.emit(BrowserEvent::Error(error.clone()));
    }

    /// Folder to open on startup, if one was persisted
    pub fn initial_path(&self) -> Option<String> {
        let ui = self.ui.lock();
        (!ui.last_path.trim().is_empty()).then(|| ui.last_path.clone())
    }

    // --- Navigation ---

    /// Load `path`, replacing the listing and tag index wholesale
    ///
    /// The folder only becomes current once its listing succeeds. A failed
    /// listing keeps the previous folder and its tags, with an empty view.
    pub async fn navigate_to(&self, path: &str) -> NavigationOutcome {
        let path = path.trim().to_string();

        let (generation, previous) = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.error = None;
            state.filter.selected_tags.clear();
            (state.generation, state.path.clone())
        };
        tracing::info!("Navigating to {}", path);

        if !previous.is_empty() {
            self.cache.invalidate(&self.resolver.folder_prefix(&previous));
        }
        self.cache.invalidate(&self.resolver.folder_prefix(&path));

        let (listing, pending_tags) =
            tokio::join!(self.host.lister.list_directory(&path), self.tags.fetch_folder(&path));

        let (outcome, tag_load) = {
            let mut state = self.state.lock();
            if state.generation != generation {
                tracing::warn!("Dropping superseded listing of {}", path);
                self.tags.discard(pending_tags);
                return NavigationOutcome::Superseded;
            }

            match listing {
                Ok(entries) => {
                    state.path = path.clone();
                    state.entries = entries;
                    self.emit(BrowserEvent::FolderLoaded {
                        path: path.clone(),
                        entries: state.entries.len(),
                    });
                    (NavigationOutcome::Loaded, Some(self.tags.commit(pending_tags)))
                }
                Err(error) => {
                    tracing::warn!("Failed to list {}: {}", path, error);
                    self.tags.discard(pending_tags);
                    state.entries.clear();
                    state.error = Some(error.clone());
                    self.emit(BrowserEvent::FolderFailed {
                        path: path.clone(),
                        error: error.clone(),
                    });
                    (NavigationOutcome::Failed(error), None)
                }
            }
        };

        match tag_load {
            Some(Ok(TagLoad::Applied(count))) => tracing::debug!("{} tagged assets in {}", count, path),
            Some(Err(error)) => self.surface(&error),
            Some(Ok(TagLoad::Stale)) | None => {}
        }
        self.refresh_view();

        if outcome == NavigationOutcome::Loaded {
            // Failures are already surfaced as events
            let _ = self
                .persist_ui(UiStatePatch {
                    last_path: Some(path),
                    ..Default::default()
                })
                .await;
        }
        outcome
    }

    /// Go up one level; volume roots stay put
    pub async fn open_parent(&self) -> NavigationOutcome {
        let current = self.current_path();
        let parent = self.resolver.parent_of(&current);
        if parent == current {
            return NavigationOutcome::Unchanged;
        }
        self.navigate_to(&parent).await
    }

    pub async fn enter_folder(&self, name: &str) -> NavigationOutcome {
        let target = self.resolver.child_of(&self.current_path(), name);
        self.navigate_to(&target).await
    }

    /// Reload the current folder
    pub async fn refresh(&self) -> NavigationOutcome {
        let current = self.current_path();
        if current.is_empty() {
            return NavigationOutcome::Unchanged;
        }
        self.navigate_to(&current).await
    }

    /// React to an outside change of `changed` (a file or folder path)
    ///
    /// Cached payloads under it are evicted; the listing is reloaded when it
    /// lies in the current folder.
    pub async fn external_change(&self, changed: &str) -> NavigationOutcome {
        self.cache.invalidate(changed);

        let current = self.current_path();
        if current.is_empty() {
            return NavigationOutcome::Unchanged;
        }
        let inside = changed == current || changed.starts_with(&self.resolver.folder_prefix(&current));
        if !inside {
            return NavigationOutcome::Unchanged;
        }
        tracing::debug!("External change in {}: {}", current, changed);
        self.refresh().await
    }

    pub fn can_go_up(&self) -> bool {
        self.resolver.can_go_up(&self.current_path())
    }

    // --- Views ---

    pub fn current_path(&self) -> String {
        self.state.lock().path.clone()
    }

    pub fn resolver(&self) -> PathResolver {
        self.resolver
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Inline error of the last navigation
    pub fn last_error(&self) -> Option<AppError> {
        self.state.lock().error.clone()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.state.lock().entries.clone()
    }

    pub fn folders(&self) -> Vec<Entry> {
        self.state.lock().entries.iter().filter(|e| e.is_folder()).cloned().collect()
    }

    /// Every asset in the folder, unfiltered
    pub fn assets(&self) -> Vec<Entry> {
        self.state.lock().entries.iter().filter(|e| e.is_asset()).cloned().collect()
    }

    /// Assets passing the current filter, in listing order
    pub fn visible_assets(&self) -> Vec<Entry> {
        self.state.lock().cursor.items().to_vec()
    }

    /// Full path of a child of the current folder
    pub fn asset_path(&self, name: &str) -> String {
        self.resolver.child_of(&self.current_path(), name)
    }

    pub fn filter(&self) -> FilterState {
        self.state.lock().filter.clone()
    }

    pub fn ui_state(&self) -> UiState {
        self.ui.lock().clone()
    }

    fn refresh_view(&self) {
        let visible = {
            let mut state = self.state.lock();
            let assets: Vec<Entry> = state.entries.iter().filter(|e| e.is_asset()).cloned().collect();
            let filtered = self.tags.filtered_assets(&assets, &state.filter);
            state.cursor.recompute(filtered);
            state.cursor.items().len()
        };
        self.emit(BrowserEvent::ViewChanged { visible });
    }

    // --- Filter ---

    /// Toggle `tag` in the selection; returns whether it is now selected
    pub fn toggle_tag_filter(&self, tag: &str) -> bool {
        let selected = self.state.lock().filter.toggle_tag(tag);
        self.refresh_view();
        selected
    }

    pub fn clear_tag_filter(&self) {
        self.state.lock().filter.selected_tags.clear();
        self.refresh_view();
    }

    pub async fn set_untagged_only(&self, untagged_only: bool) -> Result<(), AppError> {
        self.state.lock().filter.untagged_only = untagged_only;
        self.refresh_view();
        self.persist_ui(UiStatePatch {
            show_only_untagged: Some(untagged_only),
            ..Default::default()
        })
        .await
    }

    pub async fn set_filter_mode(&self, mode: FilterMode) -> Result<(), AppError> {
        self.state.lock().filter.mode = mode;
        self.refresh_view();
        self.persist_ui(UiStatePatch {
            tag_filter_intersect: Some(mode.is_intersect()),
            ..Default::default()
        })
        .await
    }

    /// Persist a UI change; the local snapshot is updated even if saving fails
    pub async fn persist_ui(&self, patch: UiStatePatch) -> Result<(), AppError> {
        self.ui.lock().apply(patch.clone());
        match self.host.ui.save_ui_state(patch).await {
            Ok(saved) => {
                *self.ui.lock() = saved;
                Ok(())
            }
            Err(error) => {
                self.surface(&error);
                Err(error)
            }
        }
    }

    // --- Tags ---

    pub async fn add_tag(&self, asset: &str, tag: &str) -> Result<bool, AppError> {
        let result = self.tags.add_tag(asset, tag).await;
        self.after_tag_change(asset, &result);
        result
    }

    pub async fn remove_tag(&self, asset: &str, tag: &str) -> Result<bool, AppError> {
        let result = self.tags.remove_tag(asset, tag).await;
        self.after_tag_change(asset, &result);
        result
    }

    /// Add `tag` if the asset lacks it, remove it otherwise
    pub async fn toggle_asset_tag(&self, asset: &str, tag: &str) -> Result<bool, AppError> {
        let tag = tag.trim();
        if self.tags.tags_of(asset).contains(tag) {
            self.remove_tag(asset, tag).await
        } else {
            self.add_tag(asset, tag).await
        }
    }

    fn after_tag_change(&self, asset: &str, result: &Result<bool, AppError>) {
        // Local state changes even when persisting fails
        if matches!(result, Ok(true) | Err(AppError::Persist { .. })) {
            self.emit(BrowserEvent::TagsChanged {
                asset: asset.to_string(),
            });
            self.refresh_view();
        }
        if let Err(error) = result {
            self.surface(error);
        }
    }

    // --- Favorites ---

    pub async fn load_favorites(&self) -> Result<Vec<Favorite>, AppError> {
        let favorites = self.host.favorites.load_favorites().await?;
        self.state.lock().favorites = favorites.clone();
        Ok(favorites)
    }

    pub fn favorites(&self) -> Vec<Favorite> {
        self.state.lock().favorites.clone()
    }

    pub fn is_favorite(&self, path: &str) -> bool {
        self.state.lock().favorites.iter().any(|f| f.path == path)
    }

    /// Add or remove `path` from favorites; returns whether it is now a favorite
    pub async fn toggle_favorite(&self, path: &str) -> Result<bool, AppError> {
        let now_favorite = {
            let mut state = self.state.lock();
            if state.favorites.iter().any(|f| f.path == path) {
                state.favorites.retain(|f| f.path != path);
                false
            } else {
                state.favorites.push(Favorite::new(path, Utc::now()));
                true
            }
        };
        self.emit(BrowserEvent::FavoritesChanged);

        let result = if now_favorite {
            self.host.favorites.save_favorite(path).await
        } else {
            self.host.favorites.remove_favorite(path).await
        };
        match result {
            Ok(()) => Ok(now_favorite),
            Err(error) => {
                self.surface(&error);
                Err(error)
            }
        }
    }

    // --- Viewer cursor ---

    pub fn open_asset(&self, name: &str) -> Option<Entry> {
        let mut state = self.state.lock();
        if state.cursor.open(name) {
            state.cursor.current().cloned()
        } else {
            None
        }
    }

    pub fn current_asset(&self) -> Option<Entry> {
        self.state.lock().cursor.current().cloned()
    }

    pub fn next_asset(&self) -> Option<Entry> {
        let mut state = self.state.lock();
        state.cursor.next().then(|| state.cursor.current().cloned()).flatten()
    }

    pub fn previous_asset(&self) -> Option<Entry> {
        let mut state = self.state.lock();
        state.cursor.prev().then(|| state.cursor.current().cloned()).flatten()
    }

    pub fn close_viewer(&self) {
        self.state.lock().cursor.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{AssetPayload, EntryKind};
    use crate::path::PathStyle;
    use crate::ports::TagOp;
    use crate::testing::FakeHost;
    use std::sync::Arc;
    use std::time::Duration;

    fn entry(name: &str, kind: EntryKind) -> Entry {
        Entry::new(name, kind)
    }

    fn setup() -> (Arc<FakeHost>, BrowserController, mpsc::UnboundedReceiver<BrowserEvent>) {
        let host = Arc::new(FakeHost::new());
        host.add_folder(
            "/m",
            vec![
                entry("sub", EntryKind::Folder),
                entry("img1", EntryKind::Image),
                entry("img2", EntryKind::Image),
                entry("img3", EntryKind::Video),
            ],
        );
        host.add_folder("/m/sub", vec![entry("deep.png", EntryKind::Image)]);
        host.add_folder("/", vec![entry("m", EntryKind::Folder)]);
        host.add_tags("/m", &[("img1", &["a"]), ("img2", &["a", "b"])]);

        let cache = AssetCache::new(host.clone(), 3);
        let (browser, events) = BrowserController::new(
            host.host(),
            cache,
            PathResolver::new(PathStyle::Posix),
            UiState::default(),
        );
        (host, browser, events)
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<BrowserEvent>) -> Vec<BrowserEvent> {
        let mut all = Vec::new();
        while let Ok(event) = events.try_recv() {
            all.push(event);
        }
        all
    }

    #[tokio::test]
    async fn test_navigate_loads_folder() {
        let (host, browser, mut events) = setup();

        assert_eq!(browser.navigate_to("/m").await, NavigationOutcome::Loaded);
        assert_eq!(browser.current_path(), "/m");
        assert_eq!(names(&browser.folders()), vec!["sub"]);
        assert_eq!(names(&browser.visible_assets()), vec!["img1", "img2", "img3"]);
        assert_eq!(browser.tags().unique_tags(), vec!["a", "b"]);
        assert_eq!(browser.asset_path("img1"), "/m/img1");

        assert!(drain(&mut events).contains(&BrowserEvent::FolderLoaded {
            path: "/m".to_string(),
            entries: 4
        }));
        assert_eq!(host.ui_state().last_path, "/m");
    }

    #[tokio::test]
    async fn test_failed_listing_falls_back_to_empty() {
        let (host, browser, mut events) = setup();
        browser.navigate_to("/m").await;
        host.fail("/broken");

        let outcome = browser.navigate_to("/broken").await;
        assert!(matches!(outcome, NavigationOutcome::Failed(ref e) if e.kind() == ErrorKind::Io));
        assert!(browser.entries().is_empty());
        assert!(browser.visible_assets().is_empty());
        assert!(browser.last_error().is_some());
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, BrowserEvent::FolderFailed { path, .. } if path == "/broken")));
        assert_eq!(host.ui_state().last_path, "/m");

        // The previous folder stays current
        assert_eq!(browser.current_path(), "/m");
        assert_eq!(browser.asset_path("img1"), "/m/img1");
        assert_eq!(browser.tags().folder().as_deref(), Some("/m"));
        assert_eq!(browser.tags().unique_tags(), vec!["a", "b"]);
        assert!(browser.add_tag("img1", "z").await.unwrap());
        assert_eq!(host.persist_log()[0].0, "/m");

        assert_eq!(browser.refresh().await, NavigationOutcome::Loaded);
        assert_eq!(browser.current_path(), "/m");
        assert_eq!(names(&browser.visible_assets()), vec!["img1", "img2", "img3"]);
    }

    #[tokio::test]
    async fn test_failed_folder_opens_once_healed() {
        let (host, browser, _events) = setup();
        browser.navigate_to("/m").await;
        host.add_folder("/m/flaky", vec![entry("x.png", EntryKind::Image)]);
        host.add_tags("/m/flaky", &[("x.png", &["fresh"])]);
        host.fail("/m/flaky");

        assert!(matches!(browser.navigate_to("/m/flaky").await, NavigationOutcome::Failed(_)));
        assert_eq!(browser.current_path(), "/m");
        assert_eq!(browser.open_parent().await, NavigationOutcome::Loaded);
        assert_eq!(browser.current_path(), "/");

        host.heal("/m/flaky");
        assert_eq!(browser.navigate_to("/m/flaky").await, NavigationOutcome::Loaded);
        assert_eq!(browser.current_path(), "/m/flaky");
        assert_eq!(browser.tags().unique_tags(), vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_superseded_navigation_is_dropped() {
        let (host, browser, _events) = setup();
        host.add_folder("/slow", vec![entry("old.png", EntryKind::Image)]);
        host.set_delay("/slow", Duration::from_millis(40));

        let (slow, fast) = tokio::join!(browser.navigate_to("/slow"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            browser.navigate_to("/m").await
        });

        assert_eq!(slow, NavigationOutcome::Superseded);
        assert_eq!(fast, NavigationOutcome::Loaded);
        assert_eq!(browser.current_path(), "/m");
        assert_eq!(names(&browser.visible_assets()), vec!["img1", "img2", "img3"]);
        assert_eq!(browser.tags().unique_tags(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_parent_and_child_navigation() {
        let (_host, browser, _events) = setup();
        browser.navigate_to("/m").await;

        assert_eq!(browser.enter_folder("sub").await, NavigationOutcome::Loaded);
        assert_eq!(browser.current_path(), "/m/sub");
        assert!(browser.can_go_up());

        browser.open_parent().await;
        assert_eq!(browser.current_path(), "/m");
        browser.open_parent().await;
        assert_eq!(browser.current_path(), "/");
        assert!(!browser.can_go_up());
        assert_eq!(browser.open_parent().await, NavigationOutcome::Unchanged);
        assert_eq!(browser.current_path(), "/");
    }

    #[tokio::test]
    async fn test_filter_scenario() {
        let (host, browser, _events) = setup();
        browser.navigate_to("/m").await;

        browser.toggle_tag_filter("a");
        assert_eq!(names(&browser.visible_assets()), vec!["img1", "img2"]);

        browser.toggle_tag_filter("b");
        assert_eq!(names(&browser.visible_assets()), vec!["img2"]);

        browser.set_filter_mode(FilterMode::Union).await.unwrap();
        assert_eq!(names(&browser.visible_assets()), vec!["img1", "img2"]);
        assert!(!host.ui_state().tag_filter_intersect);

        browser.set_untagged_only(true).await.unwrap();
        assert_eq!(names(&browser.visible_assets()), vec!["img3"]);
        assert!(host.ui_state().show_only_untagged);
        assert!(browser.ui_state().show_only_untagged);

        // Navigation keeps the mode but drops the tag selection
        browser.set_untagged_only(false).await.unwrap();
        browser.refresh().await;
        assert!(browser.filter().selected_tags.is_empty());
        assert_eq!(browser.filter().mode, FilterMode::Union);
    }

    #[tokio::test]
    async fn test_ui_snapshot_seeds_filter() {
        let host = Arc::new(FakeHost::new());
        let ui = UiState {
            show_only_untagged: true,
            tag_filter_intersect: false,
            last_path: "/m".to_string(),
            ..Default::default()
        };
        let cache = AssetCache::new(host.clone(), 3);
        let (browser, _events) = BrowserController::new(host.host(), cache, PathResolver::new(PathStyle::Posix), ui);

        assert!(browser.filter().untagged_only);
        assert_eq!(browser.filter().mode, FilterMode::Union);
        assert_eq!(browser.initial_path().as_deref(), Some("/m"));
    }

    #[tokio::test]
    async fn test_tag_persist_failure_is_surfaced() {
        let (host, browser, mut events) = setup();
        browser.navigate_to("/m").await;
        drain(&mut events);
        host.set_fail_persist(true);

        let err = browser.add_tag("img3", "new").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persist);
        assert!(browser.tags().tags_of("img3").contains("new"));

        let events = drain(&mut events);
        assert!(events.contains(&BrowserEvent::TagsChanged {
            asset: "img3".to_string()
        }));
        assert!(events.iter().any(|e| matches!(e, BrowserEvent::Error(_))));
    }

    #[tokio::test]
    async fn test_toggle_padded_tag() {
        let (host, browser, _events) = setup();
        browser.navigate_to("/m").await;

        assert!(browser.toggle_asset_tag("img1", " cat ").await.unwrap());
        assert!(browser.tags().tags_of("img1").contains("cat"));

        assert!(browser.toggle_asset_tag("img1", " cat ").await.unwrap());
        assert!(!browser.tags().tags_of("img1").contains("cat"));
        assert!(!browser.toggle_asset_tag("img1", "   ").await.unwrap());

        let ops: Vec<_> = host.persist_log().into_iter().map(|(_, _, tag, op)| (tag, op)).collect();
        assert_eq!(ops, vec![("cat".to_string(), TagOp::Add), ("cat".to_string(), TagOp::Remove)]);
    }

    #[tokio::test]
    async fn test_ui_patch_keeps_other_settings() {
        let (host, browser, _events) = setup();
        host.set_ui_state(UiState {
            show_tags: false,
            sidebar_open: false,
            ..Default::default()
        });

        browser.set_filter_mode(FilterMode::Union).await.unwrap();
        let saved = host.ui_state();
        assert!(!saved.tag_filter_intersect);
        assert!(!saved.show_tags);
        assert!(!saved.sidebar_open);
        assert_eq!(browser.ui_state(), saved);
    }

    #[tokio::test]
    async fn test_tag_change_updates_filtered_view() {
        let (_host, browser, _events) = setup();
        browser.navigate_to("/m").await;
        browser.set_untagged_only(true).await.unwrap();
        assert_eq!(names(&browser.visible_assets()), vec!["img3"]);

        assert!(browser.toggle_asset_tag("img3", "c").await.unwrap());
        assert!(browser.visible_assets().is_empty());

        browser.toggle_asset_tag("img3", "c").await.unwrap();
        assert_eq!(names(&browser.visible_assets()), vec!["img3"]);
    }

    #[tokio::test]
    async fn test_navigation_invalidates_cache() {
        let (host, browser, _events) = setup();
        host.add_asset("/m/img1", AssetPayload::new("image/png", b"1".to_vec()));
        browser.navigate_to("/m").await;

        browser.cache().get("/m/img1").await.unwrap();
        assert!(browser.cache().contains("/m/img1"));

        browser.navigate_to("/m/sub").await;
        assert!(!browser.cache().contains("/m/img1"));
    }

    #[tokio::test]
    async fn test_external_change() {
        let (host, browser, _events) = setup();
        browser.navigate_to("/m").await;
        let listed = host.list_log().len();

        host.add_folder("/m", vec![entry("fresh.png", EntryKind::Image)]);
        assert_eq!(browser.external_change("/m/fresh.png").await, NavigationOutcome::Loaded);
        assert_eq!(names(&browser.visible_assets()), vec!["fresh.png"]);
        assert_eq!(host.list_log().len(), listed + 1);

        assert_eq!(browser.external_change("/other/x.png").await, NavigationOutcome::Unchanged);
        assert_eq!(host.list_log().len(), listed + 1);
    }

    #[tokio::test]
    async fn test_viewer_cursor() {
        let (_host, browser, _events) = setup();
        browser.navigate_to("/m").await;

        assert_eq!(browser.open_asset("img2").map(|e| e.name), Some("img2".to_string()));
        assert_eq!(browser.next_asset().map(|e| e.name), Some("img3".to_string()));
        assert!(browser.next_asset().is_none());
        assert_eq!(browser.previous_asset().map(|e| e.name), Some("img2".to_string()));

        // Narrowing the view past the cursor clears it
        browser.open_asset("img3");
        browser.toggle_tag_filter("b");
        assert!(browser.current_asset().is_none());

        browser.toggle_tag_filter("b");

        // Filtering out the open asset closes it instead of jumping to a neighbour
        browser.open_asset("img1");
        browser.toggle_tag_filter("b");
        assert_eq!(names(&browser.visible_assets()), vec!["img2"]);
        assert!(browser.current_asset().is_none());

        browser.toggle_tag_filter("b");
        browser.open_asset("img1");
        browser.close_viewer();
        assert!(browser.current_asset().is_none());
        assert!(browser.open_asset("sub").is_none());
    }

    #[tokio::test]
    async fn test_favorites_toggle() {
        let (host, browser, mut events) = setup();
        assert!(browser.load_favorites().await.unwrap().is_empty());

        assert!(browser.toggle_favorite("/m").await.unwrap());
        assert!(browser.is_favorite("/m"));
        assert_eq!(host.favorite_paths(), vec!["/m"]);

        host.set_fail_persist(true);
        assert!(browser.toggle_favorite("/m").await.is_err());
        assert!(!browser.is_favorite("/m"));
        assert!(drain(&mut events).iter().any(|e| matches!(e, BrowserEvent::Error(_))));
    }
}
