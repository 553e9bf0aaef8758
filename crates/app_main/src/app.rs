//! Command execution on top of the browser core

use crate::cli::{Commands, FavCommands, TagCommands};
use anyhow::{bail, Context, Result};
use app_core::{
    AppConfig, AppError, AssetCache, AssetPayload, BrowserController, BrowserEvent, Entry, Host, LocalHost,
    NavigationOutcome, PathResolver, Preview, SlotId, SlotState, UiState, VideoMetadata, VideoSurface,
    ViewportSink, VisibilityController,
};
use app_fs::FolderWatcher;
use async_trait::async_trait;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const WATCH_POLL: Duration = Duration::from_millis(250);
const PREVIEW_TIMEOUT: Duration = Duration::from_secs(60);

/// Video surface for terminals: no decoder, so every video renders as a placeholder
struct HeadlessSurface;

#[async_trait]
impl VideoSurface for HeadlessSurface {
    async fn load_metadata(&self, _slot: SlotId, source: &AssetPayload) -> Result<VideoMetadata, AppError> {
        Err(AppError::Decode(format!("no video decoder for {}", source.mime)))
    }

    async fn capture_frame(&self, _slot: SlotId) -> Result<RgbaImage, AppError> {
        Err(AppError::Decode("no video decoder".to_string()))
    }

    fn detach(&self, _slot: SlotId) {}
}

pub struct App {
    config: AppConfig,
    host: Arc<LocalHost>,
    cache: AssetCache,
    resolver: PathResolver,
}

impl App {
    pub fn new(config: AppConfig, config_path: PathBuf) -> Result<Self> {
        let host = LocalHost::from_config(&config, config_path).context("Failed to open favorites")?;
        Ok(Self::with_host(config, host))
    }

    pub fn with_host(config: AppConfig, host: LocalHost) -> Self {
        let host = Arc::new(host);
        let cache = AssetCache::new(host.clone(), config.cache.max_concurrent);
        Self {
            config,
            host,
            cache,
            resolver: PathResolver::default(),
        }
    }

    fn browser(&self, ui: UiState) -> (BrowserController, mpsc::UnboundedReceiver<BrowserEvent>) {
        BrowserController::new(Host::from_shared(self.host.clone()), self.cache.clone(), self.resolver, ui)
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        let lines = match command {
            Commands::Ls {
                path,
                tags,
                union,
                untagged,
            } => self.list(path, &tags, union, untagged).await?,
            Commands::Parent { path } => self.parent(&path),
            Commands::Tags { folder } => self.tags(&folder).await?,
            Commands::Tag { command } => self.tag(command).await?,
            Commands::Fav { command } => self.favorites(command).await?,
            Commands::Preview { folder } => self.preview(&folder).await?,
            Commands::Watch { folder } => return self.watch(&folder).await,
        };
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }

    /// Open `path` in a fresh browser, failing when the listing does
    async fn open(
        &self,
        path: &str,
        ui: UiState,
    ) -> Result<(BrowserController, mpsc::UnboundedReceiver<BrowserEvent>)> {
        let (browser, events) = self.browser(ui);
        match browser.navigate_to(path).await {
            NavigationOutcome::Failed(e) => bail!("{}", e.user_message()),
            outcome => tracing::debug!("Opened {}: {:?}", path, outcome),
        }
        Ok((browser, events))
    }

    async fn list(&self, path: Option<String>, tags: &[String], union: bool, untagged: bool) -> Result<Vec<String>> {
        // Flags apply to this listing only and are never persisted
        let ui = UiState {
            tag_filter_intersect: !union,
            show_only_untagged: untagged,
            ..self.config.ui.clone()
        };
        let path = match path {
            Some(path) => path,
            None => self.start_folder()?,
        };

        let (browser, mut events) = self.open(&path, ui).await?;
        for tag in tags {
            browser.toggle_tag_filter(tag);
        }

        let mut lines = vec![browser.current_path()];
        for folder in browser.folders() {
            lines.push(format!("  {}{}", folder.name, self.resolver.style().separator()));
        }
        let visible = browser.visible_assets();
        for asset in &visible {
            lines.push(asset_line(asset, &browser));
        }
        let hidden = browser.assets().len() - visible.len();
        if hidden > 0 {
            lines.push(format!("({} assets hidden by the tag filter)", hidden));
        }

        report_errors(&mut events);
        Ok(lines)
    }

    fn start_folder(&self) -> Result<String> {
        let last = self.config.ui.last_path.trim();
        if !last.is_empty() {
            return Ok(last.to_string());
        }
        let home = app_fs::home_dir().context("No folder given and no home directory found")?;
        Ok(home.display().to_string())
    }

    fn parent(&self, path: &str) -> Vec<String> {
        if self.resolver.can_go_up(path) {
            vec![self.resolver.parent_of(path)]
        } else {
            vec![format!("{} (root)", path)]
        }
    }

    async fn tags(&self, folder: &str) -> Result<Vec<String>> {
        let (browser, mut events) = self.open(folder, self.config.ui.clone()).await?;

        let unique = browser.tags().unique_tags();
        let mut lines = vec![format!("{} tags: {}", unique.len(), unique.join(", "))];
        for asset in browser.assets() {
            let tags = browser.tags().tags_of(&asset.name);
            if !tags.is_empty() {
                lines.push(format!("  {}: {}", asset.name, join_tags(&tags)));
            }
        }

        report_errors(&mut events);
        Ok(lines)
    }

    async fn tag(&self, command: TagCommands) -> Result<Vec<String>> {
        let (folder, asset, tag, add) = match command {
            TagCommands::Add { folder, asset, tag } => (folder, asset, tag, true),
            TagCommands::Rm { folder, asset, tag } => (folder, asset, tag, false),
        };
        let (browser, mut events) = self.open(&folder, self.config.ui.clone()).await?;
        if !browser.assets().iter().any(|a| a.name == asset) {
            bail!("{} is not an asset of {}", asset, folder);
        }

        let changed = if add {
            browser.add_tag(&asset, &tag).await
        } else {
            browser.remove_tag(&asset, &tag).await
        };
        let changed = changed.map_err(|e| anyhow::anyhow!(e.user_message()))?;

        let tags = browser.tags().tags_of(&asset);
        let status = if changed { "updated" } else { "unchanged" };
        report_errors(&mut events);
        Ok(vec![format!("{} ({}): {}", asset, status, join_tags(&tags))])
    }

    async fn favorites(&self, command: FavCommands) -> Result<Vec<String>> {
        let (browser, mut events) = self.browser(self.config.ui.clone());
        browser
            .load_favorites()
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

        let wanted = match &command {
            FavCommands::List => None,
            FavCommands::Add { path } => Some((path.as_str(), true)),
            FavCommands::Rm { path } => Some((path.as_str(), false)),
        };
        if let Some((path, favorite)) = wanted {
            if browser.is_favorite(path) != favorite {
                browser
                    .toggle_favorite(path)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            }
        }

        let lines = browser
            .favorites()
            .iter()
            .map(|f| {
                let added = f.added_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M");
                format!("{:<24} {}  ({})", f.name, f.path, added)
            })
            .collect();
        report_errors(&mut events);
        Ok(lines)
    }

    /// Scroll every asset of `folder` into view and wait for each preview to settle
    async fn preview(&self, folder: &str) -> Result<Vec<String>> {
        let (browser, mut browser_events) = self.open(folder, self.config.ui.clone()).await?;
        let (visibility, mut slot_events) =
            VisibilityController::new(self.cache.clone(), Arc::new(HeadlessSurface), &self.config.viewer);

        let assets = browser.visible_assets();
        let mut names = HashMap::new();
        for (index, asset) in assets.iter().enumerate() {
            let slot = index as SlotId;
            if visibility.register(slot, browser.asset_path(&asset.name), asset.kind) {
                names.insert(slot, asset.name.clone());
            }
        }
        for slot in names.keys() {
            visibility.on_enter_view(*slot);
        }

        let mut settled = HashMap::new();
        let wait = async {
            while settled.len() < names.len() {
                let Some(event) = slot_events.recv().await else {
                    break;
                };
                if matches!(event.state, SlotState::Ready(_) | SlotState::Failed(_)) {
                    settled.insert(event.slot, event.state);
                }
            }
        };
        if tokio::time::timeout(PREVIEW_TIMEOUT, wait).await.is_err() {
            tracing::warn!("Preview of {} timed out", folder);
        }

        let mut lines = Vec::new();
        for (index, asset) in assets.iter().enumerate() {
            let slot = index as SlotId;
            let state = settled
                .remove(&slot)
                .or_else(|| visibility.state(slot))
                .unwrap_or(SlotState::Offscreen);
            lines.push(format!("{:<32} {}", asset.name, describe_slot(&state)));
        }
        visibility.clear();

        let stats = self.cache.stats();
        tracing::debug!("Cache after preview: {:?}", stats);
        lines.push(format!(
            "{} fetched, {} failed, {} cache hits",
            stats.fetches, stats.failures, stats.hits
        ));

        report_errors(&mut browser_events);
        Ok(lines)
    }

    /// Relist `folder` whenever its children change, until Ctrl-C
    async fn watch(&self, folder: &str) -> Result<()> {
        let (browser, mut events) = self.open(folder, self.config.ui.clone()).await?;
        let mut watcher = FolderWatcher::new()?;
        watcher.watch(Path::new(&browser.current_path()))?;
        println!("Watching {} ({} entries)", browser.current_path(), browser.entries().len());

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    result.context("Failed to listen for Ctrl-C")?;
                    break;
                }
                _ = tokio::time::sleep(WATCH_POLL) => {}
            }

            for event in watcher.poll_events() {
                let changed = event.path().display().to_string();
                match browser.external_change(&changed).await {
                    NavigationOutcome::Loaded => {
                        println!("{:?} -> {} entries", event, browser.entries().len())
                    }
                    NavigationOutcome::Failed(e) => println!("{:?} -> {}", event, e.user_message()),
                    NavigationOutcome::Superseded | NavigationOutcome::Unchanged => {}
                }
            }
            report_errors(&mut events);
        }

        watcher.unwatch();
        Ok(())
    }
}

/// Print errors the browser surfaced without failing the command
fn report_errors(events: &mut mpsc::UnboundedReceiver<BrowserEvent>) {
    while let Ok(event) = events.try_recv() {
        if let BrowserEvent::Error(e) = event {
            eprintln!("warning: {}", e.user_message());
        }
    }
}

fn asset_line(asset: &Entry, browser: &BrowserController) -> String {
    let tags = browser.tags().tags_of(&asset.name);
    let mut line = format!("  {:<32} {:>9}", asset.name, format_size(asset.size_bytes));
    if !tags.is_empty() {
        line.push_str("  [");
        line.push_str(&join_tags(&tags));
        line.push(']');
    }
    line
}

fn join_tags(tags: &app_core::TagSet) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn describe_slot(state: &SlotState) -> String {
    match state {
        SlotState::Ready(Preview::Image(p)) => format!("image {} ({})", p.mime, format_size(p.len() as u64)),
        SlotState::Ready(Preview::VideoStill(p)) => format!("still {} ({})", p.mime, format_size(p.len() as u64)),
        SlotState::Failed(e) => format!("placeholder: {}", e.user_message()),
        other => other.name().to_string(),
    }
}

/// Format file size for display
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_fs::MediaLimits;
    use app_store::FavoritesFile;
    use std::fs;

    fn app_in(dir: &Path) -> App {
        let host = LocalHost::new(
            MediaLimits::default(),
            FavoritesFile::new(dir.join("favorites.json")),
            dir.join("config.toml"),
        );
        App::with_host(AppConfig::default(), host)
    }

    fn media_folder(dir: &Path) -> String {
        let media = dir.join("media");
        fs::create_dir_all(media.join("sub")).unwrap();
        fs::write(media.join("a.gif"), b"GIF89a").unwrap();
        fs::write(media.join("b.png"), b"png").unwrap();
        fs::write(media.join("clip.mp4"), b"mp4").unwrap();
        media.display().to_string()
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[tokio::test]
    async fn test_tag_then_filtered_list() {
        let dir = tempfile::tempdir().unwrap();
        let folder = media_folder(dir.path());
        let app = app_in(dir.path());

        let out = app
            .tag(TagCommands::Add {
                folder: folder.clone(),
                asset: "a.gif".into(),
                tag: "cat".into(),
            })
            .await
            .unwrap();
        assert_eq!(out, vec!["a.gif (updated): cat"]);

        let out = app.list(Some(folder.clone()), &["cat".to_string()], false, false).await.unwrap();
        assert!(out.iter().any(|l| l.contains("a.gif") && l.contains("[cat]")));
        assert!(!out.iter().any(|l| l.contains("b.png")));
        assert!(out.iter().any(|l| l.contains("sub")));
        assert_eq!(out.last().unwrap(), "(2 assets hidden by the tag filter)");

        let out = app.list(Some(folder), &[], false, true).await.unwrap();
        assert!(out.iter().any(|l| l.contains("b.png")));
        assert!(!out.iter().any(|l| l.contains("a.gif")));
    }

    #[tokio::test]
    async fn test_tag_unknown_asset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let folder = media_folder(dir.path());
        let app = app_in(dir.path());

        let result = app
            .tag(TagCommands::Rm {
                folder,
                asset: "ghost.png".into(),
                tag: "cat".into(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_missing_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(dir.path());
        let missing = dir.path().join("nope").display().to_string();
        assert!(app.list(Some(missing), &[], false, false).await.is_err());
    }

    #[tokio::test]
    async fn test_preview_reports_images_and_video_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let folder = media_folder(dir.path());
        let app = app_in(dir.path());

        let out = app.preview(&folder).await.unwrap();
        let line = |name: &str| out.iter().find(|l| l.starts_with(name)).unwrap().clone();
        assert!(line("a.gif").contains("image image/gif"));
        assert!(line("b.png").contains("image image/png"));
        assert!(line("clip.mp4").contains("placeholder"));
        assert_eq!(out.last().unwrap(), "3 fetched, 0 failed, 0 cache hits");
    }

    #[tokio::test]
    async fn test_favorites_add_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(dir.path());

        let out = app
            .favorites(FavCommands::Add {
                path: "/memes/cats".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("cats"));

        // Adding twice keeps a single entry
        let out = app
            .favorites(FavCommands::Add {
                path: "/memes/cats".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.len(), 1);

        let out = app
            .favorites(FavCommands::Rm {
                path: "/memes/cats".into(),
            })
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_parent() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(dir.path());
        if cfg!(windows) {
            assert_eq!(app.parent(r"C:\memes\cats"), vec![r"C:\memes".to_string()]);
            assert_eq!(app.parent(r"C:\"), vec![r"C:\ (root)".to_string()]);
        } else {
            assert_eq!(app.parent("/memes/cats"), vec!["/memes".to_string()]);
            assert_eq!(app.parent("/"), vec!["/ (root)".to_string()]);
        }
    }
}
