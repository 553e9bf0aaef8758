//! Active-folder watcher with notify-debouncer-mini

use crate::Result;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

/// File system event for a child of the watched folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

impl FsEvent {
    pub fn path(&self) -> &Path {
        match self {
            FsEvent::Created(p) | FsEvent::Modified(p) | FsEvent::Removed(p) => p,
        }
    }
}

/// Watches exactly one folder (non-recursive) at a time
pub struct FolderWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    event_rx: Receiver<std::result::Result<Vec<DebouncedEvent>, notify::Error>>,
    folder: Option<PathBuf>,
}

impl FolderWatcher {
    /// Create a new watcher with 100ms debounce
    pub fn new() -> Result<Self> {
        let (tx, rx) = channel();
        let debouncer = new_debouncer(Duration::from_millis(100), tx)?;

        Ok(Self {
            debouncer,
            event_rx: rx,
            folder: None,
        })
    }

    /// Switch the watch to `folder`, dropping the previous one
    pub fn watch(&mut self, folder: &Path) -> Result<()> {
        if self.folder.as_deref() == Some(folder) {
            return Ok(());
        }
        self.unwatch();

        self.debouncer.watcher().watch(folder, RecursiveMode::NonRecursive)?;
        self.folder = Some(folder.to_path_buf());
        tracing::info!("Watching: {}", folder.display());
        Ok(())
    }

    /// Stop watching the current folder, if any
    pub fn unwatch(&mut self) {
        if let Some(old) = self.folder.take() {
            if let Err(e) = self.debouncer.watcher().unwatch(&old) {
                tracing::warn!("Failed to unwatch {}: {}", old.display(), e);
            }
        }
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    /// Poll for file system events (non-blocking)
    pub fn poll_events(&self) -> Vec<FsEvent> {
        let mut events = Vec::new();

        while let Ok(result) = self.event_rx.try_recv() {
            match result {
                Ok(debounced) => events.extend(debounced.into_iter().filter_map(Self::convert_event)),
                Err(e) => tracing::warn!("Watcher error: {:?}", e),
            }
        }

        events.dedup();
        events
    }

    fn convert_event(event: DebouncedEvent) -> Option<FsEvent> {
        match event.kind {
            DebouncedEventKind::Any => {
                if !event.path.exists() {
                    return Some(FsEvent::Removed(event.path));
                }
                let fresh = event
                    .path
                    .metadata()
                    .and_then(|m| m.created())
                    .ok()
                    .and_then(|t| t.elapsed().ok())
                    .is_some_and(|elapsed| elapsed < Duration::from_secs(1));
                if fresh {
                    Some(FsEvent::Created(event.path))
                } else {
                    Some(FsEvent::Modified(event.path))
                }
            }
            _ => None,
        }
    }
}

impl Drop for FolderWatcher {
    fn drop(&mut self) {
        self.unwatch();
    }
}
