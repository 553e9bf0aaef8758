//! In-memory tag index for the active folder

use crate::error::{AppError, ErrorKind};
use crate::filter::{self, FilterState, TagSet};
use crate::model::Entry;
use crate::ports::{TagOp, TagStore};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Outcome of a folder load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagLoad {
    /// Tags for this many assets are now active
    Applied(usize),
    /// A newer load started meanwhile; the result was dropped
    Stale,
}

/// A tag as shown in an asset's tag editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChip {
    pub tag: String,
    /// Carried by the asset
    pub active: bool,
}

/// Tags of a folder fetched but not yet applied
///
/// Apply it with [`TagIndex::commit`] or drop it with [`TagIndex::discard`].
#[derive(Debug)]
pub struct PendingTags {
    folder: String,
    generation: u64,
    result: Result<HashMap<String, Vec<String>>, AppError>,
}

impl PendingTags {
    pub fn folder(&self) -> &str {
        &self.folder
    }
}

/// Local mutation made while a fetch was outstanding
struct JournalEntry {
    folder: String,
    asset: String,
    tag: String,
    op: TagOp,
}

#[derive(Default)]
struct IndexState {
    folder: Option<String>,
    tags: HashMap<String, TagSet>,
    generation: u64,
    /// Generation of the outstanding fetch, if any
    pending: Option<u64>,
    journal: Vec<JournalEntry>,
}

impl IndexState {
    fn unique_tags(&self) -> BTreeSet<String> {
        self.tags.values().flatten().cloned().collect()
    }

    fn record(&mut self, folder: &str, asset: &str, tag: &str, op: TagOp) {
        if self.pending.is_some() {
            self.journal.push(JournalEntry {
                folder: folder.to_string(),
                asset: asset.to_string(),
                tag: tag.to_string(),
                op,
            });
        }
    }
}

/// Asset name -> tags for one folder at a time
///
/// The in-memory copy is authoritative. Mutations apply locally first and are
/// then persisted; a failed persist keeps the local change.
pub struct TagIndex {
    store: Arc<dyn TagStore>,
    state: Mutex<IndexState>,
}

impl TagIndex {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self {
            store,
            state: Mutex::new(IndexState::default()),
        }
    }

    /// Folder whose tags are loaded
    pub fn folder(&self) -> Option<String> {
        self.state.lock().folder.clone()
    }

    /// Replace the index with the tags of `folder`
    ///
    /// A load overtaken by a newer one returns [`TagLoad::Stale`] and leaves the
    /// newer state untouched, whether it succeeded or not.
    pub async fn load_folder(&self, folder: &str) -> Result<TagLoad, AppError> {
        let pending = self.fetch_folder(folder).await;
        self.commit(pending)
    }

    /// Fetch the tags of `folder` without touching the active index
    ///
    /// Any earlier outstanding fetch becomes stale.
    pub async fn fetch_folder(&self, folder: &str) -> PendingTags {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.pending = Some(state.generation);
            state.journal.clear();
            state.generation
        };

        PendingTags {
            folder: folder.to_string(),
            generation,
            result: self.store.load_tags(folder).await,
        }
    }

    /// Make fetched tags the active index
    ///
    /// Mutations of the same folder made while the fetch was outstanding are
    /// replayed on top of the fetched tags. A failed fetch leaves the folder
    /// active with no tags.
    pub fn commit(&self, pending: PendingTags) -> Result<TagLoad, AppError> {
        let mut state = self.state.lock();
        if state.generation != pending.generation {
            tracing::warn!("Dropping stale tag load for {}", pending.folder);
            return Ok(TagLoad::Stale);
        }

        let journal = std::mem::take(&mut state.journal);
        state.pending = None;
        state.folder = Some(pending.folder.clone());
        state.tags.clear();

        let mut tags: HashMap<String, TagSet> = pending
            .result?
            .into_iter()
            .map(|(asset, tags)| (asset, normalize(tags)))
            .collect();
        for entry in journal.into_iter().filter(|e| e.folder == pending.folder) {
            let asset_tags = tags.entry(entry.asset).or_default();
            match entry.op {
                TagOp::Add => asset_tags.insert(entry.tag),
                TagOp::Remove => asset_tags.remove(&entry.tag),
            };
        }
        tags.retain(|_, tags| !tags.is_empty());
        state.tags = tags;

        tracing::debug!("Loaded tags for {} assets in {}", state.tags.len(), pending.folder);
        Ok(TagLoad::Applied(state.tags.len()))
    }

    /// Drop fetched tags, keeping the active index as it is
    pub fn discard(&self, pending: PendingTags) {
        let mut state = self.state.lock();
        if state.pending == Some(pending.generation) {
            state.pending = None;
            state.journal.clear();
        }
        tracing::debug!("Discarded tag load for {}", pending.folder);
    }

    /// Forget the loaded folder; pending loads become stale
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.folder = None;
        state.tags.clear();
        state.pending = None;
        state.journal.clear();
    }

    pub fn tags_of(&self, asset: &str) -> TagSet {
        self.state.lock().tags.get(asset).cloned().unwrap_or_default()
    }

    /// Snapshot of every tagged asset
    pub fn snapshot(&self) -> HashMap<String, TagSet> {
        self.state.lock().tags.clone()
    }

    /// Every tag used in the folder, sorted
    pub fn unique_tags(&self) -> Vec<String> {
        self.state.lock().unique_tags().into_iter().collect()
    }

    /// Unique tags containing `query`, ignoring case
    pub fn filter_tags(&self, query: &str) -> Vec<String> {
        let query = query.trim().to_lowercase();
        self.state
            .lock()
            .unique_tags()
            .into_iter()
            .filter(|tag| query.is_empty() || tag.to_lowercase().contains(&query))
            .collect()
    }

    /// Tag editor chips for `asset`: its own tags first, then the other folder
    /// tags matching `query` unless `hide_inactive`
    pub fn tag_chips(&self, asset: &str, query: &str, hide_inactive: bool) -> Vec<TagChip> {
        let state = self.state.lock();
        let own = state.tags.get(asset).cloned().unwrap_or_default();
        let query = query.trim().to_lowercase();

        let mut chips: Vec<TagChip> = own
            .iter()
            .map(|tag| TagChip {
                tag: tag.clone(),
                active: true,
            })
            .collect();

        if !hide_inactive {
            chips.extend(
                state
                    .unique_tags()
                    .into_iter()
                    .filter(|tag| !own.contains(tag))
                    .filter(|tag| query.is_empty() || tag.to_lowercase().contains(&query))
                    .map(|tag| TagChip { tag, active: false }),
            );
        }
        chips
    }

    pub fn filtered_assets(&self, assets: &[Entry], filter: &FilterState) -> Vec<Entry> {
        filter::filtered_assets(assets, &self.state.lock().tags, filter)
    }

    /// Add `tag` to `asset`; returns `false` when it was already there
    pub async fn add_tag(&self, asset: &str, tag: &str) -> Result<bool, AppError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(false);
        }

        let folder = {
            let mut state = self.state.lock();
            let folder = active_folder(&state)?;
            if !state.tags.entry(asset.to_string()).or_default().insert(tag.to_string()) {
                return Ok(false);
            }
            state.record(&folder, asset, tag, TagOp::Add);
            folder
        };

        self.persist(&folder, asset, tag, TagOp::Add).await?;
        Ok(true)
    }

    /// Remove `tag` from `asset`; returns `false` when it was not there
    pub async fn remove_tag(&self, asset: &str, tag: &str) -> Result<bool, AppError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(false);
        }

        let folder = {
            let mut state = self.state.lock();
            let folder = active_folder(&state)?;
            let Some(tags) = state.tags.get_mut(asset) else {
                return Ok(false);
            };
            if !tags.remove(tag) {
                return Ok(false);
            }
            if tags.is_empty() {
                state.tags.remove(asset);
            }
            state.record(&folder, asset, tag, TagOp::Remove);
            folder
        };

        self.persist(&folder, asset, tag, TagOp::Remove).await?;
        Ok(true)
    }

    /// Replace the tags of `asset`, persisting the difference
    ///
    /// Every change is attempted; the first persist failure is returned.
    pub async fn set_tags<I, S>(&self, asset: &str, tags: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted = normalize(tags);

        let (folder, ops) = {
            let mut state = self.state.lock();
            let folder = active_folder(&state)?;
            let current = state.tags.get(asset).cloned().unwrap_or_default();

            let mut ops: Vec<(String, TagOp)> = current
                .difference(&wanted)
                .map(|t| (t.clone(), TagOp::Remove))
                .collect();
            ops.extend(wanted.difference(&current).map(|t| (t.clone(), TagOp::Add)));
            for (tag, op) in &ops {
                state.record(&folder, asset, tag, *op);
            }

            if wanted.is_empty() {
                state.tags.remove(asset);
            } else {
                state.tags.insert(asset.to_string(), wanted);
            }
            (folder, ops)
        };

        let mut first_error = None;
        for (tag, op) in ops {
            if let Err(e) = self.persist(&folder, asset, &tag, op).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn persist(&self, folder: &str, asset: &str, tag: &str, op: TagOp) -> Result<(), AppError> {
        self.store
            .persist_tag_change(folder, asset, tag, op)
            .await
            .map_err(|e| {
                tracing::warn!("Failed to persist {:?} {:?} on {}: {}", op, tag, asset, e);
                if e.kind() == ErrorKind::Persist {
                    e
                } else {
                    AppError::persist(format!("tags of {}", asset), e)
                }
            })
    }
}

fn active_folder(state: &IndexState) -> Result<String, AppError> {
    state
        .folder
        .clone()
        .ok_or_else(|| AppError::Config("no folder loaded".to_string()))
}

/// Trimmed, non-empty, deduplicated
fn normalize<I, S>(tags: I) -> TagSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
