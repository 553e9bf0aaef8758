//! Tag filter state and the filtered asset view

use crate::config::UiState;
use crate::model::Entry;
use std::collections::{BTreeSet, HashMap};

/// Tags of a single asset
pub type TagSet = BTreeSet<String>;

/// How selected tags combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Asset must carry every selected tag
    #[default]
    Intersect,
    /// Asset must carry at least one selected tag
    Union,
}

impl FilterMode {
    pub fn from_intersect(intersect: bool) -> Self {
        if intersect {
            FilterMode::Intersect
        } else {
            FilterMode::Union
        }
    }

    pub fn is_intersect(self) -> bool {
        self == FilterMode::Intersect
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub selected_tags: BTreeSet<String>,
    pub mode: FilterMode,
    /// Overrides `selected_tags`: only assets without tags pass
    pub untagged_only: bool,
}

impl FilterState {
    /// Filter seeded from persisted UI state; tag selection always starts empty
    pub fn from_ui(ui: &UiState) -> Self {
        Self {
            selected_tags: BTreeSet::new(),
            mode: FilterMode::from_intersect(ui.tag_filter_intersect),
            untagged_only: ui.show_only_untagged,
        }
    }

    /// Add `tag` if absent, remove it if present; returns whether it is now selected
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.selected_tags.remove(tag) {
            false
        } else {
            self.selected_tags.insert(tag.to_string());
            true
        }
    }

    /// Whether the filter can hide anything
    pub fn is_active(&self) -> bool {
        self.untagged_only || !self.selected_tags.is_empty()
    }

    pub fn matches(&self, tags: Option<&TagSet>) -> bool {
        let tags = tags.filter(|t| !t.is_empty());

        if self.untagged_only {
            return tags.is_none();
        }
        if self.selected_tags.is_empty() {
            return true;
        }

        let Some(tags) = tags else {
            return false;
        };
        match self.mode {
            FilterMode::Intersect => self.selected_tags.is_subset(tags),
            FilterMode::Union => !self.selected_tags.is_disjoint(tags),
        }
    }
}

/// Assets passing `filter`, in their original order
pub fn filtered_assets(assets: &[Entry], tags: &HashMap<String, TagSet>, filter: &FilterState) -> Vec<Entry> {
    if !filter.is_active() {
        return assets.to_vec();
    }
    assets
        .iter()
        .filter(|asset| filter.matches(tags.get(&asset.name)))
        .cloned()
        .collect()
}
