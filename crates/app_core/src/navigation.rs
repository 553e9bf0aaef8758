//! Viewer cursor over the filtered asset list

use crate::model::Entry;

/// Ordered, filtered assets plus the one open in the viewer
#[derive(Debug, Clone, Default)]
pub struct NavigationCursor {
    items: Vec<Entry>,
    index: Option<usize>,
}

impl NavigationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list after the filtered view changed
    ///
    /// The cursor is cleared when its index falls outside the new list.
    /// Otherwise it follows the open asset to its new position, and is cleared
    /// if that asset is gone.
    pub fn recompute(&mut self, items: Vec<Entry>) {
        let open = self.current().map(|e| e.name.clone());
        self.items = items;
        self.index = match (self.index, open) {
            (Some(i), Some(name)) if i < self.items.len() => self.items.iter().position(|e| e.name == name),
            _ => None,
        };
    }

    pub fn items(&self) -> &[Entry] {
        &self.items
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&Entry> {
        self.index.and_then(|i| self.items.get(i))
    }

    pub fn is_open(&self) -> bool {
        self.index.is_some()
    }

    /// Open the asset called `name`; returns `false` if it is not in the list
    pub fn open(&mut self, name: &str) -> bool {
        match self.items.iter().position(|e| e.name == name) {
            Some(i) => {
                self.index = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn open_index(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.index = Some(index);
            true
        } else {
            false
        }
    }

    pub fn has_next(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.items.len())
    }

    pub fn has_previous(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    /// Move to next item
    pub fn next(&mut self) -> bool {
        match self.index {
            Some(i) if i + 1 < self.items.len() => {
                self.index = Some(i + 1);
                true
            }
            _ => false,
        }
    }

    /// Move to previous item
    pub fn prev(&mut self) -> bool {
        match self.index {
            Some(i) if i > 0 => {
                self.index = Some(i - 1);
                true
            }
            _ => false,
        }
    }

    pub fn close(&mut self) {
        self.index = None;
    }
}
