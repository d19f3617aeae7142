use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::doc::{DocCategory, TocEntry};

/// Ordered, category-partitioned store of TOC entries.
///
/// Entries are kept sorted by [`TocEntry`]'s ordering at all times. The
/// per-category views and the title lists are rebuilt after every mutation so
/// a list shown to the user and a later [`resolve`](Self::resolve) with the
/// same filter always agree on positions.
///
/// Not thread-safe on its own; share it through [`SharedCache`].
#[derive(Debug, Clone, Default)]
pub struct DocumentationCache {
    entries: Vec<TocEntry>,
    titles: Vec<String>,
    entries_by_category: BTreeMap<DocCategory, Vec<TocEntry>>,
    titles_by_category: BTreeMap<DocCategory, Vec<String>>,
}

impl DocumentationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = TocEntry>) -> Self {
        let mut cache = Self {
            entries: entries.into_iter().collect(),
            ..Self::default()
        };
        cache.entries.sort();
        cache.reindex();
        cache
    }

    /// Inserts `entry` after any entries comparing equal to it.
    pub fn append(&mut self, entry: TocEntry) {
        let position = self.entries.partition_point(|existing| *existing <= entry);
        self.entries.insert(position, entry);
        self.reindex();
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = TocEntry>) {
        self.entries.extend(entries);
        self.entries.sort();
        self.reindex();
    }

    pub fn remove(&mut self, index: usize) -> Option<TocEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        self.reindex();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.reindex();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Display titles, globally or for one category.
    pub fn titles(&self, category: Option<DocCategory>) -> &[String] {
        match category {
            None => &self.titles,
            Some(category) => self
                .titles_by_category
                .get(&category)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    pub fn entries_by_category(&self, category: DocCategory) -> &[TocEntry] {
        self.entries_by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_populated(&self, category: DocCategory) -> bool {
        self.entries_by_category.contains_key(&category)
    }

    pub fn has_failures(&self, category: DocCategory) -> bool {
        self.entries_by_category(category).iter().any(TocEntry::is_failure)
    }

    /// Categories holding at least one entry, in declaration order.
    pub fn categories(&self) -> Vec<DocCategory> {
        self.entries_by_category.keys().copied().collect()
    }

    /// Maps a position in the list returned by `titles(category)` back to its entry.
    pub fn resolve(&self, category: Option<DocCategory>, index: usize) -> Option<&TocEntry> {
        match category {
            None => self.entries.get(index),
            Some(category) => self.entries_by_category(category).get(index),
        }
    }

    fn reindex(&mut self) {
        self.titles = self.entries.iter().map(|e| e.title.clone()).collect();

        self.entries_by_category.clear();
        for entry in &self.entries {
            self.entries_by_category
                .entry(entry.category)
                .or_default()
                .push(entry.clone());
        }

        self.titles_by_category = self
            .entries_by_category
            .iter()
            .map(|(category, entries)| {
                (*category, entries.iter().map(|e| e.title.clone()).collect())
            })
            .collect();
    }
}

/// Process-wide handle to one [`DocumentationCache`] behind a mutex.
///
/// Cloning is cheap and every clone sees the same cache. Each method takes
/// the lock for the duration of the call.
#[derive(Debug, Clone, Default)]
pub struct SharedCache {
    inner: Arc<Mutex<DocumentationCache>>,
}

impl SharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: TocEntry) {
        self.inner.lock().append(entry);
    }

    pub fn titles(&self, category: Option<DocCategory>) -> Vec<String> {
        self.inner.lock().titles(category).to_vec()
    }

    pub fn entries_by_category(&self, category: DocCategory) -> Vec<TocEntry> {
        self.inner.lock().entries_by_category(category).to_vec()
    }

    pub fn is_populated(&self, category: DocCategory) -> bool {
        self.inner.lock().is_populated(category)
    }

    pub fn has_failures(&self, category: DocCategory) -> bool {
        self.inner.lock().has_failures(category)
    }

    pub fn resolve(&self, category: Option<DocCategory>, index: usize) -> Option<TocEntry> {
        self.inner.lock().resolve(category, index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn snapshot(&self) -> DocumentationCache {
        self.inner.lock().clone()
    }
}
