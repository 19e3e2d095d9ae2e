// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Attachment store: the ordered list of selected files plus their preview handles.
//!
//! The store is the sole owner of every preview handle it creates. Handles are
//! created lazily through a [`PreviewSource`] and released through the same
//! source when their entry leaves the list, whichever path removes it
//! (`remove_at`, `clear`, or dropping the store).

use tracing::debug;

use crate::models::candidate::{CandidateFile, FileId};

/// Factory and releaser for preview handles.
pub trait PreviewSource {
    type Handle;

    /// Produce a handle for `file`, or `None` when no preview can be shown yet.
    fn create(&mut self, file: &CandidateFile) -> Option<Self::Handle>;

    /// Give back a handle previously returned by [`PreviewSource::create`].
    fn release(&mut self, file: &CandidateFile, handle: Self::Handle);
}

/// Counters for handle bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandleLedger {
    pub created: usize,
    pub released: usize,
}

impl HandleLedger {
    /// Handles currently alive.
    pub fn outstanding(&self) -> usize {
        self.created - self.released
    }
}

struct Entry<H> {
    file: CandidateFile,
    preview: Option<H>,
}

/// Ordered attachment list; insertion order is selection order.
pub struct AttachmentStore<S: PreviewSource> {
    entries: Vec<Entry<S::Handle>>,
    source: S,
    ledger: HandleLedger,
}

impl<S: PreviewSource + Default> Default for AttachmentStore<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: PreviewSource> AttachmentStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            entries: Vec::new(),
            source,
            ledger: HandleLedger::default(),
        }
    }

    /// Append a batch to the end of the list, keeping earlier selections.
    pub fn add_batch(&mut self, files: impl IntoIterator<Item = CandidateFile>) {
        let before = self.entries.len();
        self.entries.extend(
            files
                .into_iter()
                .map(|file| Entry { file, preview: None }),
        );
        if self.entries.len() > before {
            debug!(
                added = self.entries.len() - before,
                total = self.entries.len(),
                "attachments added"
            );
        }
    }

    /// Remove the entry at `index` and release its preview.
    ///
    /// Out-of-range indices are ignored and return `None`.
    pub fn remove_at(&mut self, index: usize) -> Option<CandidateFile> {
        if index >= self.entries.len() {
            debug!(index, len = self.entries.len(), "ignoring out-of-range removal");
            return None;
        }
        let file = self.detach(index);
        debug!(index, name = file.name(), remaining = self.entries.len(), "attachment removed");
        Some(file)
    }

    /// Release every preview and empty the list.
    pub fn clear(&mut self) {
        while !self.entries.is_empty() {
            self.detach(self.entries.len() - 1);
        }
    }

    /// Lazily create (then reuse) the preview handle for the entry at `index`.
    pub fn preview_for(&mut self, index: usize) -> Option<&S::Handle> {
        let entry = self.entries.get_mut(index)?;
        if entry.preview.is_none() {
            if let Some(handle) = self.source.create(&entry.file) {
                self.ledger.created += 1;
                entry.preview = Some(handle);
            }
        }
        entry.preview.as_ref()
    }

    /// Files in list order.
    pub fn files(&self) -> impl ExactSizeIterator<Item = &CandidateFile> {
        self.entries.iter().map(|entry| &entry.file)
    }

    pub fn get(&self, index: usize) -> Option<&CandidateFile> {
        self.entries.get(index).map(|entry| &entry.file)
    }

    pub fn position(&self, id: FileId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.file.id() == id)
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ledger(&self) -> HandleLedger {
        self.ledger
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The only place entries leave the list; pairs removal with release.
    fn detach(&mut self, index: usize) -> CandidateFile {
        let Entry { file, preview } = self.entries.remove(index);
        if let Some(handle) = preview {
            self.source.release(&file, handle);
            self.ledger.released += 1;
        }
        file
    }
}

impl<S: PreviewSource> Drop for AttachmentStore<S> {
    fn drop(&mut self) {
        self.clear();
    }
}
