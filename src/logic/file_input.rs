// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! File-input control and the synchronizer that keeps it in step with the store.
//!
//! The control mirrors a platform file picker field: its value can be read and
//! replaced as a whole, but never edited entry by entry. Submission reads the
//! files from here, so after every structural change to the store the value is
//! rebuilt from scratch with [`synchronize`].

use tracing::debug;

use super::store::{AttachmentStore, PreviewSource};
use crate::models::candidate::CandidateFile;

/// Builder for a replacement file-input value.
#[derive(Clone, Debug, Default)]
pub struct FileTransfer {
    items: Vec<CandidateFile>,
}

impl FileTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: CandidateFile) {
        self.items.push(file);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Form field holding the files that will be sent with the post.
#[derive(Clone, Debug)]
pub struct FileInput {
    name: String,
    accept: String,
    multiple: bool,
    files: Vec<CandidateFile>,
}

impl Default for FileInput {
    fn default() -> Self {
        Self::new("file", "image/*", true)
    }
}

impl FileInput {
    pub fn new(name: impl Into<String>, accept: impl Into<String>, multiple: bool) -> Self {
        Self {
            name: name.into(),
            accept: accept.into(),
            multiple,
            files: Vec::new(),
        }
    }

    /// Multipart field name used for every file part.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accept(&self) -> &str {
        &self.accept
    }

    pub fn multiple(&self) -> bool {
        self.multiple
    }

    /// Current value, in the order it will be submitted.
    pub fn files(&self) -> &[CandidateFile] {
        &self.files
    }

    /// Replace the whole value.
    pub fn set_files(&mut self, transfer: FileTransfer) {
        self.files = transfer.items;
    }

    /// What a picker invocation does: the new selection replaces the value.
    ///
    /// Single-selection controls keep only the first file.
    pub fn select(&mut self, selection: impl IntoIterator<Item = CandidateFile>) {
        let limit = if self.multiple { usize::MAX } else { 1 };
        let mut transfer = FileTransfer::new();
        for file in selection.into_iter().take(limit) {
            transfer.add(file);
        }
        self.set_files(transfer);
    }
}

/// Rebuild the control value from the store's current list.
pub fn synchronize<S: PreviewSource>(store: &AttachmentStore<S>, input: &mut FileInput) {
    let mut transfer = FileTransfer::new();
    for file in store.files() {
        transfer.add(file.clone());
    }
    debug!(
        field = input.name(),
        stale = input.files().len(),
        fresh = transfer.len(),
        cleared = transfer.is_empty(),
        "file input rebuilt"
    );
    input.set_files(transfer);
}
