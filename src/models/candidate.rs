// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Candidate file model: an immutable, identity-compared user selection.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

/// Opaque identity of a selected file. Two selections of the same bytes get different ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A file the user picked for upload.
///
/// Equality and hashing only consider [`FileId`], never the content or path.
#[derive(Clone, Debug)]
pub struct CandidateFile {
    id: FileId,
    path: PathBuf,
    name: String,
    mime: String,
    size: u64,
}

impl CandidateFile {
    pub fn new(path: PathBuf, name: String, mime: String, size: u64) -> Self {
        Self {
            id: FileId::new(),
            path,
            name,
            mime,
            size,
        }
    }

    /// Inspect a file on disk and capture its name, size, and guessed MIME type.
    ///
    /// # Errors
    ///
    /// Returns an error when the file metadata cannot be read or the path is not a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = path
            .metadata()
            .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;
        anyhow::ensure!(meta.is_file(), "Not a regular file: {}", path.display());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        Ok(Self::new(path.to_path_buf(), name, guess_mime(path), meta.len()))
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name shown in tooltips and sent as the multipart filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl PartialEq for CandidateFile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CandidateFile {}

impl Hash for CandidateFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Guess a MIME essence from the file extension, defaulting to octet-stream.
pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
