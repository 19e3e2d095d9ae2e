// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Set-level validation rules for the attachment list (UI-agnostic, pure).

use super::candidate::CandidateFile;

/// Upper bound for the combined size of all attachments in one post.
pub const MAX_TOTAL_BYTES: u64 = 5 * 1024 * 1024;

/// MIME essences accepted for upload.
pub const ALLOWED_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/bmp",
    "image/gif",
    "image/webp",
];

/// File extensions offered by the picker filter, covering [`ALLOWED_TYPES`].
pub const PICKER_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

pub const SIZE_ERROR: &str = "file too large";
pub const TYPE_ERROR: &str = "not allowed file type";

/// Outcome of both checks, derived from the current list and never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub size_error: Option<&'static str>,
    pub type_error: Option<&'static str>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.size_error.is_none() && self.type_error.is_none()
    }

    /// Active messages, size check first.
    pub fn messages(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.size_error.into_iter().chain(self.type_error)
    }
}

/// Run both checks against the list.
pub fn validate(files: &[CandidateFile]) -> ValidationResult {
    ValidationResult {
        size_error: size_error(files),
        type_error: type_error(files),
    }
}

/// Sum of all entry sizes.
pub fn total_size(files: &[CandidateFile]) -> u64 {
    files
        .iter()
        .fold(0u64, |sum, file| sum.saturating_add(file.size()))
}

/// Fails when the combined size exceeds [`MAX_TOTAL_BYTES`]; an empty list never fails.
pub fn size_error(files: &[CandidateFile]) -> Option<&'static str> {
    if files.is_empty() {
        return None;
    }
    (total_size(files) > MAX_TOTAL_BYTES).then_some(SIZE_ERROR)
}

/// Fails when any entry's type is outside [`ALLOWED_TYPES`]; an empty list never fails.
pub fn type_error(files: &[CandidateFile]) -> Option<&'static str> {
    files
        .iter()
        .any(|file| !is_allowed_type(file.mime()))
        .then_some(TYPE_ERROR)
}

/// Compare the MIME essence (parameters stripped, case-insensitive) against the allow-list.
pub fn is_allowed_type(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or("").trim();
    ALLOWED_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}
