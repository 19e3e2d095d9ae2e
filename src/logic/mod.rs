// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Framework-free state and I/O: the attachment store, the form file control, and the posting client.

pub mod file_input;
pub mod posting;
pub mod store;
