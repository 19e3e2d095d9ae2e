// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Reusable egui components structured for MVU-style updates.

pub mod attachments;
pub mod post_menu;
pub mod submit_button;

pub use submit_button::submit_button;
