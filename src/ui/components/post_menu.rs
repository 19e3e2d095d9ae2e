// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Per-post dropdown with a delete action.
//!
//! Menus hold no open/closed flag of their own. The app keeps a single
//! `open_menu` value and every row derives its visibility from it, so at most
//! one menu is open at a time.

use eframe::egui;

use super::submit_button::submit_button;
use crate::logic::posting::PostId;

/// A post created during this session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostSummary {
    pub id: PostId,
    /// First line of the post text, shortened for display.
    pub excerpt: String,
    pub files: usize,
    /// A delete request for this post is in flight.
    pub deleting: bool,
}

impl PostSummary {
    pub fn new(id: PostId, text: &str, files: usize) -> Self {
        Self {
            id,
            excerpt: excerpt(text),
            files,
            deleting: false,
        }
    }
}

/// Messages emitted by a post row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostMenuMsg {
    Toggle(PostId),
    Delete(PostId),
}

/// Next value of the shared open-menu slot after toggling `id`.
pub fn toggle(open: Option<PostId>, id: PostId) -> Option<PostId> {
    if open == Some(id) { None } else { Some(id) }
}

/// Render one post row with its toggle and, when open, the delete action.
pub fn view(ui: &mut egui::Ui, post: &PostSummary, open: Option<PostId>) -> Vec<PostMenuMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(format!("#{}", post.id)).monospace());
        ui.label(&post.excerpt);
        if post.files > 0 {
            ui.label(
                egui::RichText::new(format!("{} {}", egui_phosphor::regular::IMAGE_SQUARE, post.files))
                    .small()
                    .color(egui::Color32::from_gray(110)),
            );
        }

        let glyph = if open == Some(post.id) {
            "▼"
        } else {
            "▶"
        };
        if ui.button(glyph).on_hover_text("Post actions").clicked() {
            msgs.push(PostMenuMsg::Toggle(post.id));
        }

        if open == Some(post.id) && submit_button(ui, post.deleting, false, "Delete").clicked() {
            msgs.push(PostMenuMsg::Delete(post.id));
        }
    });

    msgs
}

fn excerpt(text: &str) -> String {
    const MAX_CHARS: usize = 60;
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() > MAX_CHARS {
        let short: String = line.chars().take(MAX_CHARS).collect();
        format!("{short}…")
    } else {
        line.to_string()
    }
}
