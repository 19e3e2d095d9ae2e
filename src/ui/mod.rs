// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Top-level egui application shell for composing a post.
//! Handles layout, form controls, and wiring to the posting endpoint.

pub mod components;

use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;

use crate::config::Config;
use crate::logic::posting::PostingClient;
use crate::mvu::{self, AppModel, Command, MAX_TEXT_CHARS, Msg};
use crate::ui::components::attachments::{self, AttachmentsMsg};
use crate::ui::components::{post_menu, submit_button};

const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);

/// Stateful egui application for composing and submitting posts.
pub struct ComposerApp {
    model: AppModel,
    inbox: Vec<Msg>,
    cmd_tx: crossbeam_channel::Sender<Command>,
    msg_rx: crossbeam_channel::Receiver<Msg>,
}

impl ComposerApp {
    /// Build the app and spawn the command workers.
    pub fn new(ctx: egui::Context, config: &Config, client: PostingClient) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded::<Msg>();

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().max(2))
            .unwrap_or(2);
        for _ in 0..threads {
            let cmd_rx = cmd_rx.clone();
            let msg_tx = msg_tx.clone();
            let client = client.clone();
            let ctx = ctx.clone();
            std::thread::spawn(move || {
                for cmd in cmd_rx.iter() {
                    let msg = mvu::run_command(cmd, &client);
                    if msg_tx.send(msg).is_err() {
                        break;
                    }
                    ctx.request_repaint();
                }
            });
        }
        tracing::debug!(threads, "command workers started");

        Self {
            model: AppModel::new(ctx, &config.post),
            inbox: Vec::new(),
            cmd_tx,
            msg_rx,
        }
    }
}

impl eframe::App for ComposerApp {
    // Required by eframe 0.34; the frame is still driven by `update`, which eframe calls first.
    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}

    /// Drives a single UI frame: drains worker results, applies queued messages, dispatches
    /// resulting commands, then renders the form. Views append their messages to the inbox
    /// for the next frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_spacing(ctx);

        // Pull messages produced by the command workers.
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.model.pending_commands = self.model.pending_commands.saturating_sub(1);
            self.inbox.push(msg);
        }

        self.collect_dropped_files(ctx);

        // Apply in arrival order so picker batches keep their sequence.
        for msg in std::mem::take(&mut self.inbox) {
            let mut commands = Vec::new();
            mvu::update(&mut self.model, msg, &mut commands);
            for cmd in commands {
                if self.cmd_tx.send(cmd).is_ok() {
                    self.model.pending_commands += 1;
                }
            }
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(self.heading());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.add_space(2.0);
                    egui::widgets::global_theme_preference_switch(ui);
                });
            });
            ui.add_space(4.0);
        });

        self.render_error_modal(ctx);

        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                self.render_status(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_messages(ui);
                self.render_poster_row(ui);
                ui.add_space(6.0);

                self.render_text_input(ui);
                ui.add_space(12.0);

                let att_msgs = attachments::view(ui, &mut self.model.attachments);
                self.inbox.extend(att_msgs.into_iter().map(Msg::Attachments));
                ui.add_space(12.0);

                self.render_session_posts(ui);
            });
        });

        if !self.inbox.is_empty() {
            ctx.request_repaint();
        } else if self.model.pending_commands > 0 {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl ComposerApp {
    fn ensure_spacing(&self, ctx: &egui::Context) {
        ctx.style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        });
    }

    fn heading(&self) -> String {
        match self.model.thread_id {
            Some(thread) => format!("/{}/ reply to #{thread}", self.model.board),
            None => format!("/{}/ new thread", self.model.board),
        }
    }

    /// Files dropped onto the window count as one more picker batch.
    fn collect_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.inbox
                .push(Msg::Attachments(AttachmentsMsg::FilesPicked(dropped)));
        }
    }

    /// Live validation messages followed by the last server error block.
    fn render_messages(&self, ui: &mut egui::Ui) {
        let validation = self.model.attachments.validation();
        let server = self.model.submit.server_errors();
        if validation.is_ok() && server.is_empty() {
            return;
        }

        ui.vertical_centered(|ui| {
            for message in validation.messages() {
                ui.label(egui::RichText::new(message).color(ERROR_RED).size(16.0));
            }
            for message in server {
                ui.label(egui::RichText::new(message).color(ERROR_RED).size(16.0));
            }
        });
        ui.add_space(6.0);
    }

    /// Poster name field with the submit button beside it.
    fn render_poster_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut poster = self.model.poster.clone();
            let width = (ui.available_width() - 120.0).max(120.0);
            if ui
                .add(
                    egui::TextEdit::singleline(&mut poster)
                        .hint_text("Name (optional)")
                        .desired_width(width),
                )
                .changed()
            {
                self.inbox.push(Msg::PosterChanged(poster));
            }

            let submitting = self.model.submit.is_submitting();
            if submit_button(ui, submitting, !self.model.can_submit(), "Submit")
                .on_disabled_hover_text("Fix the attachment errors above")
                .clicked()
            {
                self.inbox.push(Msg::SubmitRequested);
            }
        });
    }

    /// Multiline post body.
    fn render_text_input(&mut self, ui: &mut egui::Ui) {
        let mut text = self.model.text.clone();
        if ui
            .add(
                egui::TextEdit::multiline(&mut text)
                    .desired_rows(7)
                    .desired_width(f32::INFINITY)
                    .char_limit(MAX_TEXT_CHARS)
                    .hint_text("Post text"),
            )
            .changed()
        {
            self.inbox.push(Msg::TextChanged(text));
        }
    }

    /// Posts created in this session with their action menus.
    fn render_session_posts(&mut self, ui: &mut egui::Ui) {
        if self.model.posts.is_empty() {
            return;
        }
        egui::CollapsingHeader::new("Your posts")
            .default_open(true)
            .show(ui, |ui| {
                for post in &self.model.posts {
                    let msgs = post_menu::view(ui, post, self.model.open_menu);
                    self.inbox.extend(msgs.into_iter().map(Msg::PostMenu));
                }
            });
    }

    /// Render a simple modal window for error messages.
    fn render_error_modal(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.model.error.clone() {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.inbox.push(Msg::DismissError);
                    }
                });
        }
    }

    /// Render latest status message and background work indicator.
    fn render_status(&self, ui: &mut egui::Ui) {
        let text = if self.model.submit.is_submitting() {
            submit_button::IN_PROGRESS_LABEL.to_string()
        } else if let Some(status) = &self.model.status {
            status.clone()
        } else {
            return;
        };

        let display = if self.model.pending_commands > 0 {
            format!("{}  ({} working…)", text, self.model.pending_commands)
        } else {
            text
        };
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(display).color(egui::Color32::from_gray(68)));
            if self.model.pending_commands > 0 {
                ui.add(egui::Spinner::new().size(14.0))
                    .on_hover_text(format!(
                        "{} task(s) running in background",
                        self.model.pending_commands
                    ));
            }
        });
    }
}
