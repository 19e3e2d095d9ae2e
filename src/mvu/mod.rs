// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Root Model-View-Update kernel wiring component state, messages, and commands.

use std::path::PathBuf;

use eframe::egui;
use tracing::{debug, info, warn};

use crate::config::PostConfig;
use crate::logic::posting::{NewPost, PostCreated, PostId, PostingClient};
use crate::models::candidate::{CandidateFile, FileId};
use crate::models::validation::PICKER_EXTENSIONS;
use crate::ui::components::attachments::{
    self, AttachmentsCommand, AttachmentsModel, AttachmentsMsg,
};
use crate::ui::components::post_menu::{self, PostMenuMsg, PostSummary};

/// Maximum post length in characters.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Submit lifecycle: `Idle -> Submitting -> (Succeeded | Failed)`.
///
/// `Succeeded` and `Failed` behave like `Idle` for input purposes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    /// Server-reported messages, shown verbatim.
    Failed(Vec<String>),
}

impl SubmitState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmitState::Submitting)
    }

    pub fn server_errors(&self) -> &[String] {
        match self {
            SubmitState::Failed(messages) => messages,
            _ => &[],
        }
    }
}

/// Top-level application state.
pub struct AppModel {
    /// Post body.
    pub text: String,
    /// Poster name; may be blank.
    pub poster: String,
    /// Board the post goes to (hidden field).
    pub board: String,
    /// Thread being replied to; `None` starts a new thread (hidden field).
    pub thread_id: Option<PostId>,
    /// Attachment store and file-input state.
    pub attachments: AttachmentsModel,
    pub submit: SubmitState,
    /// Posts created during this session.
    pub posts: Vec<PostSummary>,
    /// The single post whose action menu is open.
    pub open_menu: Option<PostId>,
    /// Latest status message to display.
    pub status: Option<String>,
    /// Latest error message to display in modal.
    pub error: Option<String>,
    /// Count of queued background commands.
    pub pending_commands: usize,
}

/// Application messages routed through the update function.
pub enum Msg {
    TextChanged(String),
    PosterChanged(String),
    SubmitRequested,
    SubmitCompleted {
        text: String,
        files: usize,
        result: Result<PostCreated, Vec<String>>,
    },
    DeleteCompleted {
        id: PostId,
        result: Result<(), String>,
    },
    DismissError,
    Attachments(AttachmentsMsg),
    PostMenu(PostMenuMsg),
}

/// Commands represent side-effects executed between frames.
pub enum Command {
    PickFiles { multiple: bool },
    InspectFiles { paths: Vec<PathBuf> },
    DecodePreview { id: FileId, path: PathBuf },
    Submit(NewPost),
    DeletePost(PostId),
}

impl AppModel {
    pub fn new(ctx: egui::Context, post: &PostConfig) -> Self {
        Self {
            text: String::new(),
            poster: post.poster.clone().unwrap_or_default(),
            board: post.board.clone(),
            thread_id: post.thread_id,
            attachments: AttachmentsModel::new(ctx),
            submit: SubmitState::Idle,
            posts: Vec::new(),
            open_menu: None,
            status: None,
            error: None,
            pending_commands: 0,
        }
    }

    /// Submit control is enabled: nothing in flight and attachments pass validation.
    pub fn can_submit(&self) -> bool {
        !self.submit.is_submitting() && self.attachments.validation().is_ok()
    }
}

/// Update the application model and enqueue commands.
pub fn update(model: &mut AppModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::TextChanged(text) => {
            model.text = if text.chars().count() > MAX_TEXT_CHARS {
                text.chars().take(MAX_TEXT_CHARS).collect()
            } else {
                text
            };
        }
        Msg::PosterChanged(poster) => model.poster = poster,
        Msg::DismissError => model.error = None,
        Msg::Attachments(m) => {
            let mut att_cmds = Vec::new();
            if let Some(event) = attachments::update(&mut model.attachments, m, &mut att_cmds) {
                surface_event(model, event.message, event.is_error);
            }
            cmds.extend(att_cmds.into_iter().map(|c| match c {
                AttachmentsCommand::PickFiles { multiple } => Command::PickFiles { multiple },
                AttachmentsCommand::InspectFiles { paths } => Command::InspectFiles { paths },
                AttachmentsCommand::DecodePreview { id, path } => {
                    Command::DecodePreview { id, path }
                }
            }));
        }
        Msg::SubmitRequested => match validate_for_submit(model) {
            Ok(post) => {
                info!(files = post.files.len(), "submit requested");
                model.submit = SubmitState::Submitting;
                cmds.push(Command::Submit(post));
            }
            Err(Some(reason)) => surface_event(model, reason, false),
            Err(None) => debug!("submit ignored while a request is in flight"),
        },
        Msg::SubmitCompleted {
            text,
            files,
            result,
        } => match result {
            Ok(created) => {
                model.attachments.clear();
                model.text.clear();
                model.submit = SubmitState::Succeeded;
                if let Some(id) = created.id {
                    model.posts.push(PostSummary::new(id, &text, files));
                }
                surface_event(model, "Post submitted.".to_string(), false);
            }
            Err(messages) => {
                model.submit = SubmitState::Failed(messages);
                surface_event(model, "Post was rejected.".to_string(), false);
            }
        },
        Msg::PostMenu(PostMenuMsg::Toggle(id)) => {
            model.open_menu = post_menu::toggle(model.open_menu, id);
        }
        Msg::PostMenu(PostMenuMsg::Delete(id)) => {
            let Some(post) = model.posts.iter_mut().find(|p| p.id == id) else {
                return;
            };
            if post.deleting {
                return;
            }
            post.deleting = true;
            model.open_menu = None;
            cmds.push(Command::DeletePost(id));
        }
        Msg::DeleteCompleted { id, result } => match result {
            Ok(()) => {
                model.posts.retain(|p| p.id != id);
                if model.open_menu == Some(id) {
                    model.open_menu = None;
                }
                surface_event(model, format!("Post #{id} deleted."), false);
            }
            Err(err) => {
                if let Some(post) = model.posts.iter_mut().find(|p| p.id == id) {
                    post.deleting = false;
                }
                surface_event(model, format!("Failed to delete post #{id}:\n\n{err}"), true);
            }
        },
    }
}

/// Execute a command on a worker thread and return the resulting message.
pub fn run_command(cmd: Command, client: &PostingClient) -> Msg {
    match cmd {
        Command::PickFiles { multiple } => {
            let dialog = rfd::FileDialog::new()
                .set_title("Select images")
                .add_filter("Images", &PICKER_EXTENSIONS);
            let files = if multiple {
                dialog.pick_files().unwrap_or_default()
            } else {
                dialog.pick_file().into_iter().collect()
            };
            Msg::Attachments(AttachmentsMsg::FilesPicked(files))
        }
        Command::InspectFiles { paths } => {
            let (files, failures) = inspect_files(&paths);
            Msg::Attachments(AttachmentsMsg::FilesInspected { files, failures })
        }
        Command::DecodePreview { id, path } => match attachments::load_image_thumbnail(&path) {
            Ok(image) => Msg::Attachments(AttachmentsMsg::PreviewDecoded { id, image }),
            Err(err) => {
                debug!(path = %path.display(), %err, "no preview");
                Msg::Attachments(AttachmentsMsg::PreviewFailed { id })
            }
        },
        Command::Submit(post) => {
            let result = client.submit(&post).map_err(|err| err.messages());
            Msg::SubmitCompleted {
                text: post.text,
                files: post.files.len(),
                result,
            }
        }
        Command::DeletePost(id) => Msg::DeleteCompleted {
            id,
            result: client.delete(id).map_err(|err| err.messages().join("\n")),
        },
    }
}

/// Read metadata for a picked batch, keeping selection order; unreadable paths are reported.
fn inspect_files(paths: &[PathBuf]) -> (Vec<CandidateFile>, Vec<String>) {
    let mut files = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();
    for path in paths {
        match CandidateFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(err) => {
                warn!(path = %path.display(), "skipping attachment: {err:#}");
                failures.push(format!("{err:#}"));
            }
        }
    }
    (files, failures)
}

/// Update status/error fields consistently for user feedback.
fn surface_event(model: &mut AppModel, message: String, is_error: bool) {
    if is_error {
        model.error = Some(message.clone());
    }
    model.status = Some(message);
}

/// Build the submission payload, or explain why submitting is not possible right now.
///
/// `Err(None)` means the request is silently ignored (one already in flight).
fn validate_for_submit(model: &AppModel) -> Result<NewPost, Option<String>> {
    if model.submit.is_submitting() {
        return Err(None);
    }

    let validation = model.attachments.validation();
    if !validation.is_ok() {
        return Err(Some(validation.messages().collect::<Vec<_>>().join("; ")));
    }

    if model.text.trim().is_empty() {
        return Err(Some("Please enter post text.".into()));
    }

    let input = model.attachments.input();
    debug_assert_eq!(input.files().len(), model.attachments.store().len());
    Ok(NewPost {
        text: model.text.clone(),
        poster: model.poster.trim().to_string(),
        board: model.board.clone(),
        thread_id: model.thread_id,
        file_field: input.name().to_string(),
        files: input.files().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::logic::store::tests::snapshot;
    use crate::config::ServerConfig;
    use crate::models::validation::SIZE_ERROR;

    const MIB: u64 = 1024 * 1024;

    fn app() -> AppModel {
        let post = PostConfig {
            board: "b".into(),
            thread_id: Some(42),
            poster: Some("anon".into()),
        };
        AppModel::new(egui::Context::default(), &post)
    }

    fn jpeg(name: &str, size: u64) -> CandidateFile {
        CandidateFile::new(name.into(), name.into(), "image/jpeg".into(), size)
    }

    fn add(model: &mut AppModel, files: Vec<CandidateFile>) {
        let mut cmds = Vec::new();
        update(
            model,
            Msg::Attachments(AttachmentsMsg::FilesInspected {
                files,
                failures: Vec::new(),
            }),
            &mut cmds,
        );
    }

    fn submit(model: &mut AppModel) -> Vec<Command> {
        let mut cmds = Vec::new();
        update(model, Msg::SubmitRequested, &mut cmds);
        cmds
    }

    fn complete(model: &mut AppModel, result: Result<PostCreated, Vec<String>>) {
        let msg = Msg::SubmitCompleted {
            text: model.text.clone(),
            files: model.attachments.store().len(),
            result,
        };
        let mut cmds = Vec::new();
        update(model, msg, &mut cmds);
        assert!(cmds.is_empty());
    }

    #[test]
    fn new_model_takes_hidden_fields_from_config() {
        let model = app();
        assert_eq!(model.board, "b");
        assert_eq!(model.thread_id, Some(42));
        assert_eq!(model.poster, "anon");
        assert_eq!(model.submit, SubmitState::Idle);
        assert!(model.can_submit());
    }

    // 2 MB + 2 MB is fine, a third 2 MB file disables submit, removing it re-enables.
    #[test]
    fn size_scenario_gates_submit() {
        let mut model = app();
        add(&mut model, vec![jpeg("a.jpg", 2 * MIB), jpeg("b.jpg", 2 * MIB)]);
        assert!(model.can_submit());

        add(&mut model, vec![jpeg("c.jpg", 2 * MIB)]);
        assert!(!model.can_submit());
        assert_eq!(model.attachments.validation().size_error, Some(SIZE_ERROR));

        let mut cmds = Vec::new();
        update(&mut model, Msg::Attachments(AttachmentsMsg::Remove(2)), &mut cmds);
        assert!(model.can_submit());
        assert!(model.attachments.validation().is_ok());
    }

    #[test]
    fn invalid_attachments_block_submission() {
        let mut model = app();
        model.text = "hi".into();
        add(&mut model, vec![CandidateFile::new(
            "a.txt".into(),
            "a.txt".into(),
            "text/plain".into(),
            3,
        )]);

        let cmds = submit(&mut model);

        assert!(cmds.is_empty());
        assert_eq!(model.submit, SubmitState::Idle);
        assert_eq!(model.status.as_deref(), Some("not allowed file type"));
    }

    #[test]
    fn blank_text_stays_idle() {
        let mut model = app();
        model.text = "   ".into();

        assert!(submit(&mut model).is_empty());
        assert_eq!(model.submit, SubmitState::Idle);
        assert_eq!(model.status.as_deref(), Some("Please enter post text."));
    }

    #[test]
    fn text_is_capped_at_limit() {
        let mut model = app();
        let mut cmds = Vec::new();
        update(
            &mut model,
            Msg::TextChanged("y".repeat(MAX_TEXT_CHARS + 5)),
            &mut cmds,
        );
        assert_eq!(model.text.chars().count(), MAX_TEXT_CHARS);
    }

    // The payload is read from the file input, which matches the store after removals.
    #[test]
    fn submit_enters_submitting_and_reads_files_from_input() {
        let mut model = app();
        model.text = "hello".into();
        add(&mut model, vec![jpeg("a.jpg", 1), jpeg("b.jpg", 1), jpeg("c.jpg", 1)]);
        let mut cmds = Vec::new();
        update(&mut model, Msg::Attachments(AttachmentsMsg::Remove(0)), &mut cmds);

        let cmds = submit(&mut model);

        assert!(model.submit.is_submitting());
        assert!(!model.can_submit());
        match cmds.as_slice() {
            [Command::Submit(post)] => {
                let names: Vec<_> = post.files.iter().map(|f| f.name()).collect();
                assert_eq!(names, vec!["b.jpg", "c.jpg"]);
                assert_eq!(post.files, snapshot(model.attachments.store()));
                assert_eq!(post.file_field, "file");
                assert_eq!(post.board, "b");
                assert_eq!(post.thread_id, Some(42));
                assert_eq!(post.poster, "anon");
            }
            _ => panic!("expected a single submit command"),
        }
    }

    #[test]
    fn second_submit_while_in_flight_is_ignored() {
        let mut model = app();
        model.text = "hello".into();
        assert_eq!(submit(&mut model).len(), 1);
        assert!(submit(&mut model).is_empty());
        assert!(model.submit.is_submitting());
    }

    // Server rejection keeps text and attachments and shows the messages.
    #[test]
    fn failure_preserves_composition() {
        let mut model = app();
        model.text = "keep me".into();
        add(&mut model, vec![jpeg("a.jpg", 1)]);
        submit(&mut model);

        complete(&mut model, Err(vec!["post rejected".into()]));

        assert_eq!(model.submit.server_errors(), ["post rejected".to_string()]);
        assert_eq!(model.text, "keep me");
        assert_eq!(model.attachments.store().len(), 1);
        assert_eq!(model.attachments.input().files().len(), 1);
        assert!(model.can_submit());
    }

    #[test]
    fn success_clears_composition_and_records_post() {
        let mut model = app();
        model.text = "first post".into();
        add(&mut model, vec![jpeg("a.jpg", 1)]);
        submit(&mut model);

        complete(&mut model, Ok(PostCreated { id: Some(9) }));

        assert_eq!(model.submit, SubmitState::Succeeded);
        assert!(model.text.is_empty());
        assert!(model.attachments.store().is_empty());
        assert!(model.attachments.input().files().is_empty());
        assert_eq!(model.poster, "anon");
        assert_eq!(model.posts, vec![PostSummary::new(9, "first post", 1)]);
    }

    #[test]
    fn menu_toggle_and_delete_flow() {
        let mut model = app();
        model.posts.push(PostSummary::new(1, "a", 0));
        model.posts.push(PostSummary::new(2, "b", 0));
        let mut cmds = Vec::new();

        update(&mut model, Msg::PostMenu(PostMenuMsg::Toggle(1)), &mut cmds);
        update(&mut model, Msg::PostMenu(PostMenuMsg::Toggle(2)), &mut cmds);
        assert_eq!(model.open_menu, Some(2));

        update(&mut model, Msg::PostMenu(PostMenuMsg::Delete(2)), &mut cmds);
        assert!(matches!(cmds.as_slice(), [Command::DeletePost(2)]));
        assert_eq!(model.open_menu, None);

        // A second click while the delete is in flight does nothing.
        update(&mut model, Msg::PostMenu(PostMenuMsg::Delete(2)), &mut cmds);
        assert_eq!(cmds.len(), 1);

        update(
            &mut model,
            Msg::DeleteCompleted {
                id: 2,
                result: Ok(()),
            },
            &mut cmds,
        );
        assert_eq!(model.posts.len(), 1);
        assert_eq!(model.posts[0].id, 1);
    }

    #[test]
    fn failed_delete_keeps_post_and_reports() {
        let mut model = app();
        model.posts.push(PostSummary::new(5, "a", 0));
        let mut cmds = Vec::new();
        update(&mut model, Msg::PostMenu(PostMenuMsg::Delete(5)), &mut cmds);

        update(
            &mut model,
            Msg::DeleteCompleted {
                id: 5,
                result: Err("forbidden".into()),
            },
            &mut cmds,
        );

        assert_eq!(model.posts.len(), 1);
        assert!(!model.posts[0].deleting);
        assert!(model.error.as_deref().is_some_and(|e| e.contains("forbidden")));
    }

    #[test]
    fn inspect_command_reports_unreadable_paths() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("ok.png");
        fs::write(&good, b"x").unwrap();
        let client = PostingClient::new(&ServerConfig::default()).unwrap();

        let msg = run_command(
            Command::InspectFiles {
                paths: vec![good, tmp.path().join("missing.png")],
            },
            &client,
        );

        match msg {
            Msg::Attachments(AttachmentsMsg::FilesInspected { files, failures }) => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].name(), "ok.png");
                assert_eq!(failures.len(), 1);
            }
            _ => panic!("unexpected message"),
        }
    }

    #[test]
    fn decode_command_reports_failure_for_non_images() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        fs::write(&path, b"plain text").unwrap();
        let client = PostingClient::new(&ServerConfig::default()).unwrap();
        let file = CandidateFile::from_path(&path).unwrap();

        let msg = run_command(
            Command::DecodePreview {
                id: file.id(),
                path,
            },
            &client,
        );

        assert!(matches!(
            msg,
            Msg::Attachments(AttachmentsMsg::PreviewFailed { id }) if id == file.id()
        ));
    }
}
