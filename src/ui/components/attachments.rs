// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Attachment picker and preview strip, structured for MVU-style updates.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use eframe::egui;
use tracing::debug;

use crate::logic::file_input::{FileInput, synchronize};
use crate::logic::store::{AttachmentStore, PreviewSource};
use crate::models::candidate::{CandidateFile, FileId};
use crate::models::validation::{self, MAX_TOTAL_BYTES, ValidationResult};

/// Edge length of a preview tile in points.
const TILE: f32 = 100.0;
/// Longest edge of decoded thumbnails in pixels.
const THUMBNAIL_MAX: u32 = 256;

/// Preview source backed by egui textures.
///
/// Decoding happens off the UI thread: an unknown file is queued for decoding and
/// yields no handle until its pixels arrive through [`TexturePreviews::accept_decoded`].
pub struct TexturePreviews {
    ctx: egui::Context,
    decoded: HashMap<FileId, egui::ColorImage>,
    requested: HashSet<FileId>,
    failed: HashSet<FileId>,
    queue: Vec<(FileId, PathBuf)>,
}

impl TexturePreviews {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            decoded: HashMap::new(),
            requested: HashSet::new(),
            failed: HashSet::new(),
            queue: Vec::new(),
        }
    }

    /// Stash decoded pixels; the texture is created on the next render of the entry.
    pub fn accept_decoded(&mut self, id: FileId, image: egui::ColorImage) {
        self.decoded.insert(id, image);
    }

    pub fn mark_failed(&mut self, id: FileId) {
        self.failed.insert(id);
    }

    pub fn is_failed(&self, id: FileId) -> bool {
        self.failed.contains(&id)
    }

    /// Drain decode requests queued during rendering.
    pub fn take_requests(&mut self) -> Vec<(FileId, PathBuf)> {
        std::mem::take(&mut self.queue)
    }

    /// Drop all decode bookkeeping for a file that left the list.
    pub fn forget(&mut self, id: FileId) {
        self.decoded.remove(&id);
        self.requested.remove(&id);
        self.failed.remove(&id);
        self.queue.retain(|(queued, _)| *queued != id);
    }
}

impl PreviewSource for TexturePreviews {
    type Handle = egui::TextureHandle;

    fn create(&mut self, file: &CandidateFile) -> Option<egui::TextureHandle> {
        let id = file.id();
        if let Some(image) = self.decoded.remove(&id) {
            return Some(self.ctx.load_texture(
                format!("preview-{id}"),
                image,
                egui::TextureOptions::default(),
            ));
        }
        if !self.failed.contains(&id) && self.requested.insert(id) {
            self.queue.push((id, file.path().to_path_buf()));
        }
        None
    }

    fn release(&mut self, file: &CandidateFile, handle: egui::TextureHandle) {
        // Dropping the last handle frees the texture.
        drop(handle);
        self.forget(file.id());
    }
}

/// MVU state: the attachment store plus the file-input field submission reads from.
pub struct AttachmentsModel {
    store: AttachmentStore<TexturePreviews>,
    input: FileInput,
}

/// Messages emitted by the attachments view or produced by finished commands.
// Debug omitted because ColorImage payloads are large.
pub enum AttachmentsMsg {
    RequestPickFiles,
    FilesPicked(Vec<PathBuf>),
    FilesInspected {
        files: Vec<CandidateFile>,
        failures: Vec<String>,
    },
    LoadPreview {
        id: FileId,
        path: PathBuf,
    },
    PreviewDecoded {
        id: FileId,
        image: egui::ColorImage,
    },
    PreviewFailed {
        id: FileId,
    },
    Remove(usize),
}

/// Side-effectful commands that run off the UI thread.
#[derive(Debug, PartialEq, Eq)]
pub enum AttachmentsCommand {
    PickFiles { multiple: bool },
    InspectFiles { paths: Vec<PathBuf> },
    DecodePreview { id: FileId, path: PathBuf },
}

/// User-facing events for status/error surfaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentsEvent {
    /// Message text to display.
    pub message: String,
    /// Whether the message represents an error.
    pub is_error: bool,
}

impl AttachmentsModel {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            store: AttachmentStore::new(TexturePreviews::new(ctx)),
            input: FileInput::default(),
        }
    }

    pub fn store(&self) -> &AttachmentStore<TexturePreviews> {
        &self.store
    }

    /// The field a submission reads its files from.
    pub fn input(&self) -> &FileInput {
        &self.input
    }

    /// Validation of the current list, recomputed on every call.
    ///
    /// Reads the input value, which [`synchronize`] keeps equal to the store.
    pub fn validation(&self) -> ValidationResult {
        validation::validate(self.input.files())
    }

    /// Append a picker batch and rebuild the input value.
    pub fn add_batch(&mut self, files: Vec<CandidateFile>) {
        if files.is_empty() {
            return;
        }
        self.input.select(files.iter().cloned());
        self.store.add_batch(files);
        synchronize(&self.store, &mut self.input);
    }

    /// Remove one entry, release its preview, and rebuild the input value.
    pub fn remove(&mut self, index: usize) -> Option<CandidateFile> {
        let removed = self.store.remove_at(index)?;
        self.store.source_mut().forget(removed.id());
        synchronize(&self.store, &mut self.input);
        debug!(
            outstanding = self.store.ledger().outstanding(),
            "previews after removal"
        );
        Some(removed)
    }

    /// Release every preview and empty both the store and the input.
    pub fn clear(&mut self) {
        let ids: Vec<FileId> = self.store.files().map(CandidateFile::id).collect();
        self.store.clear();
        for id in ids {
            self.store.source_mut().forget(id);
        }
        synchronize(&self.store, &mut self.input);
    }
}

/// Apply a message to the attachments model. Returns a user-facing event when relevant.
pub fn update(
    model: &mut AttachmentsModel,
    msg: AttachmentsMsg,
    cmds: &mut Vec<AttachmentsCommand>,
) -> Option<AttachmentsEvent> {
    match msg {
        AttachmentsMsg::RequestPickFiles => {
            cmds.push(AttachmentsCommand::PickFiles {
                multiple: model.input.multiple(),
            });
            None
        }
        AttachmentsMsg::FilesPicked(paths) => {
            if paths.is_empty() {
                return None;
            }
            cmds.push(AttachmentsCommand::InspectFiles { paths });
            Some(AttachmentsEvent {
                message: "Processing attachments...".into(),
                is_error: false,
            })
        }
        AttachmentsMsg::FilesInspected { files, failures } => {
            let added = files.len();
            model.add_batch(files);
            if failures.is_empty() {
                Some(AttachmentsEvent {
                    message: format!("{added} attachment(s) added"),
                    is_error: false,
                })
            } else {
                Some(AttachmentsEvent {
                    message: format!("Skipped unreadable file(s):\n{}", failures.join("\n")),
                    is_error: true,
                })
            }
        }
        AttachmentsMsg::LoadPreview { id, path } => {
            cmds.push(AttachmentsCommand::DecodePreview { id, path });
            None
        }
        AttachmentsMsg::PreviewDecoded { id, image } => {
            // Late results for removed files are dropped.
            if model.store.contains(id) {
                model.store.source_mut().accept_decoded(id, image);
            }
            None
        }
        AttachmentsMsg::PreviewFailed { id } => {
            if model.store.contains(id) {
                model.store.source_mut().mark_failed(id);
            }
            None
        }
        AttachmentsMsg::Remove(index) => model.remove(index).map(|_| AttachmentsEvent {
            message: "Attachment removed".to_string(),
            is_error: false,
        }),
    }
}

/// Render the picker button and preview strip; returns messages triggered by user interaction.
///
/// Takes the model mutably because preview handles are created lazily while rendering.
pub fn view(ui: &mut egui::Ui, model: &mut AttachmentsModel) -> Vec<AttachmentsMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        let pick = ui
            .add(egui::Button::new(format!(
                "{} Select files",
                egui_phosphor::regular::IMAGE_SQUARE
            )))
            .on_hover_text(format!("Accepts {}", model.input.accept()));
        if pick.clicked() {
            msgs.push(AttachmentsMsg::RequestPickFiles);
        }

        if !model.store.is_empty() {
            let total = validation::total_size(model.input.files());
            ui.label(
                egui::RichText::new(format!(
                    "{} file(s), {} of {}",
                    model.store.len(),
                    format_bytes(total),
                    format_bytes(MAX_TOTAL_BYTES)
                ))
                .small()
                .color(egui::Color32::from_gray(110)),
            );
        }
    });

    ui.add_space(6.0);

    if !model.store.is_empty() {
        egui::ScrollArea::horizontal()
            .id_salt("attachment_strip")
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    for index in 0..model.store.len() {
                        if render_tile(ui, model, index) {
                            msgs.push(AttachmentsMsg::Remove(index));
                        }
                    }
                });
            });
    }

    msgs.extend(
        model
            .store
            .source_mut()
            .take_requests()
            .into_iter()
            .map(|(id, path)| AttachmentsMsg::LoadPreview { id, path }),
    );

    msgs
}

/// Draw one preview tile. Returns true when it was clicked (remove request).
fn render_tile(ui: &mut egui::Ui, model: &mut AttachmentsModel, index: usize) -> bool {
    let texture = model
        .store
        .preview_for(index)
        .map(|t| (t.id(), t.size_vec2()));
    let Some(file) = model.store.get(index) else {
        return false;
    };
    let hover = format!("{}\n{} | {}", file.name(), file.mime(), format_bytes(file.size()));
    let failed = model.store.source().is_failed(file.id());

    let response = match texture {
        Some((id, size)) => {
            let scale = (TILE / size.x).min(TILE / size.y).min(1.0);
            ui.add(egui::Image::new((id, size * scale)).sense(egui::Sense::click()))
        }
        None => {
            let (rect, response) =
                ui.allocate_exact_size(egui::vec2(TILE, TILE), egui::Sense::click());
            let stroke = ui.visuals().widgets.noninteractive.bg_stroke;
            ui.painter()
                .rect_stroke(rect, 2.0, stroke, egui::StrokeKind::Inside);
            let glyph = if failed {
                egui_phosphor::regular::FILE
            } else {
                egui_phosphor::regular::CLOCK
            };
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                glyph,
                egui::FontId::proportional(28.0),
                egui::Color32::from_gray(120),
            );
            response
        }
    };

    ui.painter().text(
        response.rect.right_top() + egui::vec2(-8.0, 8.0),
        egui::Align2::CENTER_CENTER,
        egui_phosphor::regular::X,
        egui::FontId::proportional(14.0),
        egui::Color32::from_rgb(248, 113, 113),
    );

    response
        .on_hover_cursor(egui::CursorIcon::PointingHand)
        .on_hover_text(hover)
        .clicked()
}

/// Human-readable formatting for byte sizes with binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Decode and shrink an image into a thumbnail-friendly `ColorImage`.
pub(crate) fn load_image_thumbnail(path: &Path) -> Result<egui::ColorImage, String> {
    let dyn_img = image::open(path).map_err(|e| e.to_string())?;
    let resized = dyn_img.thumbnail(THUMBNAIL_MAX, THUMBNAIL_MAX).to_rgba8();
    let size = [resized.width() as usize, resized.height() as usize];
    let pixels = resized.into_raw();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, &pixels))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use eframe::egui;
    use image::{ImageBuffer, Rgba};
    use tempfile::TempDir;

    use super::*;
    use crate::logic::store::tests::snapshot;
    use crate::models::validation::{SIZE_ERROR, TYPE_ERROR};

    const MIB: u64 = 1024 * 1024;

    fn model() -> AttachmentsModel {
        AttachmentsModel::new(egui::Context::default())
    }

    fn jpeg(name: &str, size: u64) -> CandidateFile {
        CandidateFile::new(name.into(), name.into(), "image/jpeg".into(), size)
    }

    fn pixel() -> egui::ColorImage {
        egui::ColorImage::from_rgba_unmultiplied([1, 1], &[0, 0, 0, 255])
    }

    fn inspected(model: &mut AttachmentsModel, files: Vec<CandidateFile>) {
        let mut cmds = Vec::new();
        update(
            model,
            AttachmentsMsg::FilesInspected {
                files,
                failures: Vec::new(),
            },
            &mut cmds,
        );
        assert!(cmds.is_empty());
    }

    // Raster thumbnails should retain aspect ratio and respect max bounds.
    #[test]
    fn load_image_thumbnail_handles_raster_image() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("thumb.png");
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(600, 300, Rgba([0, 255, 0, 255]));
        img.save(&path).expect("png saved");

        let thumb = load_image_thumbnail(&path).expect("thumbnail created");

        assert!(thumb.size[0] <= 256 && thumb.size[1] <= 256);
        let aspect = thumb.size[0] as f32 / thumb.size[1] as f32;
        assert!((aspect - 2.0).abs() < 0.05);
    }

    // Invalid image data should yield an error instead of panicking.
    #[test]
    fn load_image_thumbnail_errors_on_invalid_image() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("invalid.png");
        fs::write(&path, b"not an image").expect("file written");

        assert!(load_image_thumbnail(&path).is_err());
    }

    #[test]
    fn format_bytes_uses_binary_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(5 * MIB), "5.0 MB");
        assert_eq!(format_bytes(1536), "1.5 KB");
    }

    #[test]
    fn pick_request_respects_input_multiplicity() {
        let mut model = model();
        let mut cmds = Vec::new();
        update(&mut model, AttachmentsMsg::RequestPickFiles, &mut cmds);
        assert_eq!(cmds, vec![AttachmentsCommand::PickFiles { multiple: true }]);
    }

    // A cancelled dialog yields no paths and nothing to do.
    #[test]
    fn empty_pick_is_ignored() {
        let mut model = model();
        let mut cmds = Vec::new();
        assert!(update(&mut model, AttachmentsMsg::FilesPicked(Vec::new()), &mut cmds).is_none());
        assert!(cmds.is_empty());
    }

    #[test]
    fn picked_paths_are_inspected_off_thread() {
        let mut model = model();
        let mut cmds = Vec::new();
        let paths = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];

        let event = update(&mut model, AttachmentsMsg::FilesPicked(paths.clone()), &mut cmds);

        assert!(event.is_some_and(|e| !e.is_error));
        assert_eq!(cmds, vec![AttachmentsCommand::InspectFiles { paths }]);
    }

    // Batches accumulate and the input always mirrors the full list.
    #[test]
    fn inspected_batches_accumulate_and_sync_input() {
        let mut model = model();
        inspected(&mut model, vec![jpeg("a", 1), jpeg("b", 1)]);
        inspected(&mut model, vec![jpeg("c", 1)]);

        assert_eq!(model.store().len(), 3);
        assert_eq!(model.input().files(), snapshot(model.store()).as_slice());
    }

    #[test]
    fn inspection_failures_surface_as_error_but_keep_good_files() {
        let mut model = model();
        let mut cmds = Vec::new();
        let event = update(
            &mut model,
            AttachmentsMsg::FilesInspected {
                files: vec![jpeg("ok", 1)],
                failures: vec!["missing.png: not found".into()],
            },
            &mut cmds,
        )
        .expect("event");

        assert!(event.is_error);
        assert!(event.message.contains("missing.png"));
        assert_eq!(model.store().len(), 1);
    }

    // Two 2 MB JPEGs pass, a third trips the size limit, removing it clears the error.
    #[test]
    fn size_scenario_add_then_remove() {
        let mut model = model();
        inspected(&mut model, vec![jpeg("one", 2 * MIB), jpeg("two", 2 * MIB)]);
        assert!(model.validation().is_ok());

        inspected(&mut model, vec![jpeg("three", 2 * MIB)]);
        assert_eq!(model.validation().size_error, Some(SIZE_ERROR));

        let mut cmds = Vec::new();
        let event = update(&mut model, AttachmentsMsg::Remove(2), &mut cmds);

        assert!(event.is_some());
        assert!(model.validation().is_ok());
        assert_eq!(model.input().files().len(), 2);
    }

    // Validation over the input matches validation over the store after every change.
    #[test]
    fn validation_follows_store_through_changes() {
        let mut model = model();
        let mut cmds = Vec::new();
        inspected(&mut model, vec![jpeg("a", 3 * MIB), jpeg("b", 3 * MIB)]);
        assert_eq!(model.validation(), validation::validate(&snapshot(model.store())));
        assert_eq!(model.validation().size_error, Some(SIZE_ERROR));

        update(&mut model, AttachmentsMsg::Remove(0), &mut cmds);
        assert_eq!(model.validation(), validation::validate(&snapshot(model.store())));
        assert!(model.validation().is_ok());

        model.clear();
        assert!(model.validation().is_ok());
        assert_eq!(validation::total_size(model.input().files()), 0);
    }

    #[test]
    fn text_file_trips_type_check() {
        let mut model = model();
        inspected(
            &mut model,
            vec![CandidateFile::new(
                "notes.txt".into(),
                "notes.txt".into(),
                "text/plain".into(),
                20,
            )],
        );
        let result = model.validation();
        assert_eq!(result.type_error, Some(TYPE_ERROR));
        assert_eq!(result.size_error, None);
    }

    #[test]
    fn out_of_range_remove_is_silent() {
        let mut model = model();
        inspected(&mut model, vec![jpeg("a", 1)]);
        let mut cmds = Vec::new();

        assert!(update(&mut model, AttachmentsMsg::Remove(4), &mut cmds).is_none());
        assert_eq!(model.store().len(), 1);
        assert_eq!(model.input().files().len(), 1);
    }

    // Rendering queues a decode; decoded pixels become a texture that removal releases.
    #[test]
    fn preview_lifecycle_creates_and_releases_texture() {
        let mut model = model();
        let file = jpeg("a", 1);
        let id = file.id();
        inspected(&mut model, vec![file]);

        assert!(model.store.preview_for(0).is_none());
        let requests = model.store.source_mut().take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, id);

        // Asking again does not queue a duplicate decode.
        assert!(model.store.preview_for(0).is_none());
        assert!(model.store.source_mut().take_requests().is_empty());

        let mut cmds = Vec::new();
        update(
            &mut model,
            AttachmentsMsg::PreviewDecoded { id, image: pixel() },
            &mut cmds,
        );
        assert!(model.store.preview_for(0).is_some());
        assert_eq!(model.store().ledger().outstanding(), 1);

        update(&mut model, AttachmentsMsg::Remove(0), &mut cmds);
        assert_eq!(model.store().ledger().created, 1);
        assert_eq!(model.store().ledger().released, 1);
    }

    #[test]
    fn late_decode_for_removed_file_is_discarded() {
        let mut model = model();
        let file = jpeg("a", 1);
        let id = file.id();
        inspected(&mut model, vec![file]);
        model.store.preview_for(0);

        let mut cmds = Vec::new();
        update(&mut model, AttachmentsMsg::Remove(0), &mut cmds);
        update(
            &mut model,
            AttachmentsMsg::PreviewDecoded { id, image: pixel() },
            &mut cmds,
        );

        assert!(model.store.source().decoded.is_empty());
        assert!(model.store.source().requested.is_empty());
    }

    #[test]
    fn failed_preview_is_not_retried() {
        let mut model = model();
        let file = jpeg("broken", 1);
        let id = file.id();
        inspected(&mut model, vec![file]);
        model.store.preview_for(0);
        model.store.source_mut().take_requests();

        let mut cmds = Vec::new();
        update(&mut model, AttachmentsMsg::PreviewFailed { id }, &mut cmds);

        assert!(model.store.preview_for(0).is_none());
        assert!(model.store.source_mut().take_requests().is_empty());
        assert!(model.store().source().is_failed(id));
    }

    #[test]
    fn clear_releases_everything_and_empties_input() {
        let mut model = model();
        let files = vec![jpeg("a", 1), jpeg("b", 1)];
        let ids: Vec<_> = files.iter().map(|f| f.id()).collect();
        inspected(&mut model, files);
        let mut cmds = Vec::new();
        for id in ids {
            update(
                &mut model,
                AttachmentsMsg::PreviewDecoded { id, image: pixel() },
                &mut cmds,
            );
        }
        model.store.preview_for(0);
        model.store.preview_for(1);

        model.clear();

        assert!(model.store().is_empty());
        assert!(model.input().files().is_empty());
        assert_eq!(model.store().ledger().outstanding(), 0);
    }
}
