// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Action button with a disabled state and an in-progress label.

use eframe::egui;

/// Label shown while a request is in flight.
pub const IN_PROGRESS_LABEL: &str = "Saving...";

/// Text for the button given its state.
pub fn button_label(submitting: bool, label: &str) -> &str {
    if submitting { IN_PROGRESS_LABEL } else { label }
}

/// Whether the button accepts clicks.
pub fn is_enabled(submitting: bool, disabled: bool) -> bool {
    !(submitting || disabled)
}

/// Draw the button. Disabled while `submitting` or `disabled`; relabeled while submitting.
pub fn submit_button(
    ui: &mut egui::Ui,
    submitting: bool,
    disabled: bool,
    label: &str,
) -> egui::Response {
    let text = button_label(submitting, label);
    let button = if submitting {
        egui::Button::new(format!("{} {text}", egui_phosphor::regular::CLOCK))
    } else {
        egui::Button::new(text)
    };
    ui.add_enabled(is_enabled(submitting, disabled), button)
}
