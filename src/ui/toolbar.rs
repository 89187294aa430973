// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Transform toolbar.
//!
//! Buttons for the three remote transforms plus a busy indicator with the
//! upload progress of the transform in flight.

use crate::session::SessionState;

/// Transform requested from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    Trim,
    Caption,
    Combined,
}

/// Display the toolbar. Buttons stay clickable while busy; the session
/// turns a click into an "already processing" message.
pub fn show(ui: &mut egui::Ui, state: SessionState, progress: f32) -> ToolbarAction {
    let mut action = ToolbarAction::None;
    let loaded = state != SessionState::Idle;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Transform:");
        ui.separator();

        if ui
            .add_enabled(loaded, egui::Button::new("✂ Trim"))
            .on_hover_text("Keep only the selected range")
            .clicked()
        {
            action = ToolbarAction::Trim;
        }

        if ui
            .add_enabled(loaded, egui::Button::new("💬 Apply Captions"))
            .on_hover_text("Burn the captions into the video")
            .clicked()
        {
            action = ToolbarAction::Caption;
        }

        if ui
            .add_enabled(loaded, egui::Button::new("✂💬 Trim & Caption"))
            .on_hover_text("Trim the original video and burn in the captions in one step")
            .clicked()
        {
            action = ToolbarAction::Combined;
        }

        ui.separator();

        if state.pending_kind().is_some() {
            ui.spinner();
            ui.add(
                egui::ProgressBar::new(progress)
                    .desired_width(160.0)
                    .text(format!("Uploading {:.0}%", progress * 100.0)),
            );
            ui.label(egui::RichText::new(state.to_string()).italics());
        } else if state == SessionState::FetchingInfo {
            ui.spinner();
            ui.label(egui::RichText::new(state.to_string()).italics().weak());
        }
    });

    action
}
